//! Fixture files.
//!
//! A fixture is a contract source annotated with `#@` specification
//! comments and `#::` test-oracle directives. Only two things are read
//! from it: the directives (anchored to the code line they precede) and
//! the resource declarations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_types::{OutputId, ResourceDecl};
use tracing::debug;

use crate::directive::{parse_directives, Directive, DIRECTIVE_PREFIX};
use crate::error::{DirectiveError, Result};

/// Prefix of specification comments.
pub const SPEC_PREFIX: &str = "#@";

/// Specification keywords that belong to the function declared below them.
const FUNCTION_SPECS: &[&str] = &["ensures", "requires", "performs", "check", "caller private"];

/// The code line a directive applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// One-based line number.
    pub line: usize,
    /// Function the line belongs to; `None` at module level.
    pub function: Option<String>,
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.function {
            Some(function) => write!(f, "line {} ({})", self.line, function),
            None => write!(f, "line {}", self.line),
        }
    }
}

/// An `ExpectedOutput` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub id: OutputId,
    pub label: Option<String>,
    /// Line of the directive comment.
    pub line: usize,
    pub anchor: Anchor,
}

/// An `UnexpectedOutput` or `MissingOutput` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownIssue {
    pub id: OutputId,
    pub issue: String,
    pub line: usize,
    pub anchor: Anchor,
}

/// A `Label` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDef {
    pub name: String,
    pub line: usize,
    pub anchor: Anchor,
}

/// A parsed fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// File stem, used to find the contract model.
    pub name: String,
    pub path: Option<PathBuf>,
    pub expected: Vec<Expectation>,
    pub unexpected: Vec<KnownIssue>,
    pub missing: Vec<KnownIssue>,
    pub labels: Vec<LabelDef>,
    pub resources: Vec<ResourceDecl>,
    /// Issue given by `IgnoreFile`.
    pub ignored: Option<String>,
}

impl Fixture {
    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| DirectiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut fixture = Self::parse(&name, &source)?;
        fixture.path = Some(path.to_path_buf());
        Ok(fixture)
    }

    pub fn parse(name: &str, source: &str) -> Result<Self> {
        let lines: Vec<&str> = source.lines().collect();
        let mut fixture = Fixture {
            name: name.to_string(),
            ..Fixture::default()
        };
        let mut label_lines: BTreeMap<String, usize> = BTreeMap::new();
        let mut references: Vec<(String, usize)> = Vec::new();

        for (index, raw) in lines.iter().enumerate() {
            let line = index + 1;
            let text = raw.trim();

            if let Some(decl) = parse_resource(text, line)? {
                fixture.resources.push(decl);
                continue;
            }
            if !text.starts_with(DIRECTIVE_PREFIX) {
                continue;
            }

            let anchor = anchor_for(&lines, index);
            for directive in parse_directives(text, line)? {
                match directive {
                    Directive::Expected { id, label } => {
                        if let Some(name) = &label {
                            references.push((name.clone(), line));
                        }
                        fixture.expected.push(Expectation {
                            id,
                            label,
                            line,
                            anchor: anchor.clone(),
                        });
                    }
                    Directive::Unexpected { id, issue } => fixture.unexpected.push(KnownIssue {
                        id,
                        issue,
                        line,
                        anchor: anchor.clone(),
                    }),
                    Directive::Missing { id, issue } => fixture.missing.push(KnownIssue {
                        id,
                        issue,
                        line,
                        anchor: anchor.clone(),
                    }),
                    Directive::Label { name } => {
                        if label_lines.insert(name.clone(), line).is_some() {
                            return Err(DirectiveError::DuplicateLabel { line, label: name });
                        }
                        fixture.labels.push(LabelDef {
                            name,
                            line,
                            anchor: anchor.clone(),
                        });
                    }
                    Directive::IgnoreFile { issue } => fixture.ignored = Some(issue),
                }
            }
        }

        for (label, line) in references {
            if !label_lines.contains_key(&label) {
                return Err(DirectiveError::UndefinedLabel { line, label });
            }
        }

        debug!(
            fixture = %fixture.name,
            expected = fixture.expected.len(),
            labels = fixture.labels.len(),
            resources = fixture.resources.len(),
            "Fixture parsed"
        );
        Ok(fixture)
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored.is_some()
    }

    /// Every directive, in source order, for listing.
    pub fn directives(&self) -> Vec<(usize, Anchor, Directive)> {
        let mut all: Vec<(usize, Anchor, Directive)> = Vec::new();
        all.extend(self.expected.iter().map(|e| {
            (
                e.line,
                e.anchor.clone(),
                Directive::Expected {
                    id: e.id,
                    label: e.label.clone(),
                },
            )
        }));
        all.extend(self.unexpected.iter().map(|u| {
            (
                u.line,
                u.anchor.clone(),
                Directive::Unexpected {
                    id: u.id,
                    issue: u.issue.clone(),
                },
            )
        }));
        all.extend(self.missing.iter().map(|m| {
            (
                m.line,
                m.anchor.clone(),
                Directive::Missing {
                    id: m.id,
                    issue: m.issue.clone(),
                },
            )
        }));
        all.extend(self.labels.iter().map(|l| {
            (
                l.line,
                l.anchor.clone(),
                Directive::Label {
                    name: l.name.clone(),
                },
            )
        }));
        all.sort_by_key(|(line, _, _)| *line);
        all
    }
}

/// `#@ resource: name(params)` or `#@ derived resource: name(params) -> Iface.res`
fn parse_resource(text: &str, line: usize) -> Result<Option<ResourceDecl>> {
    let Some(spec) = text.strip_prefix(SPEC_PREFIX) else {
        return Ok(None);
    };
    let spec = spec.trim();
    let (derived, rest) = if let Some(rest) = spec.strip_prefix("derived resource:") {
        (true, rest)
    } else if let Some(rest) = spec.strip_prefix("resource:") {
        (false, rest)
    } else {
        return Ok(None);
    };

    let (signature, underlying) = match rest.split_once("->") {
        Some((signature, underlying)) => (signature.trim(), Some(underlying.trim())),
        None => (rest.trim(), None),
    };
    let malformed = |message: &str| DirectiveError::MalformedResource {
        line,
        message: message.to_string(),
    };

    let (name, params) = signature
        .strip_suffix(')')
        .and_then(|s| s.split_once('('))
        .ok_or_else(|| malformed("expected name(params)"))?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(malformed("invalid resource name"));
    }

    let mut decl = match (derived, underlying) {
        (true, Some(underlying)) if !underlying.is_empty() => ResourceDecl::derived(name, underlying),
        (true, _) => return Err(malformed("derived resource needs '-> underlying'")),
        (false, None) => ResourceDecl::declared(name),
        (false, Some(_)) => return Err(malformed("only derived resources have an underlying resource")),
    };
    for param in params.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let param_name = param.split(':').next().unwrap_or(param).trim();
        decl = decl.with_param(param_name);
    }
    Ok(Some(decl))
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Non-blank, and not a directive or a plain comment. Specification
/// comments count as code.
fn is_code(line: &str) -> bool {
    let text = line.trim();
    if text.is_empty() || text.starts_with(DIRECTIVE_PREFIX) {
        return false;
    }
    !text.starts_with('#') || text.starts_with(SPEC_PREFIX)
}

fn def_name(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("def ")?;
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

fn is_function_spec(line: &str) -> bool {
    line.trim()
        .strip_prefix(SPEC_PREFIX)
        .map(|spec| FUNCTION_SPECS.iter().any(|kw| spec.trim_start().starts_with(kw)))
        .unwrap_or(false)
}

/// The `def` that follows a run of decorators and function specs.
fn following_def(lines: &[&str], from: usize) -> Option<String> {
    for line in &lines[from..] {
        if let Some(name) = def_name(line) {
            return Some(name);
        }
        let text = line.trim();
        let skippable = !is_code(line) || text.starts_with('@') || is_function_spec(line);
        if !skippable {
            return None;
        }
    }
    None
}

/// The `def` whose body holds `lines[target]`, found by walking outward one
/// block at a time. A module-level line that is not a `def` (a struct or
/// interface header) ends the search.
fn enclosing_def(lines: &[&str], target: usize) -> Option<String> {
    let mut depth = indentation(lines[target]);
    for line in lines[..target].iter().rev() {
        if !is_code(line) || indentation(line) >= depth {
            continue;
        }
        if let Some(name) = def_name(line) {
            return Some(name);
        }
        depth = indentation(line);
        if depth == 0 {
            return None;
        }
    }
    None
}

/// Anchor of the directive on `lines[index]`.
fn anchor_for(lines: &[&str], index: usize) -> Anchor {
    let Some(offset) = lines[index + 1..].iter().position(|l| is_code(l)) else {
        return Anchor {
            line: index + 1,
            function: None,
        };
    };
    let target = index + 1 + offset;
    let code = lines[target];
    let text = code.trim();

    let function = if let Some(name) = def_name(code) {
        Some(name)
    } else if text.starts_with('@') || is_function_spec(code) {
        following_def(lines, target)
    } else if indentation(code) > 0 {
        enclosing_def(lines, target)
    } else {
        None
    };

    Anchor {
        line: target + 1,
        function,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tally_types::{ErrorKind, ResourceKind};

    const HISTORY: &str = r#"
#:: Label(INC)
#@ invariant: old(self.counter) <= self.counter

counter: uint256

@public
def increment():
    self.counter += 1

#:: ExpectedOutput(invariant.violated:assertion.false, INC)
@public
def decrease():
    self.counter -= 1
"#;

    #[test]
    fn history_fixture() {
        let fixture = Fixture::parse("history", HISTORY).unwrap();
        assert_eq!(fixture.labels.len(), 1);
        assert_eq!(fixture.labels[0].anchor.function, None);
        assert_eq!(fixture.labels[0].anchor.line, 3);

        assert_eq!(fixture.expected.len(), 1);
        let expected = &fixture.expected[0];
        assert_eq!(expected.id.kind, ErrorKind::InvariantViolated);
        assert_eq!(expected.label.as_deref(), Some("INC"));
        assert_eq!(expected.anchor.function.as_deref(), Some("decrease"));
        assert_eq!(expected.anchor.line, 12);
    }

    #[test]
    fn anchors_inside_bodies_use_enclosing_def() {
        let source = "\
@public
def foo(x: uint256):
    if x > 0:
        #:: ExpectedOutput(assert.failed:assertion.false)
        assert x > 1

    #:: UnexpectedOutput(call.failed:insufficient.funds, /tally/issue/3/)
    send(msg.sender, x)
";
        let fixture = Fixture::parse("body", source).unwrap();
        assert_eq!(fixture.expected[0].anchor.function.as_deref(), Some("foo"));
        assert_eq!(fixture.expected[0].anchor.line, 5);
        assert_eq!(fixture.unexpected[0].anchor.function.as_deref(), Some("foo"));
    }

    #[test]
    fn struct_bodies_after_a_def_are_module_level() {
        let source = "\
@public
def f():
    pass

struct Pair:
    #:: Label(PAIR)
    a: uint256
    b: uint256

@public
def g():
    for i in range(3):
        if i > 0:
            #:: ExpectedOutput(assert.failed:assertion.false)
            assert i > 1
";
        let fixture = Fixture::parse("pair", source).unwrap();
        assert_eq!(fixture.labels[0].anchor.function, None);
        assert_eq!(fixture.expected[0].anchor.function.as_deref(), Some("g"));
    }

    #[test]
    fn function_specs_anchor_to_the_def_below() {
        let source = "\
#:: ExpectedOutput(postcondition.violated:assertion.false)
#@ ensures: self.total == old(self.total)
@public
def mint(amount: uint256):
    self.total += amount
";
        let fixture = Fixture::parse("post", source).unwrap();
        assert_eq!(fixture.expected[0].anchor.function.as_deref(), Some("mint"));
    }

    #[test]
    fn resources_are_collected() {
        let source = "\
#@ resource: token()
#@ resource: nft(id: uint256)
#@ derived resource: wtoken() -> Token.token
";
        let fixture = Fixture::parse("res", source).unwrap();
        assert_eq!(fixture.resources.len(), 3);
        assert_eq!(fixture.resources[1].params, vec!["id".to_string()]);
        assert_eq!(
            fixture.resources[2].kind,
            ResourceKind::Derived {
                underlying: "Token.token".into()
            }
        );
    }

    #[test]
    fn malformed_resources() {
        assert!(matches!(
            Fixture::parse("r", "#@ resource: token"),
            Err(DirectiveError::MalformedResource { line: 1, .. })
        ));
        assert!(matches!(
            Fixture::parse("r", "\n#@ derived resource: wtoken()"),
            Err(DirectiveError::MalformedResource { line: 2, .. })
        ));
    }

    #[test]
    fn undefined_label_is_an_error() {
        let source = "\
#:: ExpectedOutput(invariant.violated:assertion.false, NOPE)
def f():
    pass
";
        assert!(matches!(
            Fixture::parse("f", source),
            Err(DirectiveError::UndefinedLabel { line: 1, .. })
        ));
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let source = "#:: Label(A)\nx: int128\n#:: Label(A)\ny: int128\n";
        assert!(matches!(
            Fixture::parse("f", source),
            Err(DirectiveError::DuplicateLabel { line: 3, .. })
        ));
    }

    #[test]
    fn ignore_file() {
        let fixture = Fixture::parse("i", "#:: IgnoreFile(/tally/issue/1/)\n").unwrap();
        assert!(fixture.is_ignored());
    }

    #[test]
    fn directives_listed_in_source_order() {
        let fixture = Fixture::parse("history", HISTORY).unwrap();
        let lines: Vec<usize> = fixture.directives().iter().map(|(l, _, _)| *l).collect();
        assert_eq!(lines, vec![2, 11]);
    }

    #[test]
    fn load_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.vy");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(HISTORY.as_bytes()).unwrap();
        let fixture = Fixture::load(&path).unwrap();
        assert_eq!(fixture.name, "history");
        assert_eq!(fixture.path.as_deref(), Some(path.as_path()));

        let missing = Fixture::load(&dir.path().join("nope.vy")).unwrap_err();
        assert!(matches!(missing, DirectiveError::Io { .. }));
        assert_eq!(missing.line(), None);
    }
}
