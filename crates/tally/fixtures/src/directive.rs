//! Tokenizer and parser for `#::` directive comments.
//!
//! ```text
//! #:: ExpectedOutput(invariant.violated:assertion.false, INC)
//! #:: Label(INC) | ExpectedOutput(offer.failed:offer.not.injective)
//! #:: UnexpectedOutput(postcondition.violated:assertion.false, /tally/issue/12/)
//! #:: IgnoreFile(/tally/issue/7/)
//! ```

use serde::{Deserialize, Serialize};
use tally_types::OutputId;

use crate::error::{DirectiveError, Result};

/// Prefix of directive comments.
pub const DIRECTIVE_PREFIX: &str = "#::";

/// One directive of a `#::` comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// The verifier must report `id`, at `label` if one is given.
    Expected { id: OutputId, label: Option<String> },
    /// A known false positive, tracked by `issue`.
    Unexpected { id: OutputId, issue: String },
    /// A known missed failure, tracked by `issue`.
    Missing { id: OutputId, issue: String },
    Label { name: String },
    /// Skip the whole fixture.
    IgnoreFile { issue: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Symbol(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{}'", w),
            Token::Symbol(c) => write!(f, "'{}'", c),
        }
    }
}

/// Parse the text of a directive comment, with or without the `#::`
/// prefix. `line` is used for error reporting.
pub fn parse_directives(text: &str, line: usize) -> Result<Vec<Directive>> {
    let body = text.trim();
    let body = body.strip_prefix(DIRECTIVE_PREFIX).unwrap_or(body);
    let tokens = tokenize(body, line)?;
    let mut parser = Parser::new(tokens, line);
    parser.parse_all()
}

fn tokenize(input: &str, line: usize) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.peek().copied() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if matches!(ch, '(' | ')' | ',' | ':' | '|') {
            tokens.push(Token::Symbol(ch));
            chars.next();
            continue;
        }

        if is_word_char(ch) {
            let mut value = String::new();
            while let Some(c) = chars.peek().copied() {
                if is_word_char(c) {
                    value.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Word(value));
            continue;
        }

        return Err(DirectiveError::malformed(
            line,
            format!("unexpected character '{}'", ch),
        ));
    }

    Ok(tokens)
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '/' | '-')
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    line: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>, line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    fn parse_all(&mut self) -> Result<Vec<Directive>> {
        let mut directives = Vec::new();
        if self.eof() {
            return Err(DirectiveError::malformed(self.line, "empty directive"));
        }
        loop {
            directives.push(self.parse_directive()?);
            match self.next() {
                None => break,
                Some(Token::Symbol('|')) => continue,
                Some(other) => {
                    return Err(DirectiveError::malformed(
                        self.line,
                        format!("expected '|' between directives, found {}", other),
                    ))
                }
            }
        }
        Ok(directives)
    }

    fn parse_directive(&mut self) -> Result<Directive> {
        let name = self.consume_word()?;
        self.consume_symbol('(')?;
        let directive = match name.as_str() {
            "ExpectedOutput" => {
                let id = self.parse_output_id()?;
                let label = if self.peek_is_symbol(',') {
                    self.pos += 1;
                    Some(self.consume_word()?)
                } else {
                    None
                };
                Directive::Expected { id, label }
            }
            "UnexpectedOutput" => {
                let id = self.parse_output_id()?;
                self.consume_symbol(',')?;
                let issue = self.consume_word()?;
                Directive::Unexpected { id, issue }
            }
            "MissingOutput" => {
                let id = self.parse_output_id()?;
                self.consume_symbol(',')?;
                let issue = self.consume_word()?;
                Directive::Missing { id, issue }
            }
            "Label" => Directive::Label {
                name: self.consume_word()?,
            },
            "IgnoreFile" => Directive::IgnoreFile {
                issue: self.consume_word()?,
            },
            other => {
                return Err(DirectiveError::malformed(
                    self.line,
                    format!("unknown directive {}", other),
                ))
            }
        };
        self.consume_symbol(')')?;
        Ok(directive)
    }

    fn parse_output_id(&mut self) -> Result<OutputId> {
        let kind = self.consume_word()?;
        self.consume_symbol(':')?;
        let reason = self.consume_word()?;
        format!("{}:{}", kind, reason)
            .parse::<OutputId>()
            .map_err(|source| DirectiveError::UnknownOutput {
                line: self.line,
                source,
            })
    }

    fn consume_word(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Word(w)) => Ok(w),
            Some(other) => Err(DirectiveError::malformed(
                self.line,
                format!("expected a name, found {}", other),
            )),
            None => Err(DirectiveError::malformed(self.line, "unexpected end of directive")),
        }
    }

    fn consume_symbol(&mut self, symbol: char) -> Result<()> {
        match self.next() {
            Some(Token::Symbol(c)) if c == symbol => Ok(()),
            Some(other) => Err(DirectiveError::malformed(
                self.line,
                format!("expected '{}', found {}", symbol, other),
            )),
            None => Err(DirectiveError::malformed(
                self.line,
                format!("expected '{}' before end of directive", symbol),
            )),
        }
    }

    fn peek_is_symbol(&self, symbol: char) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Symbol(c)) if *c == symbol)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tally_types::{ErrorKind, Reason};

    #[test]
    fn expected_with_label() {
        let parsed = parse_directives(
            "#:: ExpectedOutput(invariant.violated:assertion.false, INC)",
            4,
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![Directive::Expected {
                id: OutputId::new(ErrorKind::InvariantViolated, Reason::AssertionFalse),
                label: Some("INC".into()),
            }]
        );
    }

    #[test]
    fn several_directives_on_one_line() {
        let parsed = parse_directives(
            "Label(FE) | ExpectedOutput(offer.failed:offer.not.injective)",
            1,
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], Directive::Label { name: "FE".into() });
    }

    #[test]
    fn issue_paths() {
        let parsed = parse_directives(
            "UnexpectedOutput(postcondition.violated:assertion.false, /tally/issue/12/)",
            1,
        )
        .unwrap();
        assert!(matches!(
            &parsed[0],
            Directive::Unexpected { issue, .. } if issue == "/tally/issue/12/"
        ));
        let parsed = parse_directives("IgnoreFile(/tally/issue/7/)", 1).unwrap();
        assert_eq!(
            parsed,
            vec![Directive::IgnoreFile {
                issue: "/tally/issue/7/".into()
            }]
        );
    }

    #[test]
    fn unknown_vocabulary_is_reported_with_line() {
        let err = parse_directives("ExpectedOutput(invariant.broken:assertion.false)", 9)
            .unwrap_err();
        assert!(matches!(err, DirectiveError::UnknownOutput { line: 9, .. }));
    }

    #[test]
    fn malformed_directives() {
        for text in [
            "",
            "ExpectedOutput",
            "ExpectedOutput(invariant.violated)",
            "ExpectedOutput(invariant.violated:assertion.false",
            "MissingOutput(invariant.violated:assertion.false)",
            "Label(A) Label(B)",
            "Frobnicate(x)",
            "Label(A) | ",
            "Label(a b)",
            "Label(#)",
        ] {
            let err = parse_directives(text, 3).unwrap_err();
            assert!(
                matches!(err, DirectiveError::Malformed { line: 3, .. }),
                "{:?} gave {:?}",
                text,
                err
            );
        }
    }

    proptest! {
        #[test]
        fn property_parser_never_panics(text in "[ -~]{0,60}") {
            let _ = parse_directives(&text, 1);
        }
    }
}
