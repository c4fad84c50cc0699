//! `tally directives`: show what a fixture expects

use std::path::PathBuf;

use serde::Serialize;
use tabled::Tabled;
use tally_fixtures::{Directive, Fixture};

use crate::error::CliResult;
use crate::output::{print_output, OutputFormat};

/// One parsed directive with its anchor
#[derive(Debug, Serialize, Tabled)]
pub struct DirectiveRow {
    #[tabled(rename = "Line")]
    pub line: usize,
    #[tabled(rename = "Anchor")]
    pub anchor: String,
    #[tabled(rename = "Directive")]
    pub directive: String,
}

/// Render a directive the way it is written in a fixture
pub fn describe(directive: &Directive) -> String {
    match directive {
        Directive::Expected { id, label: Some(label) } => {
            format!("ExpectedOutput({}, {})", id, label)
        }
        Directive::Expected { id, label: None } => format!("ExpectedOutput({})", id),
        Directive::Unexpected { id, issue } => format!("UnexpectedOutput({}, {})", id, issue),
        Directive::Missing { id, issue } => format!("MissingOutput({}, {})", id, issue),
        Directive::Label { name } => format!("Label({})", name),
        Directive::IgnoreFile { issue } => format!("IgnoreFile({})", issue),
    }
}

/// Execute `tally directives <file>`
pub fn execute(file: PathBuf, format: OutputFormat) -> CliResult<()> {
    let fixture = Fixture::load(&file)?;
    let rows: Vec<DirectiveRow> = fixture
        .directives()
        .into_iter()
        .map(|(line, anchor, directive)| DirectiveRow {
            line,
            anchor: anchor.to_string(),
            directive: describe(&directive),
        })
        .collect();
    print_output(rows, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_fixtures::parse_directives;

    #[test]
    fn describe_round_trips_directive_text() {
        for text in [
            "ExpectedOutput(invariant.violated:assertion.false, INC)",
            "ExpectedOutput(offer.failed:offer.not.injective)",
            "UnexpectedOutput(call.failed:insufficient.funds, /tally/issue/4/)",
            "Label(INC)",
            "IgnoreFile(/tally/issue/7/)",
        ] {
            let parsed = parse_directives(text, 1).unwrap();
            assert_eq!(describe(&parsed[0]), text);
        }
    }
}
