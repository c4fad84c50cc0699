//! `tally models`: list the registered contract models

use serde::Serialize;
use tabled::Tabled;
use tally_corpus::Model;

use crate::error::CliResult;
use crate::output::{print_output, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
pub struct ModelRow {
    #[tabled(rename = "Model")]
    pub name: String,
    #[tabled(rename = "Resources")]
    pub resources: String,
    #[tabled(rename = "Description")]
    pub summary: String,
}

impl From<&Model> for ModelRow {
    fn from(model: &Model) -> Self {
        let resources = model
            .resources()
            .iter()
            .map(|r| r.name.clone())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            name: model.name.to_string(),
            resources: if resources.is_empty() {
                "-".to_string()
            } else {
                resources
            },
            summary: model.summary.to_string(),
        }
    }
}

/// Execute `tally models`
pub fn execute(format: OutputFormat) -> CliResult<()> {
    let rows: Vec<ModelRow> = tally_corpus::models().iter().map(ModelRow::from).collect();
    print_output(rows, format)
}
