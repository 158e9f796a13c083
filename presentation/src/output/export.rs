//! Export of saved results to Markdown or JSON.

use crate::cli::commands::ExportFormat;
use chatlist_domain::ResultRecord;
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flat export row
#[derive(Debug, Serialize)]
struct ExportItem<'a> {
    date: String,
    prompt: &'a str,
    model: &'a str,
    response: &'a str,
    tags: String,
}

impl<'a> From<&'a ResultRecord> for ExportItem<'a> {
    fn from(record: &'a ResultRecord) -> Self {
        Self {
            date: record.result.created_at.format(DATE_FORMAT).to_string(),
            prompt: &record.prompt_text,
            model: &record.model_name,
            response: &record.result.response_text,
            tags: record.tags.to_column().unwrap_or_default(),
        }
    }
}

pub fn render(records: &[ResultRecord], format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Markdown => Ok(render_markdown(records)),
        ExportFormat::Json => render_json(records),
    }
}

pub fn render_markdown(records: &[ResultRecord]) -> String {
    let mut out = String::from("# ChatList export\n\n");
    for item in records.iter().map(ExportItem::from) {
        out.push_str(&format!("## {} - {}\n\n", item.model, item.date));
        out.push_str(&format!("**Prompt:** {}\n\n", item.prompt));
        out.push_str(&format!("**Response:**\n{}\n\n", item.response));
        if !item.tags.is_empty() {
            out.push_str(&format!("**Tags:** {}\n\n", item.tags));
        }
        out.push_str("---\n\n");
    }
    out
}

pub fn render_json(records: &[ResultRecord]) -> Result<String, serde_json::Error> {
    let items: Vec<ExportItem<'_>> = records.iter().map(ExportItem::from).collect();
    serde_json::to_string_pretty(&items)
}
