use crate::catalog::Record;
use crate::error::Result;
use clap::ValueEnum;
use colored::*;
use console::measure_text_width;
use serde_json::json;

/// Output format types
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
}

const PERFORMER_HEADING: &str = "Performer";
const TITLE_HEADING: &str = "Title";

/// Renders result sets for the terminal
pub struct OutputFormatter {
    format: OutputFormat,
    include_metadata: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            include_metadata: true,
        }
    }

    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Format search results; `query` is `None` for a plain listing.
    pub fn format_results(&self, records: &[Record], query: Option<&str>) -> Result<String> {
        match self.format {
            OutputFormat::Table => Ok(self.format_table(records, query)),
            OutputFormat::Json => self.format_json(records, query),
            OutputFormat::Markdown => Ok(self.format_markdown(records, query)),
        }
    }

    fn format_json(&self, records: &[Record], query: Option<&str>) -> Result<String> {
        let value = if self.include_metadata {
            json!({
                "query": query,
                "total": records.len(),
                "records": records,
            })
        } else {
            json!(records)
        };
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_table(&self, records: &[Record], query: Option<&str>) -> String {
        let mut output = String::new();

        if records.is_empty() {
            if query.is_some() {
                output.push_str(&format!("{}\n", "No matches found".yellow()));
            } else {
                output.push_str(&format!("{}\n", "Catalog is empty".yellow()));
            }
            return output;
        }

        if self.include_metadata {
            match query {
                Some(q) => output.push_str(&format!(
                    "{} {} {} '{}'\n",
                    "Found".green(),
                    records.len(),
                    "matches for".green(),
                    q
                )),
                None => output.push_str(&format!(
                    "{} {} {}\n",
                    "Showing".green(),
                    records.len(),
                    "records".green()
                )),
            }
        }

        let width = records
            .iter()
            .map(|r| measure_text_width(&r.performer))
            .chain(std::iter::once(PERFORMER_HEADING.len()))
            .max()
            .unwrap_or(0);

        output.push_str(&format!(
            "{}  {}\n",
            pad(PERFORMER_HEADING, width).bold(),
            TITLE_HEADING.bold()
        ));
        output.push_str(&format!("{}\n", "-".repeat(width + 2 + TITLE_HEADING.len()).dimmed()));
        for record in records {
            output.push_str(&format!("{}  {}\n", pad(&record.performer, width), record.title));
        }

        output
    }

    fn format_markdown(&self, records: &[Record], query: Option<&str>) -> String {
        let mut output = String::new();

        if self.include_metadata {
            if let Some(q) = query {
                output.push_str(&format!("**Query:** `{q}`\n"));
            }
            output.push_str(&format!("**Total:** {}\n\n", records.len()));
        }

        output.push_str(&format!("| {PERFORMER_HEADING} | {TITLE_HEADING} |\n"));
        output.push_str("|---|---|\n");
        for record in records {
            output.push_str(&format!(
                "| {} | {} |\n",
                escape_markdown(&record.performer),
                escape_markdown(&record.title)
            ));
        }

        output
    }
}

/// Left-align `s` to `width` terminal columns.
fn pad(s: &str, width: usize) -> String {
    let len = measure_text_width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(len)))
}

fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|")
}
