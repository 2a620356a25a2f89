//! CSV rendering of survey responses.

use chrono::{SecondsFormat, Utc};
use csv::{QuoteStyle, WriterBuilder};
use thiserror::Error;

use crate::models::survey_response::Model as ResponseModel;
use crate::scoring::Domain;

/// Column order of the export
pub const EXPORT_COLUMNS: [&str; 12] = [
    "submitted_at",
    "sentiment_3",
    "sentiment_5",
    "clarity_3",
    "clarity_5",
    "workload_3",
    "workload_5",
    "safety_3",
    "safety_5",
    "leadership_3",
    "leadership_5",
    "comment_text",
];

/// Attachment name sent in `Content-Disposition`
pub const EXPORT_FILENAME: &str = "responses.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV record: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Flush(String),
}

fn optional(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render rows as CSV with a header line.
///
/// Fields containing a comma, quote or newline are quoted with inner
/// quotes doubled; nulls become empty fields.
pub fn render_csv(rows: &[ResponseModel]) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_COLUMNS)?;

    // Domain::ALL is sentiment, clarity, workload, safety, leadership
    for row in rows {
        let mut record = Vec::with_capacity(EXPORT_COLUMNS.len());
        record.push(
            row.submitted_at
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        for domain in Domain::ALL {
            record.push(optional(row.three_point(domain)));
            record.push(optional(row.five_point(domain)));
        }
        record.push(row.comment_text.clone().unwrap_or_default());
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.error().to_string()))
}
