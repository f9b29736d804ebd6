//! Reading and writing the cleaned message table.
//!
//! The table is a CSV file with a header row:
//!
//! ```csv
//! id,message,original,genre,related,request,offer
//! 2,Weather update - a cold front,Un front froid,direct,1,0,0
//! ```
//!
//! The message body and the first category column are located by index
//! ([`DatasetConfig`]); `id`, `original` and `genre` are located by name
//! when present. Every column from the label offset on is a category, and
//! the header order defines the [`CategorySet`].

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::config::DatasetConfig;
use crate::corpus::dataset::Dataset;
use crate::corpus::labels::{CategorySet, LabelMatrix};
use crate::corpus::message::Message;
use crate::error::{Result, TriageError};

const ID_COLUMN: &str = "id";
const MESSAGE_COLUMN: &str = "message";
const ORIGINAL_COLUMN: &str = "original";
const GENRE_COLUMN: &str = "genre";

/// Load the cleaned table into a [`Dataset`].
pub fn load_dataset<P: AsRef<Path>>(path: P, config: &DatasetConfig) -> Result<Dataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(TriageError::missing_input(path));
    }
    config.validate()?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    if headers.len() <= config.label_offset {
        return Err(TriageError::data(format!(
            "table has {} columns, expected category columns from index {}",
            headers.len(),
            config.label_offset
        )));
    }

    let categories = CategorySet::new(headers.iter().skip(config.label_offset))?;
    let id_col = column_index(&headers, ID_COLUMN);
    let original_col = column_index(&headers, ORIGINAL_COLUMN);
    let genre_col = column_index(&headers, GENRE_COLUMN);

    let mut messages = Vec::new();
    let mut rows = Vec::new();
    let mut coerced = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(TriageError::data(format!(
                "row {row}: expected {} fields, found {}",
                headers.len(),
                record.len()
            )));
        }

        let id = match id_col {
            Some(col) => parse_id(&record[col], row)?,
            None => row as i64,
        };
        let mut message = Message::new(id, &record[config.message_column]);
        if let Some(col) = original_col {
            message = message.with_original(&record[col]);
        }
        if let Some(col) = genre_col {
            message = message.with_genre(&record[col]);
        }

        let mut labels = Vec::with_capacity(categories.len());
        for (offset, value) in record.iter().skip(config.label_offset).enumerate() {
            let (label, was_coerced) = parse_label(value).ok_or_else(|| {
                TriageError::data(format!(
                    "row {row}, category '{}': invalid label {value:?}",
                    headers.get(config.label_offset + offset).unwrap_or_default()
                ))
            })?;
            coerced += usize::from(was_coerced);
            labels.push(label);
        }

        messages.push(message);
        rows.push(labels);
    }

    if messages.is_empty() {
        return Err(TriageError::data(format!("{} has no rows", path.display())));
    }
    if coerced > 0 {
        log::warn!("Coerced {coerced} non-binary label values to 1");
    }

    let labels = LabelMatrix::from_rows(rows, categories.len())?;
    log::info!(
        "Loaded {} messages with {} categories from {}",
        messages.len(),
        categories.len(),
        path.display()
    );

    Dataset::new(messages, labels, categories)
}

/// Write a dataset as a cleaned table.
pub fn save_dataset<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header = vec![ID_COLUMN, MESSAGE_COLUMN, ORIGINAL_COLUMN, GENRE_COLUMN];
    header.extend(dataset.categories().iter());
    writer.write_record(&header)?;

    for (message, labels) in dataset.messages().iter().zip(dataset.labels().rows()) {
        let mut record = vec![
            message.id().to_string(),
            message.text().to_string(),
            message.original().unwrap_or_default().to_string(),
            message.genre().unwrap_or_default().to_string(),
        ];
        record.extend(labels.iter().map(u8::to_string));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    log::info!("Saved {} rows to {}", dataset.len(), path.display());
    Ok(())
}

pub(crate) fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

pub(crate) fn parse_id(value: &str, row: usize) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| TriageError::data(format!("row {row}: invalid id {value:?}")))
}

/// Parse a label cell. Returns the binary value and whether it was coerced
/// from a value other than 0 or 1.
pub(crate) fn parse_label(value: &str) -> Option<(u8, bool)> {
    let value = value.trim();
    let number = match value.parse::<i64>() {
        Ok(n) => n as f64,
        Err(_) => value.parse::<f64>().ok().filter(|f| f.is_finite())?,
    };

    if number == 0.0 {
        Some((0, false))
    } else {
        Some((1, number != 1.0))
    }
}
