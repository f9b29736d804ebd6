//! Turning the raw messages and categories files into the cleaned table.
//!
//! The categories file stores every label of a message in one cell:
//!
//! ```text
//! id,categories
//! 2,related-1;request-0;offer-0;aid_related-0
//! ```
//!
//! Cleaning joins both files on `id`, explodes that cell into one binary
//! column per category (named after the text before the final `-x`) and
//! drops exact duplicate rows.

use std::path::Path;

use ahash::{AHashMap, AHashSet};
use csv::ReaderBuilder;

use crate::corpus::dataset::Dataset;
use crate::corpus::labels::{CategorySet, LabelMatrix};
use crate::corpus::loader::{column_index, parse_id};
use crate::corpus::message::Message;
use crate::error::{Result, TriageError};

/// The two raw input files, joined on `id`.
#[derive(Debug, Clone)]
pub struct RawCorpus {
    rows: Vec<(Message, String)>,
    unmatched: usize,
}

impl RawCorpus {
    /// Number of joined rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Messages that had no categories row.
    pub fn unmatched(&self) -> usize {
        self.unmatched
    }
}

/// Counters describing one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub rows_in: usize,
    pub duplicates_dropped: usize,
    pub coerced_values: usize,
}

/// Read both files and join them on `id`.
///
/// Each message is paired with every categories row carrying its id, in
/// messages order. Messages without categories are dropped.
pub fn load_raw<P: AsRef<Path>, Q: AsRef<Path>>(messages_path: P, categories_path: Q) -> Result<RawCorpus> {
    let messages_path = messages_path.as_ref();
    let categories_path = categories_path.as_ref();
    for path in [messages_path, categories_path] {
        if !path.exists() {
            return Err(TriageError::missing_input(path));
        }
    }

    let messages = read_messages(messages_path)?;
    let categories = read_categories(categories_path)?;

    let mut by_id: AHashMap<i64, Vec<String>> = AHashMap::new();
    for (id, cell) in categories {
        by_id.entry(id).or_default().push(cell);
    }

    let mut rows = Vec::with_capacity(messages.len());
    let mut unmatched = 0;
    for message in messages {
        match by_id.get(&message.id()) {
            Some(cells) => {
                for cell in cells {
                    rows.push((message.clone(), cell.clone()));
                }
            }
            None => unmatched += 1,
        }
    }

    if unmatched > 0 {
        log::warn!("Dropped {unmatched} messages without a categories row");
    }
    log::info!(
        "Joined {} rows from {} and {}",
        rows.len(),
        messages_path.display(),
        categories_path.display()
    );

    Ok(RawCorpus { rows, unmatched })
}

/// Explode the categories cell, binarize and de-duplicate.
pub fn clean(raw: RawCorpus) -> Result<(Dataset, CleanSummary)> {
    let first = raw
        .rows
        .first()
        .ok_or_else(|| TriageError::data("no rows to clean"))?;
    let names: Vec<String> = split_cell(&first.1)
        .map(|entry| parse_entry(entry).map(|(name, _)| name.to_string()))
        .collect::<Result<_>>()?;
    let categories = CategorySet::new(names)?;

    let mut summary = CleanSummary {
        rows_in: raw.rows.len(),
        ..CleanSummary::default()
    };
    let mut seen = AHashSet::with_capacity(raw.rows.len());
    let mut messages = Vec::with_capacity(raw.rows.len());
    let mut label_rows = Vec::with_capacity(raw.rows.len());

    for (row, (message, cell)) in raw.rows.into_iter().enumerate() {
        let mut labels = Vec::with_capacity(categories.len());
        for (col, entry) in split_cell(&cell).enumerate() {
            let (name, value) = parse_entry(entry)?;
            if categories.get(col) != Some(name) {
                return Err(TriageError::data(format!(
                    "row {row}: expected category {:?} at position {col}, found '{name}'",
                    categories.get(col).unwrap_or_default()
                )));
            }
            if value > 1 {
                summary.coerced_values += 1;
            }
            labels.push(u8::from(value != 0));
        }
        if labels.len() != categories.len() {
            return Err(TriageError::data(format!(
                "row {row}: {} categories, expected {}",
                labels.len(),
                categories.len()
            )));
        }

        if !seen.insert((message.clone(), labels.clone())) {
            summary.duplicates_dropped += 1;
            continue;
        }
        messages.push(message);
        label_rows.push(labels);
    }

    if summary.coerced_values > 0 {
        log::warn!(
            "Coerced {} category values above 1 to 1",
            summary.coerced_values
        );
    }
    if summary.duplicates_dropped > 0 {
        log::info!("Dropped {} duplicate rows", summary.duplicates_dropped);
    }

    let labels = LabelMatrix::from_rows(label_rows, categories.len())?;
    Ok((Dataset::new(messages, labels, categories)?, summary))
}

fn read_messages(path: &Path) -> Result<Vec<Message>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let id_col = require_column(&headers, "id", path)?;
    let message_col = require_column(&headers, "message", path)?;
    let original_col = column_index(&headers, "original");
    let genre_col = column_index(&headers, "genre");

    let mut messages = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |col: usize| record.get(col).unwrap_or_default();

        let mut message = Message::new(parse_id(field(id_col), row)?, field(message_col));
        if let Some(col) = original_col {
            message = message.with_original(field(col));
        }
        if let Some(col) = genre_col {
            message = message.with_genre(field(col));
        }
        messages.push(message);
    }

    Ok(messages)
}

fn read_categories(path: &Path) -> Result<Vec<(i64, String)>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let id_col = require_column(&headers, "id", path)?;
    let categories_col = require_column(&headers, "categories", path)?;

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let id = parse_id(record.get(id_col).unwrap_or_default(), row)?;
        let cell = record.get(categories_col).unwrap_or_default().to_string();
        rows.push((id, cell));
    }

    Ok(rows)
}

fn require_column(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    column_index(headers, name).ok_or_else(|| {
        TriageError::data(format!("{} has no '{name}' column", path.display()))
    })
}

fn split_cell(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(';').map(str::trim).filter(|entry| !entry.is_empty())
}

/// Split `name-v` at the final `-` into the name and the digit value.
fn parse_entry(entry: &str) -> Result<(&str, u8)> {
    let invalid = || TriageError::data(format!("invalid category entry '{entry}'"));

    let (name, value) = entry.rsplit_once('-').ok_or_else(invalid)?;
    let mut digits = value.chars();
    let value = match (digits.next(), digits.next()) {
        (Some(c), None) => c.to_digit(10).ok_or_else(invalid)? as u8,
        _ => return Err(invalid()),
    };
    if name.is_empty() {
        return Err(invalid());
    }

    Ok((name, value))
}
