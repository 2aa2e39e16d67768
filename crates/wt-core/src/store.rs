//! Raw (category, word, date) → count facts.
//!
//! The store is the only owner of ingested data. It is mutable while files
//! are being ingested and is then moved into the
//! [`AggregationCache`](crate::cache::AggregationCache), which makes it
//! read-only for the rest of the process.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::category::Category;
use crate::constants::{COUNT_COLUMN, DATE_COLUMN, WORD_COLUMN};
use crate::csv::CsvTable;
use crate::dates::DateLocale;
use crate::error::{EngineError, Result};

/// Sparse date → count mapping for one (category, word).
///
/// Absent dates mean zero and a zero is never stored, so a zero-count row
/// registers the word without adding a recorded date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordSeries {
    word: String,
    counts: BTreeMap<NaiveDate, u64>,
}

impl WordSeries {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            counts: BTreeMap::new(),
        }
    }

    /// The word as first spelled in the data.
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn count_on(&self, date: NaiveDate) -> u64 {
        self.counts.get(&date).copied().unwrap_or(0)
    }

    /// Recorded (date, count) pairs in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.counts.iter().map(|(d, c)| (*d, *c))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Largest single-date count.
    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Largest |count(d_i) - count(d_{i+1})| over consecutive *recorded*
    /// dates. Unrecorded calendar days between them are not treated as zeros.
    pub fn max_absolute_delta(&self) -> u64 {
        self.counts
            .values()
            .zip(self.counts.values().skip(1))
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap_or(0)
    }

    /// Per-row counts fit `u32`; their sums are kept in `u64`.
    fn accumulate(&mut self, date: NaiveDate, count: u32) {
        if count == 0 {
            return;
        }
        *self.counts.entry(date).or_insert(0) += u64::from(count);
    }
}

/// A data row that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("row {row}: expected {expected} columns, found {found}")]
    ColumnMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: cannot parse date '{value}'")]
    BadDate { row: usize, value: String },

    #[error("row {row}: cannot parse word count '{value}'")]
    BadCount { row: usize, value: String },

    #[error("row {row}: empty word")]
    EmptyWord { row: usize },
}

/// Outcome of ingesting one category file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    /// Rows whose first field was empty.
    pub blank: usize,
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<RowError>,
}

fn serialize_errors<S: serde::Serializer>(
    errors: &[RowError],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}

#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    /// Word keys are lowercased; the series keeps the original spelling.
    categories: BTreeMap<Category, HashMap<String, WordSeries>>,
    earliest: Option<NaiveDate>,
    latest: Option<NaiveDate>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one fact. Repeated (category, word, date) triples are summed.
    pub fn add(&mut self, category: Category, word: &str, date: NaiveDate, count: u32) {
        self.categories
            .entry(category)
            .or_default()
            .entry(word.to_lowercase())
            .or_insert_with(|| WordSeries::new(word))
            .accumulate(date, count);

        self.earliest = Some(self.earliest.map_or(date, |d| d.min(date)));
        self.latest = Some(self.latest.map_or(date, |d| d.max(date)));
    }

    /// Ingest a category table. Bad rows are logged and skipped; the rest
    /// of the table is still ingested.
    ///
    /// The category is registered even when no row is accepted.
    pub fn ingest(&mut self, category: Category, table: &CsvTable, locale: DateLocale) -> IngestReport {
        self.categories.entry(category).or_default();

        let mut report = IngestReport::default();
        let expected = table.header.len();

        for (idx, values) in table.rows.iter().enumerate() {
            let row = idx + 1;

            if values.first().is_none_or(|v| v.trim().is_empty()) {
                report.blank += 1;
                continue;
            }

            match parse_row(row, values, expected, locale) {
                Ok((date, word, count)) => {
                    self.add(category, word, date, count);
                    report.accepted += 1;
                }
                Err(e) => {
                    tracing::warn!("{category}: {e}");
                    report.errors.push(e);
                }
            }
        }

        tracing::debug!(
            "{category}: ingested {} rows ({} blank, {} rejected)",
            report.accepted,
            report.blank,
            report.errors.len()
        );
        report
    }

    /// Series for a word, looked up case-insensitively.
    pub fn word_series(&self, category: Category, word: &str) -> Result<&WordSeries> {
        self.categories
            .get(&category)
            .and_then(|words| words.get(&word.to_lowercase()))
            .ok_or_else(|| EngineError::NotFound {
                category,
                word: word.to_string(),
            })
    }

    /// Count of a word on a date; zero when the date was never recorded.
    pub fn word_count(&self, category: Category, word: &str, date: NaiveDate) -> Result<u64> {
        Ok(self.word_series(category, word)?.count_on(date))
    }

    /// Every known word of a category, sorted. Empty for unknown categories.
    pub fn words(&self, category: Category) -> Vec<&str> {
        let mut words: Vec<&str> = self.series(category).map(|s| s.word()).collect();
        words.sort_unstable_by_key(|w| w.to_lowercase());
        words
    }

    /// All series of a category in no particular order.
    pub fn series(&self, category: Category) -> impl Iterator<Item = &WordSeries> {
        self.categories.get(&category).into_iter().flat_map(|m| m.values())
    }

    pub fn total_words(&self, category: Category) -> usize {
        self.categories.get(&category).map_or(0, |m| m.len())
    }

    /// Categories that were ingested, in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.keys().copied()
    }

    /// Every category containing `word`.
    pub fn categories_of_word(&self, word: &str) -> Vec<Category> {
        let key = word.to_lowercase();
        let found: Vec<Category> = self
            .categories
            .iter()
            .filter(|(_, words)| words.contains_key(&key))
            .map(|(c, _)| *c)
            .collect();
        if found.is_empty() {
            tracing::debug!("word '{word}' has no category");
        }
        found
    }

    /// Earliest and latest parsed dates across all categories.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.earliest.zip(self.latest)
    }
}

fn parse_row(
    row: usize,
    values: &[String],
    expected: usize,
    locale: DateLocale,
) -> std::result::Result<(NaiveDate, &str, u32), RowError> {
    if values.len() != expected || values.len() <= COUNT_COLUMN {
        return Err(RowError::ColumnMismatch {
            row,
            expected: expected.max(COUNT_COLUMN + 1),
            found: values.len(),
        });
    }

    let raw_date = values[DATE_COLUMN].trim();
    let date = locale.parse(raw_date).ok_or_else(|| RowError::BadDate {
        row,
        value: raw_date.to_string(),
    })?;

    let raw_count = values[COUNT_COLUMN].trim();
    let count = raw_count.parse::<u32>().map_err(|_| RowError::BadCount {
        row,
        value: raw_count.to_string(),
    })?;

    let word = values[WORD_COLUMN].trim();
    if word.is_empty() {
        return Err(RowError::EmptyWord { row });
    }

    Ok((date, word, count))
}
