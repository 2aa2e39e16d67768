//! Story points: date-bounded annotations keyed to a (category, word).
//!
//! The engine does not compute anything for them; it only decides which
//! points switch on or off when the clock lands on a date.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::category::Category;
use crate::csv::CsvTable;
use crate::dates::DateLocale;

const CLIP_COLUMN: usize = 0;
const CATEGORY_COLUMN: usize = 1;
const WORD_COLUMN: usize = 2;
const START_DATE_COLUMN: usize = 3;
const END_DATE_COLUMN: usize = 4;
const DESCRIPTION_COLUMN: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoryPoint {
    /// Media reference, resolved by the renderer.
    pub clip: String,
    pub category: Category,
    pub word: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub description: String,
}

impl StoryPoint {
    /// Active from its start date up to, not including, its end date.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryRowError {
    #[error("row {row}: expected at least {} columns, found {found}", DESCRIPTION_COLUMN + 1)]
    TooFewColumns { row: usize, found: usize },

    #[error("row {row}: invalid category '{value}'")]
    UnknownCategory { row: usize, value: String },

    #[error("row {row}: cannot parse date '{value}'")]
    BadDate { row: usize, value: String },

    #[error("row {row}: start date {start} is not before end date {end}")]
    EmptyRange {
        row: usize,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// A story point switching state on a date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoryTransition<'a> {
    pub point: &'a StoryPoint,
    /// True when the point becomes active.
    pub activated: bool,
}

#[derive(Clone, Debug, Default)]
pub struct StoryPointIndex {
    points: Vec<StoryPoint>,
    /// category → lowercased word → indices into `points`
    by_word: BTreeMap<Category, HashMap<String, Vec<usize>>>,
}

impl StoryPointIndex {
    pub fn new(points: Vec<StoryPoint>) -> Self {
        let mut by_word: BTreeMap<Category, HashMap<String, Vec<usize>>> = BTreeMap::new();
        for (idx, point) in points.iter().enumerate() {
            by_word
                .entry(point.category)
                .or_default()
                .entry(point.word.to_lowercase())
                .or_default()
                .push(idx);
        }
        Self { points, by_word }
    }

    /// Parse a story-point table. Invalid rows are logged and skipped.
    ///
    /// Columns: clip, category, word, start, end, description. Any fields
    /// past the description are joined back with commas.
    pub fn from_table(table: &CsvTable, locale: DateLocale) -> (Self, Vec<StoryRowError>) {
        let mut points = Vec::new();
        let mut errors = Vec::new();

        for (idx, values) in table.rows.iter().enumerate() {
            let row = idx + 1;
            if values.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            match parse_story_row(row, values, locale) {
                Ok(point) => points.push(point),
                Err(e) => {
                    tracing::warn!("story points: {e}");
                    errors.push(e);
                }
            }
        }

        (Self::new(points), errors)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoryPoint> {
        self.points.iter()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &StoryPoint> {
        self.points.iter().filter(move |p| p.category == category)
    }

    /// Points attached to a word, looked up case-insensitively.
    pub fn for_word(&self, category: Category, word: &str) -> Vec<&StoryPoint> {
        self.by_word
            .get(&category)
            .and_then(|words| words.get(&word.to_lowercase()))
            .map(|ids| ids.iter().map(|&i| &self.points[i]).collect())
            .unwrap_or_default()
    }

    /// Points that switch state when the clock lands on `date`.
    ///
    /// Moving forward, a point activates on its start date and deactivates
    /// on its end date. Moving backward the roles swap.
    pub fn transitions_on(&self, date: NaiveDate, moving_forward: bool) -> Vec<StoryTransition<'_>> {
        self.points
            .iter()
            .filter_map(|point| {
                if point.start == date {
                    Some(StoryTransition {
                        point,
                        activated: moving_forward,
                    })
                } else if point.end == date {
                    Some(StoryTransition {
                        point,
                        activated: !moving_forward,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn active_on(&self, date: NaiveDate) -> impl Iterator<Item = &StoryPoint> {
        self.points.iter().filter(move |p| p.is_active_on(date))
    }
}

fn parse_story_row(
    row: usize,
    values: &[String],
    locale: DateLocale,
) -> Result<StoryPoint, StoryRowError> {
    if values.len() <= DESCRIPTION_COLUMN {
        return Err(StoryRowError::TooFewColumns {
            row,
            found: values.len(),
        });
    }

    let raw_category = values[CATEGORY_COLUMN].trim();
    let category = raw_category
        .parse::<Category>()
        .map_err(|_| StoryRowError::UnknownCategory {
            row,
            value: raw_category.to_string(),
        })?;

    let parse_date = |col: usize| {
        let raw = values[col].trim();
        locale.parse(raw).ok_or_else(|| StoryRowError::BadDate {
            row,
            value: raw.to_string(),
        })
    };
    let start = parse_date(START_DATE_COLUMN)?;
    let end = parse_date(END_DATE_COLUMN)?;

    if start >= end {
        return Err(StoryRowError::EmptyRange { row, start, end });
    }

    Ok(StoryPoint {
        clip: values[CLIP_COLUMN].trim().to_string(),
        category,
        word: values[WORD_COLUMN].trim().to_string(),
        start,
        end,
        description: values[DESCRIPTION_COLUMN..].join(","),
    })
}
