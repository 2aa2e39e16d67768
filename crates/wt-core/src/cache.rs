//! Per-category, per-day statistics derived once from the record store.
//!
//! Built after the calendar validates and never mutated again. Lookups for
//! a category that was never ingested, a word the category does not know,
//! or a date outside the calendar are programming errors and panic.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::Calendar;
use crate::category::Category;
use crate::error::Result;
use crate::store::RecordStore;

/// Extremes of one word's series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WordStats {
    pub max_count: u64,
    /// Largest change between consecutive recorded dates.
    pub max_absolute_delta: u64,
}

/// Headline numbers for one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub words: usize,
    pub total_mentions: u64,
    pub max_total_word_count: u64,
    pub max_active_word_count: u32,
}

struct CategoryAggregate {
    /// Indexed by `day - 1`.
    totals: Vec<u64>,
    active: Vec<u32>,
    max_total: u64,
    max_active: u32,
    /// Keyed by lowercased word.
    word_stats: HashMap<String, WordStats>,
}

pub struct AggregationCache {
    store: RecordStore,
    calendar: Calendar,
    categories: BTreeMap<Category, CategoryAggregate>,
}

impl AggregationCache {
    /// Aggregate every ingested category over every day of `calendar`.
    ///
    /// Takes ownership of the store; ingestion is over once this runs.
    /// Recorded dates outside the calendar are ignored.
    pub fn build(store: RecordStore, calendar: Calendar) -> Self {
        let days = calendar.total_days() as usize;
        let mut categories = BTreeMap::new();

        for category in store.categories() {
            let mut totals = vec![0u64; days];
            let mut active = vec![0u32; days];
            let mut word_stats = HashMap::new();

            for series in store.series(category) {
                for (date, count) in series.iter() {
                    let Some(day) = calendar.day_for_date(date) else {
                        continue;
                    };
                    let idx = day as usize - 1;
                    totals[idx] += count;
                    if count > 0 {
                        active[idx] += 1;
                    }
                }

                word_stats.insert(
                    series.word().to_lowercase(),
                    WordStats {
                        max_count: series.max_count(),
                        max_absolute_delta: series.max_absolute_delta(),
                    },
                );
            }

            let max_total = totals.iter().copied().max().unwrap_or(0);
            let max_active = active.iter().copied().max().unwrap_or(0);

            categories.insert(
                category,
                CategoryAggregate {
                    totals,
                    active,
                    max_total,
                    max_active,
                    word_stats,
                },
            );
        }

        tracing::debug!(
            "aggregated {} categories over {} days",
            categories.len(),
            days
        );

        Self {
            store,
            calendar,
            categories,
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Categories that have aggregates.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.keys().copied()
    }

    // --- Per-date lookups ---

    /// Sum of every word's count in `category` on `date`.
    pub fn total_word_count(&self, category: Category, date: NaiveDate) -> u64 {
        let idx = self.index_of(date);
        self.aggregate(category).totals[idx]
    }

    /// Number of words in `category` with a nonzero count on `date`.
    pub fn active_word_count(&self, category: Category, date: NaiveDate) -> u32 {
        let idx = self.index_of(date);
        self.aggregate(category).active[idx]
    }

    pub fn total_word_count_on_day(&self, category: Category, day: u32) -> u64 {
        self.total_word_count(category, self.calendar.date_for_day(day as i64))
    }

    pub fn active_word_count_on_day(&self, category: Category, day: u32) -> u32 {
        self.active_word_count(category, self.calendar.date_for_day(day as i64))
    }

    // --- Maxima ---

    pub fn max_total_word_count(&self, category: Category) -> u64 {
        self.aggregate(category).max_total
    }

    pub fn max_active_word_count(&self, category: Category) -> u32 {
        self.aggregate(category).max_active
    }

    pub fn max_word_count(&self, category: Category, word: &str) -> u64 {
        self.known_word_stats(category, word).max_count
    }

    pub fn max_absolute_delta(&self, category: Category, word: &str) -> u64 {
        self.known_word_stats(category, word).max_absolute_delta
    }

    /// Non-panicking variant for words that come from user input.
    pub fn word_stats(&self, category: Category, word: &str) -> Result<WordStats> {
        self.store.word_series(category, word)?;
        Ok(self.known_word_stats(category, word))
    }

    // --- Word sets ---

    pub fn words_of(&self, category: Category) -> Vec<&str> {
        self.store.words(category)
    }

    pub fn summary(&self, category: Category) -> CategorySummary {
        let agg = self.aggregate(category);
        CategorySummary {
            category,
            words: agg.word_stats.len(),
            total_mentions: agg.totals.iter().sum(),
            max_total_word_count: agg.max_total,
            max_active_word_count: agg.max_active,
        }
    }

    fn aggregate(&self, category: Category) -> &CategoryAggregate {
        match self.categories.get(&category) {
            Some(agg) => agg,
            None => panic!("category {category} was never aggregated"),
        }
    }

    fn index_of(&self, date: NaiveDate) -> usize {
        match self.calendar.day_for_date(date) {
            Some(day) => day as usize - 1,
            None => panic!(
                "date {date} is outside the aggregated span {}..={}",
                self.calendar.start(),
                self.calendar.end()
            ),
        }
    }

    fn known_word_stats(&self, category: Category, word: &str) -> WordStats {
        match self.aggregate(category).word_stats.get(&word.to_lowercase()) {
            Some(stats) => *stats,
            None => panic!("word '{word}' is not part of category {category}"),
        }
    }
}
