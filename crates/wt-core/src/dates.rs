//! Locale-aware date parsing for ingested rows.
//!
//! The locale is fixed once per process (it comes from the dataset manifest)
//! and decides whether ambiguous numeric dates like `03/04/2020` are read
//! day-first or month-first. ISO dates are accepted under every locale.
//! A time-of-day component is accepted and truncated to the whole day.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateLocale {
    /// Day-first: `31/01/2020`, `31 January 2020`.
    #[default]
    #[serde(rename = "en-GB")]
    EnGb,
    /// Month-first: `01/31/2020`, `January 31, 2020`.
    #[serde(rename = "en-US")]
    EnUs,
    /// `2020-01-31` only.
    #[serde(rename = "iso")]
    Iso,
}

const ISO_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%d %B %Y", "%d %b %Y",
];

const MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%Y", "%m-%d-%Y", "%B %d, %Y", "%b %d, %Y", "%B %d %Y",
];

const TIME_SUFFIXES: &[&str] = &[" %H:%M:%S", " %H:%M", "T%H:%M:%S"];

impl DateLocale {
    fn formats(self) -> impl Iterator<Item = &'static str> {
        let local: &'static [&'static str] = match self {
            DateLocale::EnGb => DAY_FIRST_FORMATS,
            DateLocale::EnUs => MONTH_FIRST_FORMATS,
            DateLocale::Iso => &[],
        };
        ISO_FORMATS.iter().chain(local.iter()).copied()
    }

    /// Parse a date field. Returns `None` when no format matches.
    pub fn parse(self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        for fmt in self.formats() {
            if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
                return Some(date);
            }
        }

        for fmt in self.formats() {
            for suffix in TIME_SUFFIXES {
                let full = format!("{fmt}{suffix}");
                if let Ok(dt) = NaiveDateTime::parse_from_str(raw, &full) {
                    return Some(dt.date());
                }
            }
        }

        None
    }
}
