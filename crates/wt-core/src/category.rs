use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Topic partition of the word-mention data.
///
/// The engine never assumes how many members exist; everything iterates
/// over [`Category::ALL`] or over the categories that actually received data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Social,
    UsPolitics,
    GlobalPolitics,
    Health,
    Economy,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Social,
        Category::UsPolitics,
        Category::GlobalPolitics,
        Category::Health,
        Category::Economy,
    ];

    /// Human-readable label, e.g. "US Politics".
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Social => "Social",
            Category::UsPolitics => "US Politics",
            Category::GlobalPolitics => "Global Politics",
            Category::Health => "Health",
            Category::Economy => "Economy",
        }
    }

    /// Short code used in story-point files.
    pub fn code(self) -> &'static str {
        match self {
            Category::Social => "social",
            Category::UsPolitics => "us",
            Category::GlobalPolitics => "global",
            Category::Health => "health",
            Category::Economy => "economy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Category {
    type Err = EngineError;

    /// Accepts the short code, the display name, or the snake_case name,
    /// ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| {
                needle == c.code()
                    || needle == c.display_name().to_lowercase()
                    || needle == c.display_name().to_lowercase().replace(' ', "_")
            })
            .ok_or_else(|| EngineError::UnknownCategory(s.trim().to_string()))
    }
}
