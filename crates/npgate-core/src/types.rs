use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Article language. Japanese is the primary edition, English the secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Ja,
    En,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[Language::Ja, Language::En]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Ja => "ja",
            Language::En => "en",
        }
    }

    /// Ghost system tag that marks a post as belonging to this edition.
    pub fn tag_slug(self) -> &'static str {
        match self {
            Language::Ja => "lang-ja",
            Language::En => "lang-en",
        }
    }

    /// Unit the length minimum is expressed in.
    pub fn count_unit(self) -> &'static str {
        match self {
            Language::Ja => "characters",
            Language::En => "words",
        }
    }

    /// Length of `text` under this language's counting rule: whitespace
    /// separated words for English, non-whitespace characters for Japanese.
    pub fn measure(self, text: &str) -> u32 {
        let n = match self {
            Language::Ja => text.chars().filter(|c| !c.is_whitespace()).count(),
            Language::En => text.split_whitespace().count(),
        };
        u32::try_from(n).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = crate::error::GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ja" => Ok(Language::Ja),
            "en" => Ok(Language::En),
            _ => Err(crate::error::GateError::InvalidLanguage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Genre,
    Event,
    Dynamics,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Genre, Category::Event, Category::Dynamics]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Genre => "genre",
            Category::Event => "event",
            Category::Dynamics => "dynamics",
        }
    }

    /// Name of the array holding this category in the taxonomy document.
    pub fn group_name(self) -> &'static str {
        match self {
            Category::Genre => "genres",
            Category::Event => "events",
            Category::Dynamics => "dynamics",
        }
    }

    /// Category implied by the CMS tag slug convention: `p-*` tags are
    /// dynamics, `event-*` tags are events, everything else is a genre.
    pub fn from_slug_convention(slug: &str) -> Category {
        if slug.starts_with("p-") {
            Category::Dynamics
        } else if slug.starts_with("event-") {
            Category::Event
        } else {
            Category::Genre
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = crate::error::GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genre" => Ok(Category::Genre),
            "event" => Ok(Category::Event),
            "dynamics" => Ok(Category::Dynamics),
            _ => Err(crate::error::GateError::InvalidCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Requirement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    Optional,
}

impl Requirement {
    pub fn is_required(self) -> bool {
        matches!(self, Requirement::Required)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
