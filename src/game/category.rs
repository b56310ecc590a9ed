//! The closed enumeration of character-card categories.
//!
//! Free-text input from dialogs is matched by exact lowercase name;
//! anything else is rejected rather than silently defaulted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One attribute dimension of a character card.
///
/// `Luggage` and `Special` carry two slots each, all other categories a
/// single value. `Special` is deliberately absent from [`Category::ADJUSTABLE`]:
/// special-condition cards move only through the card-play commands and a
/// full room teardown, never through admin mutation dialogs or reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Biology,
    Profession,
    Health,
    Hobby,
    Luggage,
    Fact,
    Special,
}

impl Category {
    /// Every category, in card order.
    pub const ALL: [Category; 7] = [
        Category::Biology,
        Category::Profession,
        Category::Health,
        Category::Hobby,
        Category::Luggage,
        Category::Fact,
        Category::Special,
    ];

    /// Categories admin dialogs may target (reveal, random, swap, shuffle, change).
    pub const ADJUSTABLE: [Category; 6] = [
        Category::Biology,
        Category::Profession,
        Category::Health,
        Category::Hobby,
        Category::Luggage,
        Category::Fact,
    ];

    /// Canonical lowercase name, also used as the wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Biology => "biology",
            Category::Profession => "profession",
            Category::Health => "health",
            Category::Hobby => "hobby",
            Category::Luggage => "luggage",
            Category::Fact => "fact",
            Category::Special => "special",
        }
    }

    /// Human-facing label for chat replies.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Biology => "Biology",
            Category::Profession => "Profession",
            Category::Health => "Health",
            Category::Hobby => "Hobby",
            Category::Luggage => "Luggage",
            Category::Fact => "Fact",
            Category::Special => "Special condition",
        }
    }

    /// Number of value slots a player holds for this category.
    pub fn slots(&self) -> usize {
        match self {
            Category::Luggage | Category::Special => 2,
            _ => 1,
        }
    }

    pub fn is_multi(&self) -> bool {
        self.slots() > 1
    }

    /// Parse any category by exact lowercase name.
    pub fn parse(input: &str) -> Option<Category> {
        let needle = input.trim().to_lowercase();
        Category::ALL.iter().copied().find(|c| c.as_str() == needle)
    }

    /// Parse a category an admin dialog may target; rejects `special`.
    pub fn parse_adjustable(input: &str) -> Option<Category> {
        Category::parse(input).filter(|c| *c != Category::Special)
    }

    /// Prompt line listing the adjustable categories.
    pub fn adjustable_list() -> String {
        Category::ADJUSTABLE
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
