//! The in-memory snapshot of candidate card values per category.
//!
//! One snapshot is current at a time; `/reload` builds a new one from the
//! spreadsheet and swaps it in atomically. A failed import never touches
//! the previous snapshot.

use log::warn;
use std::collections::HashMap;

use super::category::Category;

/// Immutable-per-reload mapping from category to its candidate values.
#[derive(Debug, Clone, Default)]
pub struct AttributePool {
    categories: HashMap<Category, Vec<String>>,
}

impl AttributePool {
    pub fn new() -> Self {
        AttributePool::default()
    }

    /// Build a snapshot from raw spreadsheet columns (header, cells).
    ///
    /// Unknown column headers and empty categories are logged as warnings,
    /// never errors; duplicates within a column are dropped, first
    /// occurrence wins.
    pub fn from_columns(columns: Vec<(String, Vec<String>)>) -> Self {
        let mut pool = AttributePool::new();
        for (header, cells) in columns {
            let category = match Category::parse(&header) {
                Some(c) => c,
                None => {
                    warn!("Skipping unknown sheet column '{}'", header.trim());
                    continue;
                }
            };
            let mut seen = std::collections::HashSet::new();
            let values: Vec<String> = cells
                .into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .filter(|v| seen.insert(v.clone()))
                .collect();
            if values.is_empty() {
                warn!("Sheet column '{}' has no usable values", category);
                continue;
            }
            pool.categories.insert(category, values);
        }
        for category in Category::ALL {
            if !pool.categories.contains_key(&category) {
                warn!("No values loaded for category '{}'", category);
            }
        }
        pool
    }

    /// Candidate values for a category; empty when nothing was loaded.
    pub fn values(&self, category: Category) -> &[String] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// `(category, value)` pairs for wholesale persistence.
    pub fn entries(&self) -> Vec<(Category, String)> {
        let mut out = Vec::new();
        for category in Category::ALL {
            for value in self.values(category) {
                out.push((category, value.clone()));
            }
        }
        out
    }

    /// Per-category counts for the `/reload` report, in card order.
    pub fn summary(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .iter()
            .map(|c| (*c, self.values(*c).len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn builds_from_columns_with_dedup_and_trim() {
        let pool = AttributePool::from_columns(vec![
            ("biology".into(), cells(&[" Male 30 ", "Female 25", "Male 30", ""])),
            ("hobby".into(), cells(&["Chess", "Chess"])),
        ]);
        assert_eq!(pool.values(Category::Biology), ["Male 30", "Female 25"]);
        assert_eq!(pool.values(Category::Hobby), ["Chess"]);
    }

    #[test]
    fn unknown_and_empty_columns_are_skipped() {
        let pool = AttributePool::from_columns(vec![
            ("mystery".into(), cells(&["x"])),
            ("fact".into(), cells(&["", "  "])),
        ]);
        assert!(pool.is_empty());
        assert!(pool.values(Category::Fact).is_empty());
    }

    #[test]
    fn entries_cover_every_loaded_value() {
        let pool = AttributePool::from_columns(vec![
            ("luggage".into(), cells(&["Rope", "Knife"])),
        ]);
        let entries = pool.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|(c, _)| *c == Category::Luggage));
    }
}
