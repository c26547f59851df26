//! In-memory search history.
//!
//! Keeps the keywords the user has searched for, oldest first, without
//! duplicates. Nothing is persisted.

/// Keywords offered before the user has searched for anything.
pub const PRESET_KEYWORDS: &[&str] = &["machine learning catalyst", "photocatalysis VOCs", "glaucoma"];

/// Ordered list of past search keywords.
#[derive(Debug, Clone, Default)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history seeded with [`PRESET_KEYWORDS`].
    pub fn with_presets() -> Self {
        let mut history = Self::new();
        for keyword in PRESET_KEYWORDS {
            history.record(keyword);
        }
        history
    }

    /// Append a keyword.
    ///
    /// # Returns
    /// `false` if the keyword was empty or already present
    pub fn record(&mut self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.entries.iter().any(|k| k == keyword) {
            return false;
        }
        self.entries.push(keyword.to_string());
        true
    }

    /// The last `n` keywords, newest first.
    pub fn recent(&self, n: usize) -> Vec<&str> {
        self.entries.iter().rev().take(n).map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
