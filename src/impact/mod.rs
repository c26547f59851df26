//! Journal impact-factor index.
//!
//! A static, best-effort table mapping lower-cased journal names to a score.
//! Journal names returned by the works API often carry subtitles, suffixes or
//! punctuation variants, so lookups fall back to substring matching when the
//! exact name is not in the table.
//!
//! The index is immutable once built. Share it with `Arc` and hand it to the
//! enricher explicitly; tests build their own tables with
//! [`ImpactFactorIndex::from_entries`].

use std::collections::HashMap;

use thiserror::Error;

/// Errors raised while building an index.
#[derive(Debug, Error, PartialEq)]
pub enum ImpactIndexError {
    /// Scores must be positive and finite
    #[error("Invalid score {score} for journal '{name}'")]
    InvalidScore { name: String, score: f64 },

    /// Journal names must be non-empty after trimming
    #[error("Journal name must not be empty")]
    EmptyName,
}

/// Result type for index construction.
pub type ImpactIndexResult<T> = Result<T, ImpactIndexError>;

/// How a substring fallback picks between several matching keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// The longest matching key wins; equal lengths go to the earlier key
    #[default]
    LongestKey,

    /// The first matching key in declaration order wins
    FirstDeclared,
}

/// Built-in table, in declaration order.
const DEFAULT_TABLE: &[(&str, f64)] = &[
    // General
    ("Nature", 64.8),
    ("Science", 56.9),
    ("Cell", 64.5),
    ("Nature Communications", 16.6),
    ("Science Advances", 13.6),
    ("The New England Journal of Medicine", 158.5),
    ("The Lancet", 168.9),
    ("JAMA", 120.7),
    ("BMJ", 105.7),
    ("Nature Medicine", 82.9),
    ("Nature Biotechnology", 68.1),
    // Medicine and open-access titles
    ("Ophthalmology", 13.1),
    ("JAMA Ophthalmology", 7.8),
    ("Investigative Ophthalmology & Visual Science", 4.9),
    ("PLoS One", 3.7),
    ("Scientific Reports", 4.6),
    ("Frontiers in Cell and Developmental Biology", 5.3),
    ("Frontiers in Immunology", 7.3),
    ("International Journal of Molecular Sciences", 5.6),
    ("Molecules", 4.6),
    // AI and computing
    ("Nature Machine Intelligence", 25.8),
    ("IEEE Transactions on Pattern Analysis and Machine Intelligence", 23.6),
    ("Expert Systems with Applications", 8.5),
    ("Knowledge-Based Systems", 8.8),
    // Chemistry, materials, environment
    ("Chemical Society Reviews", 46.2),
    ("Advanced Materials", 29.4),
    ("Journal of the American Chemical Society", 15.0),
    ("Energy & Environmental Science", 32.4),
    ("Applied Catalysis B: Environment and Energy", 22.1),
    ("Chemical Engineering Journal", 15.1),
    ("Water Research", 12.8),
    ("Journal of Cleaner Production", 11.1),
    ("Science of The Total Environment", 9.8),
    ("ACS Nano", 17.1),
    ("Nano Letters", 10.8),
    ("Small", 13.3),
];

/// Immutable journal-name to impact-factor mapping.
///
/// Keys are stored lower-cased. Declaration order is preserved because the
/// `FirstDeclared` policy depends on it.
#[derive(Debug, Clone)]
pub struct ImpactFactorIndex {
    /// Entries in declaration order
    entries: Vec<(String, f64)>,

    /// Exact-match lookup, key -> position in `entries`
    exact: HashMap<String, usize>,

    /// Substring tie-break policy
    policy: MatchPolicy,
}

impl ImpactFactorIndex {
    /// Build an index from `(name, score)` pairs in declaration order.
    ///
    /// Names are trimmed and lower-cased. A repeated name keeps its first
    /// position and takes the later score.
    ///
    /// # Errors
    /// Returns `ImpactIndexError` for empty names or non-positive scores
    pub fn from_entries<I, S>(entries: I) -> ImpactIndexResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut ordered: Vec<(String, f64)> = Vec::new();
        let mut exact: HashMap<String, usize> = HashMap::new();

        for (name, score) in entries {
            let key = name.as_ref().trim().to_lowercase();
            if key.is_empty() {
                return Err(ImpactIndexError::EmptyName);
            }
            if !score.is_finite() || score <= 0.0 {
                return Err(ImpactIndexError::InvalidScore { name: key, score });
            }

            match exact.get(&key) {
                Some(&pos) => ordered[pos].1 = score,
                None => {
                    exact.insert(key.clone(), ordered.len());
                    ordered.push((key, score));
                }
            }
        }

        Ok(Self {
            entries: ordered,
            exact,
            policy: MatchPolicy::default(),
        })
    }

    /// The built-in table of well-known journals.
    pub fn builtin() -> Self {
        let mut entries = Vec::with_capacity(DEFAULT_TABLE.len());
        let mut exact = HashMap::with_capacity(DEFAULT_TABLE.len());
        for (name, score) in DEFAULT_TABLE {
            let key = name.to_lowercase();
            exact.insert(key.clone(), entries.len());
            entries.push((key, *score));
        }

        Self {
            entries,
            exact,
            policy: MatchPolicy::default(),
        }
    }

    /// Return a copy of this index using the given tie-break policy.
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The substring tie-break policy in effect.
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Look up the impact factor for a journal name.
    ///
    /// Tries an exact case-insensitive match first, then falls back to the
    /// keys contained in the name, chosen according to the policy.
    ///
    /// # Returns
    /// The score, or `None` when nothing matches
    pub fn lookup(&self, journal_name: &str) -> Option<f64> {
        let needle = journal_name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(&pos) = self.exact.get(&needle) {
            return Some(self.entries[pos].1);
        }

        let mut candidates = self
            .entries
            .iter()
            .filter(|(key, _)| needle.contains(key.as_str()));

        match self.policy {
            MatchPolicy::FirstDeclared => candidates.next().map(|(_, score)| *score),
            MatchPolicy::LongestKey => candidates
                .fold(None::<&(String, f64)>, |best, entry| match best {
                    Some(current) if current.0.len() >= entry.0.len() => Some(current),
                    _ => Some(entry),
                })
                .map(|(_, score)| *score),
        }
    }

    /// Number of journals in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(lower-cased name, score)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, score)| (name.as_str(), *score))
    }
}

impl Default for ImpactFactorIndex {
    fn default() -> Self {
        Self::builtin()
    }
}
