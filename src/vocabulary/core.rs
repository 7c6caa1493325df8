use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type UserId = i64;
pub type WordId = i64;

/// A Czech/English term pair with optional grouping tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub czech: String,
    pub english: String,
    pub category: Option<String>,
    pub level: Option<String>,
}

/// One recorded practice event. Rows are never updated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: UserId,
    pub word_id: WordId,
    pub mistake_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Attempt payload before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttempt {
    pub user_id: UserId,
    pub word_id: WordId,
    pub mistake_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Category/level restriction on the candidate word set.
///
/// An empty set means "no restriction" for that dimension. When both sets are
/// populated a word has to satisfy each of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFilter {
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub levels: BTreeSet<String>,
}

impl WordFilter {
    pub fn new<C, L>(categories: C, levels: L) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn categories<I>(categories: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(categories, Vec::<String>::new())
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.levels.is_empty()
    }

    pub fn matches(&self, word: &Word) -> bool {
        matches_tag(&self.categories, word.category.as_deref())
            && matches_tag(&self.levels, word.level.as_deref())
    }
}

fn matches_tag(allowed: &BTreeSet<String>, tag: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    tag.is_some_and(|t| allowed.contains(t))
}
