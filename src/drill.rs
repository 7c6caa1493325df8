//! Vocabulary drill operations: weighted word selection, attempt recording
//! and statistics.
//!
//! Every operation takes an already authenticated user id. Selection and
//! statistics share one loading step: fetch the filtered words, fetch the
//! user's attempts on them and fold those into per-word histories.

use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DrillError, Result};
use crate::store::VocabularyStore;
use crate::vocabulary::{
    tally_attempts, Attempt, NewAttempt, Statistics, UserId, WeightedPool, Word, WordFilter,
    WordHistory, WordId,
};

fn load_history<S>(
    store: &S,
    user_id: UserId,
    filter: &WordFilter,
) -> Result<(Vec<Word>, HashMap<WordId, WordHistory>)>
where
    S: VocabularyStore + ?Sized,
{
    let words = store.query_words(filter)?;
    let word_ids: Vec<WordId> = words.iter().map(|w| w.id).collect();
    let attempts = store.query_attempts(user_id, &word_ids)?;
    Ok((words, tally_attempts(&attempts)))
}

/// Build the weighted candidate pool for `user_id`.
///
/// Fails with `NotFound` when no word matches `filter`.
pub fn weighted_pool<S>(store: &S, user_id: UserId, filter: &WordFilter) -> Result<WeightedPool>
where
    S: VocabularyStore + ?Sized,
{
    let (words, histories) = load_history(store, user_id, filter)?;
    WeightedPool::build(words, &histories)
        .ok_or_else(|| DrillError::NotFound("No words match the filter".to_string()))
}

/// Pick one word, favouring unseen words and words with many past mistakes
pub fn select_word<S, R>(store: &S, user_id: UserId, filter: &WordFilter, rng: &mut R) -> Result<Word>
where
    S: VocabularyStore + ?Sized,
    R: Rng + ?Sized,
{
    let pool = weighted_pool(store, user_id, filter)?;
    let word = pool.draw(rng).clone();

    debug!(
        user_id,
        word_id = word.id,
        candidates = pool.len(),
        total_weight = pool.total_weight(),
        "Selected word"
    );

    Ok(word)
}

/// Append one attempt for `user_id` on `word_id`
pub fn record_attempt<S>(
    store: &S,
    user_id: UserId,
    word_id: WordId,
    mistake_count: i64,
) -> Result<Attempt>
where
    S: VocabularyStore + ?Sized,
{
    let mistake_count = u32::try_from(mistake_count).map_err(|_| {
        DrillError::InvalidInput(format!(
            "mistake count must be a non-negative integer, got {mistake_count}"
        ))
    })?;

    if store.get_word(word_id)?.is_none() {
        return Err(DrillError::NotFound(format!("Word {word_id} not found")));
    }

    let attempt = store.insert_attempt(&NewAttempt {
        user_id,
        word_id,
        mistake_count,
        created_at: Utc::now(),
    })?;

    debug!(user_id, word_id, mistake_count, "Recorded attempt {}", attempt.id);
    Ok(attempt)
}

/// Aggregate the user's attempts over the words matching `filter`
pub fn compute_statistics<S>(store: &S, user_id: UserId, filter: &WordFilter) -> Result<Statistics>
where
    S: VocabularyStore + ?Sized,
{
    let (words, histories) = load_history(store, user_id, filter)?;
    Ok(Statistics::aggregate(&words, &histories))
}
