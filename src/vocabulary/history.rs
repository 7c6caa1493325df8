use super::core::{Attempt, WordId};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-word summary of one user's attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordHistory {
    pub attempt_count: u64,
    pub total_mistakes: u64,
}

impl WordHistory {
    pub fn record(&mut self, mistake_count: u32) {
        self.attempt_count += 1;
        self.total_mistakes += u64::from(mistake_count);
    }

    pub fn is_unseen(&self) -> bool {
        self.attempt_count == 0
    }

    /// Mistakes per attempt, 0.0 for words never attempted
    pub fn mistake_ratio(&self) -> f64 {
        if self.attempt_count == 0 {
            0.0
        } else {
            self.total_mistakes as f64 / self.attempt_count as f64
        }
    }
}

/// Group attempts by word and fold them into per-word histories
pub fn tally_attempts<'a, I>(attempts: I) -> HashMap<WordId, WordHistory>
where
    I: IntoIterator<Item = &'a Attempt>,
{
    attempts
        .into_iter()
        .into_grouping_map_by(|attempt| attempt.word_id)
        .fold(WordHistory::default(), |mut history, _word_id, attempt| {
            history.record(attempt.mistake_count);
            history
        })
}
