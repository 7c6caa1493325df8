use super::{
    core::{Word, WordId},
    history::WordHistory,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum length of each ranking list
pub const TOP_WORDS_LIMIT: usize = 10;

/// A word together with the user's aggregate results on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordStat {
    #[serde(flatten)]
    pub word: Word,
    pub attempt_count: u64,
    pub total_mistakes: u64,
    pub mistake_ratio: f64,
}

impl WordStat {
    fn new(word: &Word, history: WordHistory) -> Self {
        Self {
            word: word.clone(),
            attempt_count: history.attempt_count,
            total_mistakes: history.total_mistakes,
            mistake_ratio: history.mistake_ratio(),
        }
    }
}

/// Aggregate practice results over a filtered word set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_attempts: u64,
    pub total_mistakes: u64,
    pub words_learned: usize,
    pub total_words: usize,
    pub top_mistake_words: Vec<WordStat>,
    pub top_ratio_words: Vec<WordStat>,
}

impl Statistics {
    /// Aggregate `histories` over `words`.
    ///
    /// Histories for words outside `words` are ignored, so the caller may pass
    /// the user's whole history. Ranking ties keep the order of `words`.
    pub fn aggregate(words: &[Word], histories: &HashMap<WordId, WordHistory>) -> Self {
        let practiced: Vec<WordStat> = words
            .iter()
            .filter_map(|word| {
                histories
                    .get(&word.id)
                    .filter(|h| !h.is_unseen())
                    .map(|h| WordStat::new(word, *h))
            })
            .collect();

        let total_attempts = practiced.iter().map(|s| s.attempt_count).sum();
        let total_mistakes = practiced.iter().map(|s| s.total_mistakes).sum();

        let top_mistake_words = practiced
            .iter()
            .filter(|s| s.total_mistakes > 0)
            .sorted_by(|a, b| {
                b.total_mistakes
                    .cmp(&a.total_mistakes)
                    .then(b.attempt_count.cmp(&a.attempt_count))
            })
            .take(TOP_WORDS_LIMIT)
            .cloned()
            .collect();

        let top_ratio_words = practiced
            .iter()
            .filter(|s| s.total_mistakes > 0)
            .sorted_by(|a, b| {
                b.mistake_ratio
                    .partial_cmp(&a.mistake_ratio)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .take(TOP_WORDS_LIMIT)
            .cloned()
            .collect();

        Self {
            total_attempts,
            total_mistakes,
            words_learned: practiced.len(),
            total_words: words.len(),
            top_mistake_words,
            top_ratio_words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_words(count: usize) -> Vec<Word> {
        (1..=count)
            .map(|i| Word {
                id: i as WordId,
                czech: format!("slovo{i}"),
                english: format!("word{i}"),
                category: Some("animals".to_string()),
                level: Some("simple".to_string()),
            })
            .collect()
    }

    fn history(attempt_count: u64, total_mistakes: u64) -> WordHistory {
        WordHistory {
            attempt_count,
            total_mistakes,
        }
    }

    fn ids(stats: &[WordStat]) -> Vec<WordId> {
        stats.iter().map(|s| s.word.id).collect()
    }

    #[test]
    fn test_empty_history() {
        let words = create_test_words(3);
        let stats = Statistics::aggregate(&words, &HashMap::new());

        assert_eq!(stats.total_attempts, 0);
        assert_eq!(stats.total_mistakes, 0);
        assert_eq!(stats.words_learned, 0);
        assert_eq!(stats.total_words, 3);
        assert!(stats.top_mistake_words.is_empty());
        assert!(stats.top_ratio_words.is_empty());
    }

    #[test]
    fn test_no_words() {
        let stats = Statistics::aggregate(&[], &HashMap::new());
        assert_eq!(stats, Statistics::default());
    }

    #[test]
    fn test_totals() {
        let words = create_test_words(3);
        let mut histories = HashMap::new();
        histories.insert(1, history(2, 3));
        histories.insert(2, history(4, 0));

        let stats = Statistics::aggregate(&words, &histories);

        assert_eq!(stats.total_attempts, 6);
        assert_eq!(stats.total_mistakes, 3);
        assert_eq!(stats.words_learned, 2);
        assert_eq!(stats.total_words, 3);
    }

    #[test]
    fn test_histories_outside_word_set_are_ignored() {
        let words = create_test_words(2);
        let mut histories = HashMap::new();
        histories.insert(1, history(1, 1));
        histories.insert(42, history(10, 10));

        let stats = Statistics::aggregate(&words, &histories);

        assert_eq!(stats.total_attempts, 1);
        assert_eq!(stats.total_mistakes, 1);
        assert_eq!(stats.words_learned, 1);
    }

    #[test]
    fn test_top_mistakes_ordering_and_ties() {
        let words = create_test_words(5);
        let mut histories = HashMap::new();
        histories.insert(1, history(1, 4));
        histories.insert(2, history(3, 4)); // same mistakes, more attempts
        histories.insert(3, history(1, 9));
        histories.insert(4, history(5, 0)); // excluded
        histories.insert(5, history(1, 4)); // exact tie with word 1

        let stats = Statistics::aggregate(&words, &histories);

        assert_eq!(ids(&stats.top_mistake_words), vec![3, 2, 1, 5]);
    }

    #[test]
    fn test_top_ratio_ordering() {
        let words = create_test_words(4);
        let mut histories = HashMap::new();
        histories.insert(1, history(4, 4)); // 1.0
        histories.insert(2, history(1, 3)); // 3.0
        histories.insert(3, history(2, 1)); // 0.5
        histories.insert(4, history(2, 0)); // excluded

        let stats = Statistics::aggregate(&words, &histories);

        assert_eq!(ids(&stats.top_ratio_words), vec![2, 1, 3]);
        assert_eq!(stats.top_ratio_words[0].mistake_ratio, 3.0);
    }

    #[test]
    fn test_top_ratio_ties_keep_word_order() {
        let words = create_test_words(5);
        let mut histories = HashMap::new();
        histories.insert(5, history(1, 2)); // 2.0
        histories.insert(2, history(2, 4)); // 2.0
        histories.insert(4, history(1, 3)); // 3.0
        histories.insert(1, history(4, 8)); // 2.0
        histories.insert(3, history(2, 1)); // 0.5

        let stats = Statistics::aggregate(&words, &histories);

        assert_eq!(ids(&stats.top_ratio_words), vec![4, 1, 2, 5, 3]);
    }

    #[test]
    fn test_top_lists_are_capped() {
        let words = create_test_words(15);
        let histories: HashMap<WordId, WordHistory> = words
            .iter()
            .map(|w| (w.id, history(1, w.id as u64)))
            .collect();

        let stats = Statistics::aggregate(&words, &histories);

        assert_eq!(stats.top_mistake_words.len(), TOP_WORDS_LIMIT);
        assert_eq!(stats.top_ratio_words.len(), TOP_WORDS_LIMIT);
        assert_eq!(stats.top_mistake_words[0].word.id, 15);
        assert_eq!(stats.top_mistake_words[9].word.id, 6);
    }

    #[test]
    fn test_serializes_flattened_word() {
        let words = create_test_words(1);
        let mut histories = HashMap::new();
        histories.insert(1, history(1, 5));

        let stats = Statistics::aggregate(&words, &histories);
        let json = serde_json::to_value(&stats).unwrap();

        let top = &json["top_mistake_words"][0];
        assert_eq!(top["czech"], "slovo1");
        assert_eq!(top["total_mistakes"], 5);
        assert_eq!(top["attempt_count"], 1);
    }
}
