pub mod core;
pub mod history;
pub mod seed;
pub mod selector;
pub mod statistics;

// Re-export the main types for convenience
pub use self::core::{Attempt, NewAttempt, UserId, Word, WordFilter, WordId};
pub use history::{tally_attempts, WordHistory};
pub use seed::{SeedWord, WordList};
pub use selector::{selection_weight, WeightedPool, UNSEEN_WORD_WEIGHT};
pub use statistics::{Statistics, WordStat, TOP_WORDS_LIMIT};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_words() -> Vec<Word> {
        vec![
            Word {
                id: 1,
                czech: "pes".to_string(),
                english: "dog".to_string(),
                category: Some("animals".to_string()),
                level: Some("simple".to_string()),
            },
            Word {
                id: 2,
                czech: "kočka".to_string(),
                english: "cat".to_string(),
                category: Some("animals".to_string()),
                level: Some("simple".to_string()),
            },
        ]
    }

    #[test]
    fn test_shared_history_feeds_selection_and_statistics() {
        let words = create_test_words();
        let attempts = vec![Attempt {
            id: 1,
            user_id: 7,
            word_id: 1,
            mistake_count: 5,
            created_at: Utc::now(),
        }];
        let histories = tally_attempts(&attempts);

        let stats = Statistics::aggregate(&words, &histories);
        assert_eq!(stats.total_attempts, 1);
        assert_eq!(stats.total_mistakes, 5);
        assert_eq!(stats.words_learned, 1);
        assert_eq!(stats.total_words, 2);
        assert_eq!(stats.top_mistake_words.len(), 1);
        assert_eq!(stats.top_mistake_words[0].word.czech, "pes");

        let pool = WeightedPool::build(words, &histories).unwrap();
        assert_eq!(pool.weight_of(1), Some(6));
        assert_eq!(pool.weight_of(2), Some(UNSEEN_WORD_WEIGHT));

        let mut rng = StdRng::seed_from_u64(3);
        let kocka = (0..1000)
            .filter(|_| pool.draw(&mut rng).czech == "kočka")
            .count();
        assert!(kocka > 950, "kočka should dominate (got {kocka} of 1000)");
    }
}
