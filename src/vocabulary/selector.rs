use super::{
    core::{Word, WordId},
    history::WordHistory,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::HashMap;

/// Weight given to words the user has never attempted
pub const UNSEEN_WORD_WEIGHT: u64 = 1000;

/// Selection weight for a word given the user's history on it.
///
/// Unseen words get [`UNSEEN_WORD_WEIGHT`]; seen words grow linearly with
/// mistakes starting from a baseline of 1.
pub fn selection_weight(history: Option<&WordHistory>) -> u64 {
    match history {
        Some(h) if !h.is_unseen() => 1 + h.total_mistakes,
        _ => UNSEEN_WORD_WEIGHT,
    }
}

/// Candidate words with their cumulative weight table, built once and drawn
/// from any number of times
#[derive(Debug, Clone)]
pub struct WeightedPool {
    words: Vec<Word>,
    weights: Vec<u64>,
    index: WeightedIndex<u64>,
}

impl WeightedPool {
    /// Returns `None` when there are no candidates to draw from
    pub fn build(words: Vec<Word>, histories: &HashMap<WordId, WordHistory>) -> Option<Self> {
        if words.is_empty() {
            return None;
        }

        let weights: Vec<u64> = words
            .iter()
            .map(|word| selection_weight(histories.get(&word.id)))
            .collect();

        // every weight is at least 1, so this only fails on an empty pool
        let index = WeightedIndex::new(&weights).ok()?;

        Some(Self {
            words,
            weights,
            index,
        })
    }

    /// Draw one word with probability proportional to its weight
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &Word {
        &self.words[self.index.sample(rng)]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.weights.iter().sum()
    }

    pub fn weight_of(&self, word_id: WordId) -> Option<u64> {
        self.words
            .iter()
            .position(|w| w.id == word_id)
            .map(|i| self.weights[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn create_test_words() -> Vec<Word> {
        ["pes", "kočka", "auto", "dům"]
            .iter()
            .enumerate()
            .map(|(i, czech)| Word {
                id: i as WordId + 1,
                czech: czech.to_string(),
                english: format!("english-{i}"),
                category: None,
                level: None,
            })
            .collect()
    }

    fn history(attempt_count: u64, total_mistakes: u64) -> WordHistory {
        WordHistory {
            attempt_count,
            total_mistakes,
        }
    }

    fn draw_counts(pool: &WeightedPool, draws: usize, seed: u64) -> HashMap<WordId, usize> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut counts = HashMap::new();
        for _ in 0..draws {
            *counts.entry(pool.draw(&mut rng).id).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_selection_weight() {
        assert_eq!(selection_weight(None), UNSEEN_WORD_WEIGHT);
        assert_eq!(selection_weight(Some(&history(0, 0))), UNSEEN_WORD_WEIGHT);
        assert_eq!(selection_weight(Some(&history(1, 0))), 1);
        assert_eq!(selection_weight(Some(&history(3, 5))), 6);
    }

    #[test]
    fn test_empty_pool() {
        assert!(WeightedPool::build(Vec::new(), &HashMap::new()).is_none());
    }

    #[test]
    fn test_pool_weights() {
        let mut histories = HashMap::new();
        histories.insert(1, history(1, 5));
        histories.insert(2, history(2, 0));

        let pool = WeightedPool::build(create_test_words(), &histories).unwrap();

        assert_eq!(pool.len(), 4);
        assert_eq!(pool.weight_of(1), Some(6));
        assert_eq!(pool.weight_of(2), Some(1));
        assert_eq!(pool.weight_of(3), Some(UNSEEN_WORD_WEIGHT));
        assert_eq!(pool.weight_of(99), None);
        assert_eq!(pool.total_weight(), 6 + 1 + 2 * UNSEEN_WORD_WEIGHT);
    }

    #[test]
    fn test_single_word_always_drawn() {
        let words = create_test_words().into_iter().take(1).collect();
        let pool = WeightedPool::build(words, &HashMap::new()).unwrap();

        let counts = draw_counts(&pool, 50, 7);
        assert_eq!(counts.get(&1), Some(&50));
    }

    #[test]
    fn test_more_mistakes_drawn_more_often() {
        let words: Vec<Word> = create_test_words().into_iter().take(2).collect();
        let mut histories = HashMap::new();
        histories.insert(1, history(2, 9));
        histories.insert(2, history(2, 1));

        let pool = WeightedPool::build(words, &histories).unwrap();
        let counts = draw_counts(&pool, 10_000, 42);

        // weights 10 vs 2
        let heavy = counts.get(&1).copied().unwrap_or(0);
        let light = counts.get(&2).copied().unwrap_or(0);
        assert!(
            heavy > light * 3,
            "heavier word should dominate (got {heavy} vs {light})"
        );
    }

    #[test]
    fn test_unseen_word_dominates_clean_word() {
        let words: Vec<Word> = create_test_words().into_iter().take(2).collect();
        let mut histories = HashMap::new();
        histories.insert(1, history(1, 0));

        let pool = WeightedPool::build(words, &histories).unwrap();
        let draws = 200_000;
        let counts = draw_counts(&pool, draws, 1234);

        let unseen = counts.get(&2).copied().unwrap_or(0) as f64;
        let seen = counts.get(&1).copied().unwrap_or(0).max(1) as f64;
        let ratio = unseen / seen;
        assert!(
            (500.0..2000.0).contains(&ratio),
            "unseen word should be drawn ~1000x more often (ratio {ratio})"
        );
    }
}
