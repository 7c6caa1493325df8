use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

use crate::vocabulary::{Statistics, Word, WordStat};

/// Pad `text` to `width` terminal columns; Czech diacritics and other wide
/// characters are measured by display width, not bytes
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

pub fn format_word(word: &Word) -> String {
    let tags: Vec<&str> = [word.category.as_deref(), word.level.as_deref()]
        .into_iter()
        .flatten()
        .collect();

    if tags.is_empty() {
        format!("#{} {} = {}", word.id, word.czech, word.english)
    } else {
        format!(
            "#{} {} = {} ({})",
            word.id,
            word.czech,
            word.english,
            tags.join(", ")
        )
    }
}

fn format_table(title: &str, rows: &[WordStat]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");

    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
        return out;
    }

    let czech_width = rows
        .iter()
        .map(|r| r.word.czech.width())
        .chain(std::iter::once("czech".width()))
        .max()
        .unwrap_or(0);
    let english_width = rows
        .iter()
        .map(|r| r.word.english.width())
        .chain(std::iter::once("english".width()))
        .max()
        .unwrap_or(0);

    let _ = writeln!(
        out,
        "  {}  {}  {:>8}  {:>8}  {:>6}",
        pad("czech", czech_width),
        pad("english", english_width),
        "mistakes",
        "attempts",
        "ratio"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "  {}  {}  {:>8}  {:>8}  {:>6.2}",
            pad(&row.word.czech, czech_width),
            pad(&row.word.english, english_width),
            row.total_mistakes,
            row.attempt_count,
            row.mistake_ratio
        );
    }
    out
}

/// Human readable statistics summary for the terminal
pub fn format_statistics(stats: &Statistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Attempts:      {}", stats.total_attempts);
    let _ = writeln!(out, "Mistakes:      {}", stats.total_mistakes);
    let _ = writeln!(
        out,
        "Words learned: {}/{}",
        stats.words_learned, stats.total_words
    );
    let _ = writeln!(out);
    out.push_str(&format_table("Most mistakes", &stats.top_mistake_words));
    let _ = writeln!(out);
    out.push_str(&format_table(
        "Highest mistake ratio",
        &stats.top_ratio_words,
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(czech: &str, english: &str) -> Word {
        Word {
            id: 1,
            czech: czech.to_string(),
            english: english.to_string(),
            category: Some("animals".to_string()),
            level: None,
        }
    }

    #[test]
    fn test_pad_counts_display_width() {
        assert_eq!(pad("kůň", 5), "kůň  ");
        assert_eq!(pad("longer", 3), "longer");
    }

    #[test]
    fn test_format_word() {
        assert_eq!(format_word(&word("pes", "dog")), "#1 pes = dog (animals)");

        let mut bare = word("voda", "water");
        bare.category = None;
        assert_eq!(format_word(&bare), "#1 voda = water");
    }

    #[test]
    fn test_format_statistics() {
        let stats = Statistics {
            total_attempts: 1,
            total_mistakes: 5,
            words_learned: 1,
            total_words: 2,
            top_mistake_words: vec![WordStat {
                word: word("kůň", "horse"),
                attempt_count: 1,
                total_mistakes: 5,
                mistake_ratio: 5.0,
            }],
            top_ratio_words: Vec::new(),
        };

        let text = format_statistics(&stats);

        assert!(text.contains("Words learned: 1/2"));
        assert!(text.contains("kůň    horse"));
        assert!(text.contains("5.00"));
        assert!(text.contains("(none)"));
    }
}
