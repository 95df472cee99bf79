//! Character-to-word timing aggregation
//!
//! The TTS provider aligns synthesized audio per character. Clients highlight
//! per word, so character runs are folded into words here. Whitespace only
//! ever closes a word; it never opens or extends one.

use serde::{Deserialize, Serialize};

/// Per-character alignment, in the provider's parallel-array wire shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterAlignment {
    pub characters: Vec<String>,
    pub character_start_times_seconds: Vec<f64>,
    pub character_end_times_seconds: Vec<f64>,
}

impl CharacterAlignment {
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Whether all three arrays describe the same number of characters
    pub fn is_consistent(&self) -> bool {
        self.characters.len() == self.character_start_times_seconds.len()
            && self.characters.len() == self.character_end_times_seconds.len()
    }

    /// Append another fragment's arrays, field by field, preserving order
    pub fn extend(&mut self, fragment: CharacterAlignment) {
        self.characters.extend(fragment.characters);
        self.character_start_times_seconds
            .extend(fragment.character_start_times_seconds);
        self.character_end_times_seconds
            .extend(fragment.character_end_times_seconds);
    }

    pub fn to_words(&self) -> WordTimings {
        aggregate(
            &self.characters,
            &self.character_start_times_seconds,
            &self.character_end_times_seconds,
        )
    }
}

/// Word-level timings, field names matching the response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordTimings {
    pub words: Vec<String>,
    pub word_start_times_seconds: Vec<f64>,
    pub word_end_times_seconds: Vec<f64>,
}

/// One borrowed (word, start, end) triple
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordTiming<'a> {
    pub word: &'a str,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl WordTimings {
    pub fn push(&mut self, word: String, start_seconds: f64, end_seconds: f64) {
        self.words.push(word);
        self.word_start_times_seconds.push(start_seconds);
        self.word_end_times_seconds.push(end_seconds);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Check the parallel arrays line up (for values that came off the wire)
    pub fn validate(&self) -> Result<(), String> {
        let (w, s, e) = (
            self.words.len(),
            self.word_start_times_seconds.len(),
            self.word_end_times_seconds.len(),
        );
        if w == s && w == e {
            Ok(())
        } else {
            Err(format!(
                "word timing arrays differ in length: words={}, starts={}, ends={}",
                w, s, e
            ))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = WordTiming<'_>> {
        self.words
            .iter()
            .zip(&self.word_start_times_seconds)
            .zip(&self.word_end_times_seconds)
            .map(|((word, &start_seconds), &end_seconds)| WordTiming {
                word,
                start_seconds,
                end_seconds,
            })
    }
}

fn is_space(character: &str) -> bool {
    !character.is_empty() && character.chars().all(char::is_whitespace)
}

/// Fold per-character timings into per-word timings.
///
/// The three slices are read positionally; if their lengths differ, the
/// extra entries of the longer ones are ignored.
pub fn aggregate<S: AsRef<str>>(characters: &[S], starts: &[f64], ends: &[f64]) -> WordTimings {
    let mut timings = WordTimings::default();

    let mut current = String::new();
    let mut bounds: Option<(f64, f64)> = None;

    for ((character, &start), &end) in characters.iter().zip(starts).zip(ends) {
        let character = character.as_ref();

        if is_space(character) {
            if let Some((word_start, word_end)) = bounds.take() {
                timings.push(std::mem::take(&mut current), word_start, word_end);
            }
            continue;
        }

        current.push_str(character);
        bounds = match bounds {
            None => Some((start, end)),
            Some((word_start, _)) => Some((word_start, end)),
        };
    }

    if let Some((word_start, word_end)) = bounds {
        timings.push(current, word_start, word_end);
    }

    timings
}
