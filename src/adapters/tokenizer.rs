//! Regex-based token counting.

use regex_lite::Regex;

use crate::ports::Tokenizer;

/// Default token pattern: runs of word characters.
const WORD_PATTERN: &str = r"\w+";

/// Counts regex matches as tokens.
///
/// With the default pattern this is a naive word count, which is close
/// enough to real model tokenizers for budgeting tests.
#[derive(Debug, Clone)]
pub struct WordTokenizer {
    pattern: Regex,
}

impl WordTokenizer {
    /// Tokenizer that counts `\w+` runs.
    pub fn new() -> Result<Self, regex_lite::Error> {
        Self::with_pattern(WORD_PATTERN)
    }

    /// Tokenizer that counts matches of a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Tokenizer for WordTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }
}
