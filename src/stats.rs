//! Usage statistics derived from a completion: word counts, token ratios and cost.

use crate::completion::Usage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How token usage is priced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Pricing {
    /// Separate per-1k-token prices for prompt and completion
    Tiered { input_per_1k: f64, output_per_1k: f64 },
    /// One per-1k-token price for both directions
    Blended { per_1k: f64 },
}

impl Pricing {
    fn rates_per_1k(&self) -> (f64, f64) {
        match *self {
            Pricing::Tiered {
                input_per_1k,
                output_per_1k,
            } => (input_per_1k, output_per_1k),
            Pricing::Blended { per_1k } => (per_1k, per_1k),
        }
    }

    /// Decimal places used when printing amounts under this pricing
    pub fn precision(&self) -> usize {
        match self {
            Pricing::Tiered { .. } => 3,
            Pricing::Blended { .. } => 6,
        }
    }

    pub fn cost(&self, usage: &Usage) -> Cost {
        let (input_rate, output_rate) = self.rates_per_1k();
        let prompt = usage.prompt_tokens as f64 * input_rate / 1000.0;
        let completion = usage.completion_tokens as f64 * output_rate / 1000.0;
        Cost {
            prompt,
            completion,
            total: prompt + completion,
            precision: self.precision(),
        }
    }
}

/// Dollar cost of one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cost {
    pub prompt: f64,
    pub completion: f64,
    pub total: f64,
    pub precision: usize,
}

impl Cost {
    pub fn format(&self, amount: f64) -> String {
        format!("${:.*}", self.precision, amount)
    }
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Tokens per word, or `None` when there are no words to divide by
pub fn tokens_per_word(tokens: u32, words: usize) -> Option<f64> {
    (words > 0).then(|| tokens as f64 / words as f64)
}

/// Everything printed under `--stats`
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// System instruction plus input text
    pub prompt_words: usize,
    pub response_words: usize,
    pub prompt_tokens_per_word: Option<f64>,
    pub completion_tokens_per_word: Option<f64>,
    pub cost: Cost,
    pub elapsed: Duration,
}

impl StatsReport {
    pub fn new(
        usage: &Usage,
        system_message: &str,
        input: &str,
        response: &str,
        pricing: &Pricing,
        elapsed: Duration,
    ) -> Self {
        let prompt_words = word_count(system_message) + word_count(input);
        let response_words = word_count(response);

        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total(),
            prompt_words,
            response_words,
            prompt_tokens_per_word: tokens_per_word(usage.prompt_tokens, prompt_words),
            completion_tokens_per_word: tokens_per_word(usage.completion_tokens, response_words),
            cost: pricing.cost(usage),
            elapsed,
        }
    }
}
