//! Console output: the response banner and the optional statistics block.

use crate::stats::StatsReport;
use std::io::{self, Write};

const RULE_HEAVY: &str = "====================================";
const RULE_LIGHT: &str = "------------------------------------";

/// Printed just before the completion request goes out
pub fn write_sending(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "\nSending request for summary to Azure OpenAI endpoint...\n\n")
}

/// The generated text, framed by a banner
pub fn write_response(out: &mut dyn Write, text: &str) -> io::Result<()> {
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out, "Response:")?;
    writeln!(out, "{RULE_HEAVY}\n")?;
    writeln!(out, "{text}\n")
}

pub fn write_stats(out: &mut dyn Write, stats: &StatsReport) -> io::Result<()> {
    writeln!(out, "{RULE_HEAVY}")?;
    writeln!(out, "Statistics:")?;
    writeln!(out, "{RULE_LIGHT}")?;

    writeln!(out, "Prompt tokens: {}", stats.prompt_tokens)?;
    writeln!(out, "Completion tokens: {}", stats.completion_tokens)?;
    writeln!(out, "Total tokens: {}", stats.total_tokens)?;
    writeln!(out, "{RULE_LIGHT}")?;

    writeln!(out, "Prompt word count: {}", stats.prompt_words)?;
    writeln!(out, "Response word count: {}", stats.response_words)?;
    writeln!(
        out,
        "Prompt tokens per word: {}",
        ratio(stats.prompt_tokens_per_word)
    )?;
    writeln!(
        out,
        "Completion tokens per word: {}",
        ratio(stats.completion_tokens_per_word)
    )?;
    writeln!(out, "{RULE_LIGHT}")?;

    let cost = &stats.cost;
    writeln!(out, "Prompt token cost: {}", cost.format(cost.prompt))?;
    writeln!(out, "Completion token cost: {}", cost.format(cost.completion))?;
    writeln!(out, "Total cost: {}", cost.format(cost.total))?;
    writeln!(out, "{RULE_LIGHT}")?;

    writeln!(
        out,
        "Request took {:.2} seconds.",
        stats.elapsed.as_secs_f64()
    )?;
    writeln!(out, "{RULE_HEAVY}\n")
}

/// One decimal place, or `n/a` when there was nothing to divide by
fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}
