//! Console output for answers

use crate::cli::commands::OutputFormat;
use crate::output::envelope::ResponseEnvelope;
use chrono::Utc;
use colored::Colorize;
use cryptovox_application::AnswerQueryOutput;

/// Formats query outcomes for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a successful answer.
    pub fn format_answer(format: OutputFormat, query: &str, output: &AnswerQueryOutput) -> String {
        match format {
            OutputFormat::Text => output.answer.clone(),
            OutputFormat::Json => ResponseEnvelope::success(query, &output.answer, Utc::now()).to_json(),
        }
    }

    /// Format a failed query.
    pub fn format_error(format: OutputFormat, error: &str) -> String {
        match format {
            OutputFormat::Text => format!("{} {}", "Error:".red().bold(), error),
            OutputFormat::Json => ResponseEnvelope::failure(error, Utc::now()).to_json(),
        }
    }

    /// One-line timing summary, shown with `-v`.
    pub fn format_stats(output: &AnswerQueryOutput) -> String {
        format!(
            "{} {} ms, {} tool round(s), {} tool call(s)",
            "->".cyan(),
            output.elapsed.as_millis(),
            output.tool_rounds,
            output.tool_calls
        )
    }

    /// Banner for interactive mode.
    pub fn format_banner(tool_names: &[String]) -> String {
        let shown: Vec<&str> = tool_names.iter().take(5).map(String::as_str).collect();
        let more = tool_names.len().saturating_sub(shown.len());
        let mut line = format!(
            "{} {} tools ({}",
            "cryptovox".cyan().bold(),
            tool_names.len(),
            shown.join(", ")
        );
        if more > 0 {
            line.push_str(&format!(", ... and {more} more"));
        }
        line.push(')');
        format!("{line}\nAsk a question per line; Ctrl-D to quit.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn output() -> AnswerQueryOutput {
        AnswerQueryOutput {
            answer: "Bitcoin is at $67,000.".to_string(),
            tool_rounds: 1,
            tool_calls: 1,
            elapsed: Duration::from_millis(1234),
        }
    }

    #[test]
    fn test_text_answer_is_bare() {
        let s = ConsoleFormatter::format_answer(OutputFormat::Text, "btc?", &output());
        assert_eq!(s, "Bitcoin is at $67,000.");
    }

    #[test]
    fn test_json_answer_is_envelope() {
        let s = ConsoleFormatter::format_answer(OutputFormat::Json, "btc?", &output());
        let env: ResponseEnvelope = serde_json::from_str(&s).unwrap();
        assert!(env.success);
        assert_eq!(env.speech.as_deref(), Some("Bitcoin is at $67,000."));
        assert_eq!(env.query.as_deref(), Some("btc?"));
    }

    #[test]
    fn test_json_error_is_envelope() {
        let s = ConsoleFormatter::format_error(OutputFormat::Json, "Query cancelled");
        let env: ResponseEnvelope = serde_json::from_str(&s).unwrap();
        assert!(!env.success);
        assert_eq!(env.error.as_deref(), Some("Query cancelled"));
    }

    #[test]
    fn test_stats_and_banner() {
        colored::control::set_override(false);
        assert_eq!(
            ConsoleFormatter::format_stats(&output()),
            "-> 1234 ms, 1 tool round(s), 1 tool call(s)"
        );
        let names: Vec<String> = (1..=7).map(|i| format!("tool_{i}")).collect();
        let banner = ConsoleFormatter::format_banner(&names);
        assert!(banner.starts_with("cryptovox 7 tools (tool_1, tool_2, tool_3, tool_4, tool_5, ... and 2 more)"));
    }
}
