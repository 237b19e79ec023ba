//! Progress reporting for query execution

use colored::Colorize;
use cryptovox_application::QueryProgressNotifier;
use cryptovox_domain::{ToolCall, ToolResult};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Spinner on stderr that follows the model/tool loop.
///
/// With `echo_stream`, streamed model text is written to stderr as it
/// arrives, above the spinner.
pub struct ProgressReporter {
    spinner: ProgressBar,
    echo_stream: bool,
    /// Streamed text not yet terminated by a newline
    pending_line: Mutex<String>,
}

impl ProgressReporter {
    pub fn new(echo_stream: bool) -> Self {
        let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        spinner.set_style(Self::spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self {
            spinner,
            echo_stream,
            pending_line: Mutex::new(String::new()),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Clear the spinner; call once the query is finished.
    pub fn finish(&self) {
        self.flush_pending();
        self.spinner.finish_and_clear();
    }

    fn flush_pending(&self) {
        let mut pending = self.pending_line.lock().unwrap_or_else(|e| e.into_inner());
        if !pending.is_empty() {
            let line = std::mem::take(&mut *pending);
            self.spinner.println(line.dimmed().to_string());
        }
    }
}

impl QueryProgressNotifier for ProgressReporter {
    fn on_model_call_start(&self, round: usize) {
        self.spinner.set_prefix(format!("Round {round}"));
        self.spinner.set_message("asking the model...");
    }

    fn on_text_delta(&self, chunk: &str) {
        if !self.echo_stream {
            return;
        }
        let mut pending = self.pending_line.lock().unwrap_or_else(|e| e.into_inner());
        pending.push_str(chunk);
        while let Some(pos) = pending.find('\n') {
            let line: String = pending.drain(..=pos).collect();
            self.spinner
                .println(line.trim_end_matches('\n').dimmed().to_string());
        }
    }

    fn on_model_call_end(&self, _round: usize) {
        self.flush_pending();
    }

    fn on_tool_started(&self, call: &ToolCall) {
        self.spinner
            .set_message(format!("calling {}", call.tool_name.yellow()));
    }

    fn on_tool_finished(&self, result: &ToolResult) {
        let mark = if result.is_success() {
            "v".green()
        } else {
            "x".red()
        };
        let mut line = format!("  {} {}", mark, result.tool_name);
        if let Some(ms) = result.metadata.duration_ms {
            line.push_str(&format!(" ({ms} ms)"));
        }
        if result.metadata.cached {
            line.push_str(&format!(" {}", "[cached]".dimmed()));
        }
        self.spinner.println(line);
    }
}

/// Plain line-based progress for non-terminal stderr.
pub struct SimpleProgress {
    echo_stream: bool,
}

impl SimpleProgress {
    pub fn new(echo_stream: bool) -> Self {
        Self { echo_stream }
    }
}

impl QueryProgressNotifier for SimpleProgress {
    fn on_model_call_start(&self, round: usize) {
        eprintln!("{} model call {}", "->".cyan(), round);
    }

    fn on_text_delta(&self, chunk: &str) {
        if self.echo_stream {
            let mut err = std::io::stderr().lock();
            let _ = err.write_all(chunk.as_bytes());
            let _ = err.flush();
        }
    }

    fn on_model_call_end(&self, _round: usize) {
        if self.echo_stream {
            eprintln!();
        }
    }

    fn on_tool_finished(&self, result: &ToolResult) {
        if result.is_success() {
            eprintln!("  {} {}", "v".green(), result.tool_name);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), result.tool_name);
        }
    }
}
