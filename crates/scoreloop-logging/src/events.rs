use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for the scoring loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    LoopStarted {
        task: String,
        working_dir: PathBuf,
        max_iterations: usize,
        quality_threshold: f64,
    },
    IterationStarted {
        iteration: usize,
        prompt_preview: String,
    },
    EngineCompleted {
        iteration: usize,
        event_count: usize,
        denied_count: usize,
        duration_secs: f64,
    },
    EvidenceCollected {
        iteration: usize,
        files_modified: usize,
        commands_run: usize,
        tests_run: bool,
        tests_passed: u64,
        tests_failed: u64,
    },
    AssessmentCompleted {
        iteration: usize,
        score: f64,
        band: String,
        passed: bool,
        improvements: Vec<String>,
    },
    LoopTerminated {
        status: String,
        reason: String,
        final_score: f64,
        iterations: usize,
        duration_secs: f64,
    },
    ErrorEncountered {
        iteration: usize,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors and visual structure
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for loop events - console output plus an optional JSON-lines file
pub struct Logger {
    format: LogFormat,
    console: bool,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            console: true,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            console: true,
            file_writer: Some(Mutex::new(file)),
        })
    }

    /// Stop writing to stderr; the file sink, if any, keeps working
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if !self.console {
            return;
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::LoopStarted {
                task,
                working_dir,
                max_iterations,
                quality_threshold,
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "scoreloop".bold().bright_white(),
                    " ".repeat(58) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Task:".dimmed(),
                    Self::truncate_with_padding(task, 62, 68).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Dir:".dimmed(),
                    Self::truncate_with_padding(&working_dir.display().to_string(), 63, 68)
                        .dimmed()
                );
                let limits = format!(
                    "up to {} iterations, pass at {:.1}",
                    max_iterations, quality_threshold
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Loop:".dimmed(),
                    Self::truncate_with_padding(&limits, 62, 68).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::IterationStarted { iteration, .. } => {
                let iter_text = format!("─ Iteration {} ", iteration + 1);
                let padding = "─".repeat(67usize.saturating_sub(iter_text.chars().count()));
                let _ = writeln!(
                    stderr,
                    "{}{}{}",
                    "┌".bright_blue(),
                    iter_text.bright_blue().bold(),
                    padding.bright_blue()
                );
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_cyan(),
                    "ENGINE".bright_cyan().bold()
                );
            }
            LogEvent::EngineCompleted {
                event_count,
                denied_count,
                duration_secs,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "    {} Done ({:.1}s, {} events)",
                    "✓".bright_green(),
                    duration_secs,
                    event_count
                );
                if *denied_count > 0 {
                    let _ = writeln!(
                        stderr,
                        "    {} {} tool call(s) denied",
                        "⚠".bright_yellow(),
                        denied_count
                    );
                }
                let _ = writeln!(stderr);
            }
            LogEvent::EvidenceCollected {
                files_modified,
                commands_run,
                tests_run,
                tests_passed,
                tests_failed,
                ..
            } => {
                let tests = if *tests_run {
                    format!(
                        "{} {}",
                        format!("{} passed", tests_passed).green(),
                        format!("{} failed", tests_failed).red()
                    )
                } else {
                    "no tests run".dimmed().to_string()
                };
                let _ = writeln!(
                    stderr,
                    "    {} {} {} {}, {} {}, {}",
                    "📁".dimmed(),
                    "Evidence:".dimmed(),
                    files_modified,
                    if *files_modified == 1 { "file" } else { "files" },
                    commands_run,
                    if *commands_run == 1 { "command" } else { "commands" },
                    tests
                );
                let _ = writeln!(stderr);
            }
            LogEvent::AssessmentCompleted {
                score,
                band,
                passed,
                improvements,
                ..
            } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "▶".bright_magenta(),
                    "ASSESSMENT".bright_magenta().bold()
                );
                let line = format!("Score: {:.1}/100 ({})", score, band);
                let styled = if *passed {
                    format!("✓ {}", line).bright_green().to_string()
                } else {
                    format!("→ {}", line).bright_yellow().to_string()
                };
                let _ = writeln!(stderr, "    {}", styled);
                for improvement in improvements {
                    let _ = writeln!(stderr, "    {} {}", "•".dimmed(), improvement.dimmed());
                }
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "└─────────────────────────────────────────────────────────────────────┘"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::LoopTerminated {
                status,
                reason,
                final_score,
                iterations,
                duration_secs,
            } => {
                let summary = format!(
                    "{} after {} iteration(s): {} (score {:.1}, {:.1}s)",
                    status, iterations, reason, final_score, duration_secs
                );
                let _ = writeln!(stderr);
                if status == "success" {
                    let _ = writeln!(stderr, "{} {}", "✓".bright_green(), summary.bright_green());
                } else {
                    let _ = writeln!(stderr, "{} {}", "⚠".bright_yellow(), summary);
                }
            }
            LogEvent::ErrorEncountered { iteration, error } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{} Error in iteration {}: {}",
                    "✗".bright_red(),
                    iteration + 1,
                    error.bright_red()
                );
            }
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::LoopStarted { max_iterations, .. } => {
                format!("[{}] loop:start max={}", timestamp, max_iterations)
            }
            LogEvent::IterationStarted { iteration, .. } => {
                format!("[{}] iter:start:{}", timestamp, iteration + 1)
            }
            LogEvent::EngineCompleted {
                iteration,
                event_count,
                duration_secs,
                ..
            } => format!(
                "[{}] engine:done:{} events={} {:.1}s",
                timestamp,
                iteration + 1,
                event_count,
                duration_secs
            ),
            LogEvent::EvidenceCollected {
                iteration,
                files_modified,
                tests_passed,
                tests_failed,
                ..
            } => format!(
                "[{}] evidence:{} {}f {}p {}x",
                timestamp,
                iteration + 1,
                files_modified,
                tests_passed,
                tests_failed
            ),
            LogEvent::AssessmentCompleted {
                iteration,
                score,
                band,
                ..
            } => format!(
                "[{}] score:{} {:.1} {}",
                timestamp,
                iteration + 1,
                score,
                band
            ),
            LogEvent::LoopTerminated {
                reason,
                iterations,
                final_score,
                ..
            } => format!(
                "[{}] loop:done:{} {} {:.1}",
                timestamp, iterations, reason, final_score
            ),
            LogEvent::ErrorEncountered { iteration, error } => {
                format!("[{}] error:{}:{}", timestamp, iteration + 1, error)
            }
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let truncated = if s.chars().count() > max_len {
            let kept: String = s.chars().take(max_len - 3).collect();
            format!("{}...", kept)
        } else {
            s.to_string()
        };

        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1); // +1 for trailing │
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}
