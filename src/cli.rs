//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// career-quiz - adaptive career assessment in the terminal
///
/// Walks through a career quiz, analysing each answer with Claude to ask
/// follow-ups, tailor questions and build a profile. Falls back to the
/// static quiz when no API key is configured.
///
/// Examples:
///   career-quiz
///   career-quiz --offline --output my_results.md
///   career-quiz --answers answers.json --format json
///   career-quiz --proxy --api-url https://quiz.example.edu/api/claude
///   career-quiz --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Replay answers from a JSON file instead of reading stdin
    ///
    /// The file holds an array of answers in question order. Each answer is
    /// a string or an array of strings, or an object with "question_id" and
    /// "response" to answer a specific question.
    #[arg(short, long, value_name = "FILE")]
    pub answers: Option<PathBuf>,

    /// Output file path for the session report
    ///
    /// Defaults to the configured output, quiz_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .career-quiz.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Quiz script to use instead of the built-in questions (TOML)
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Claude API key
    #[arg(long, env = "CLAUDE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Messages endpoint or proxy URL
    #[arg(long, value_name = "URL", env = "CLAUDE_API_URL")]
    pub api_url: Option<String>,

    /// Talk to a key-hiding proxy instead of the API directly
    #[arg(long)]
    pub proxy: bool,

    /// Claude model to use (ignored in proxy mode)
    #[arg(short, long, env = "CLAUDE_MODEL")]
    pub model: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum LLM calls for this quiz
    #[arg(long, value_name = "COUNT")]
    pub max_api_calls: Option<u32>,

    /// Never generate questions; keep to the script
    #[arg(long)]
    pub no_dynamic: bool,

    /// Leave the career blueprint out of the report
    #[arg(long)]
    pub no_blueprint: bool,

    /// Disable every LLM feature and run the static quiz
    #[arg(long)]
    pub offline: bool,

    /// Session identifier recorded in the report
    #[arg(long, value_name = "ID")]
    pub session_id: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .career-quiz.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref answers) = self.answers {
            if !answers.is_file() {
                return Err(format!("Answers file does not exist: {}", answers.display()));
            }
        }

        if let Some(ref script) = self.script {
            if !script.is_file() {
                return Err(format!("Quiz script does not exist: {}", script.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) fn make_args() -> Args {
    Args {
        answers: None,
        output: None,
        format: OutputFormat::Markdown,
        config: None,
        script: None,
        api_key: None,
        api_url: None,
        proxy: false,
        model: None,
        temperature: None,
        timeout: None,
        max_api_calls: None,
        no_dynamic: false,
        no_blueprint: false,
        offline: false,
        session_id: None,
        verbose: false,
        quiet: false,
        init_config: false,
    }
}
