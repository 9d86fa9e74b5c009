//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration from
//! `.career-quiz.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".career-quiz.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// LLM endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Feature flags.
    #[serde(default)]
    pub features: FeatureFlags,

    /// Behaviour when the LLM is unavailable or slow.
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// API usage limits.
    #[serde(default)]
    pub cost_control: CostControlConfig,

    /// Quiz script settings.
    #[serde(default)]
    pub quiz: QuizConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "quiz_report.md".to_string()
}

/// LLM endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Messages endpoint, or the URL of a key-hiding proxy.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Talk to a proxy that injects the key and returns `{ "content": "..." }`.
    #[serde(default)]
    pub proxy_mode: bool,

    /// Model name (ignored in proxy mode).
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in a response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// API key. Normally supplied through `CLAUDE_API_KEY` rather than the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            proxy_mode: false,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout(),
            api_key: None,
        }
    }
}

fn default_api_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_model() -> String {
    "claude-3-sonnet-20240229".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_timeout() -> u64 {
    30
}

/// LLM feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Generate questions at `dynamic` branch points.
    #[serde(default = "default_true")]
    pub dynamic_questions: bool,

    /// Ask the extractor's suggested probe as a follow-up.
    #[serde(default = "default_true")]
    pub intelligent_followups: bool,

    /// Analyse answers with the LLM at all.
    #[serde(default = "default_true")]
    pub nlp_analysis: bool,

    /// Let keyword probes from the trigger tables become follow-ups.
    #[serde(default = "default_true")]
    pub smart_routing: bool,

    /// Send the aggregate profile along with each analysis request.
    #[serde(default = "default_true")]
    pub conversation_memory: bool,

    /// Write a career blueprint into the report once the quiz is complete.
    #[serde(default = "default_true")]
    pub ai_blueprints: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            dynamic_questions: true,
            intelligent_followups: true,
            nlp_analysis: true,
            smart_routing: true,
            conversation_memory: true,
            ai_blueprints: true,
        }
    }
}

impl FeatureFlags {
    /// Every flag off: a purely static quiz.
    pub fn disabled() -> Self {
        Self {
            dynamic_questions: false,
            intelligent_followups: false,
            nlp_analysis: false,
            smart_routing: false,
            conversation_memory: false,
            ai_blueprints: false,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.dynamic_questions
            || self.intelligent_followups
            || self.nlp_analysis
            || self.smart_routing
            || self.conversation_memory
            || self.ai_blueprints
    }
}

fn default_true() -> bool {
    true
}

/// Fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Fall back to the static quiz when the LLM is not configured.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Deadline for a single extraction or generation call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl FallbackConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// API usage limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostControlConfig {
    /// LLM calls allowed per quiz session (extraction + generation).
    #[serde(default = "default_max_api_calls")]
    pub max_api_calls_per_quiz: u32,
}

impl Default for CostControlConfig {
    fn default() -> Self {
        Self {
            max_api_calls_per_quiz: default_max_api_calls(),
        }
    }
}

fn default_max_api_calls() -> u32 {
    15
}

/// Quiz script settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Path to a TOML quiz script. The built-in script is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.llm.api_url = url.clone();
        }
        if args.proxy {
            self.llm.proxy_mode = true;
        }
        if let Some(ref model) = args.model {
            self.llm.model = model.clone();
        }
        if let Some(temperature) = args.temperature {
            self.llm.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.llm.timeout_seconds = timeout;
        }
        if args.api_key.is_some() {
            self.llm.api_key = args.api_key.clone();
        }

        if let Some(max_calls) = args.max_api_calls {
            self.cost_control.max_api_calls_per_quiz = max_calls;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref script) = args.script {
            self.quiz.script = Some(script.display().to_string());
        }

        if args.no_dynamic {
            self.features.dynamic_questions = false;
        }
        if args.no_blueprint {
            self.features.ai_blueprints = false;
        }
        if args.offline {
            self.features = FeatureFlags::disabled();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Whether the configured endpoint can be called at all.
    pub fn llm_configured(&self) -> bool {
        if self.llm.proxy_mode {
            return true;
        }
        matches!(self.llm.api_key.as_deref(), Some(key) if key.starts_with("sk-ant-"))
    }

    /// Check the LLM settings, switching every feature off when the endpoint
    /// is unusable and fallback is allowed.
    ///
    /// Returns whether the LLM will be used.
    pub fn validate(&mut self) -> Result<bool> {
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            bail!("Temperature must be between 0.0 and 1.0");
        }
        if self.fallback.timeout_ms == 0 {
            bail!("Fallback timeout must be at least 1 ms");
        }

        if !self.features.any_enabled() {
            return Ok(false);
        }

        if self.llm_configured() {
            return Ok(true);
        }

        if !self.fallback.enabled {
            bail!("Claude API key not configured and fallback is disabled");
        }

        warn!("⚠️ Claude API key not configured. LLM features will be disabled.");
        self.features = FeatureFlags::disabled();
        Ok(false)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
