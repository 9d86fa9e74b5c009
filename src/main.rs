//! career-quiz - adaptive career assessment in the terminal
//!
//! Walks a respondent through a career quiz. Each answer is analysed by an
//! LLM, which may trigger a follow-up or a tailored question; canned
//! reactions are surfaced from fixed trigger tables. Without an API key the
//! quiz runs statically.
//!
//! Exit codes:
//!   0 - Quiz completed and report written
//!   1 - Runtime error (config, script, I/O)
//!   3 - Quiz stopped before the end (report still written)

mod cli;
mod config;
mod driver;
mod error;
mod llm;
mod models;
mod profile;
mod report;
mod routing;
mod session;
mod triggers;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use driver::AnswerSource;
use llm::{
    BlueprintWriter, InsightExtractor, LlmBlueprintWriter, LlmClient, LlmInsightExtractor,
    LlmQuestionGenerator, OfflineCollaborator, QuestionGenerator,
};
use report::SessionReport;
use routing::{QuestionRouter, QuizScript};
use session::{CallPolicy, SessionAggregator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use triggers::PatternMatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("career-quiz v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_quiz(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Quiz failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .career-quiz.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Set CLAUDE_API_KEY to enable the LLM features.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one quiz session. Returns the exit code (0 or 3).
async fn run_quiz(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    let llm_enabled = config.validate()?;

    let script = match config.quiz.script {
        Some(ref path) => {
            info!("Loading quiz script from: {}", path);
            QuizScript::load(Path::new(path))?
        }
        None => QuizScript::builtin(),
    };

    let collaborators = build_collaborators(&config, llm_enabled)?;
    let aggregator = SessionAggregator::new(
        QuestionRouter::new(script, config.features),
        PatternMatcher::default(),
        collaborators.extractor,
        collaborators.generator,
        CallPolicy {
            timeout: config.fallback.call_timeout(),
            max_api_calls: config.cost_control.max_api_calls_per_quiz,
        },
    )
    .with_blueprint_writer(collaborators.blueprint_writer);

    let mut source = match args.answers {
        Some(ref path) => AnswerSource::replay(path)?,
        None => AnswerSource::interactive(),
    };

    println!("🎯 Career Quiz");
    if llm_enabled {
        println!("   Model: {}", model_label(&config));
        println!(
            "   API budget: {} calls",
            config.cost_control.max_api_calls_per_quiz
        );
    } else {
        println!("   Running the static quiz (LLM features off)");
    }
    if source.is_interactive() {
        println!("   Type the number of an option or your own answer. 'quit' stops.");
    }

    let session_id = args
        .session_id
        .clone()
        .unwrap_or_else(|| format!("quiz-{}", Utc::now().format("%Y%m%d-%H%M%S")));
    let mut session = aggregator.new_session(session_id);

    let mut next = aggregator.begin(&mut session).await;
    let mut number = 0;

    while let Some(question) = next.take() {
        if !question.is_follow_up() {
            number += 1;
        }
        print!("{}", driver::render_question(&question, number));

        let Some((question_id, response)) = source.next_answer(&question).await? else {
            println!("\n⏸️  Stopping early.");
            break;
        };
        if !source.is_interactive() {
            println!("> {}", response);
        }

        match aggregator
            .process_answer(&mut session, &question_id, response)
            .await
        {
            Ok(turn) => {
                if let Some(remark) = turn.remark() {
                    println!("\n💬 {}", remark);
                }
                if let Some(ref encouragement) = turn.encouragement {
                    println!("\n✨ {}", encouragement);
                }
                next = turn.next_question;
            }
            Err(e) => {
                warn!("{}", e);
                eprintln!("⚠️  {}", e);
                next = Some(question);
            }
        }
    }

    if session.is_done() && config.features.ai_blueprints {
        println!("\n🗺️  Writing your career blueprint...");
    }
    aggregator.finish(&mut session).await;

    let report = SessionReport::from_session(&session, llm_enabled.then(|| model_label(&config)));
    let output_path = PathBuf::from(&config.general.output);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };
    report::write_report(&output, &output_path)?;

    print_summary(&report);
    println!("\n✅ Report saved to: {}", output_path.display());

    Ok(if session.is_done() { 0 } else { 3 })
}

struct Collaborators {
    extractor: Arc<dyn InsightExtractor>,
    generator: Arc<dyn QuestionGenerator>,
    blueprint_writer: Arc<dyn BlueprintWriter>,
}

/// Build the LLM collaborators, or offline stand-ins when the LLM is off.
fn build_collaborators(config: &Config, llm_enabled: bool) -> Result<Collaborators> {
    if !llm_enabled {
        return Ok(Collaborators {
            extractor: Arc::new(OfflineCollaborator),
            generator: Arc::new(OfflineCollaborator),
            blueprint_writer: Arc::new(OfflineCollaborator),
        });
    }

    let client = Arc::new(LlmClient::new(config.llm.clone())?);
    info!(
        "Using LLM endpoint {} ({} mode)",
        config.llm.api_url,
        if config.llm.proxy_mode { "proxy" } else { "direct" }
    );

    Ok(Collaborators {
        extractor: Arc::new(LlmInsightExtractor::new(client.clone())),
        generator: Arc::new(LlmQuestionGenerator::new(client.clone())),
        blueprint_writer: Arc::new(LlmBlueprintWriter::new(client)),
    })
}

fn model_label(config: &Config) -> String {
    if config.llm.proxy_mode {
        "proxy".to_string()
    } else {
        config.llm.model.clone()
    }
}

fn print_summary(report: &SessionReport) {
    println!("\n📊 Quiz Summary:");
    println!(
        "   Questions answered: {}",
        report.metadata.questions_answered
    );
    println!(
        "   Overall tone: {} {}",
        report.profile.dominant_sentiment.emoji(),
        report.profile.dominant_sentiment
    );
    if !report.profile.top_themes.is_empty() {
        let themes: Vec<&str> = report
            .profile
            .top_themes
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        println!("   Key themes: {}", themes.join(", "));
    }
    match report.blueprint {
        Some(ref blueprint) => {
            println!("   Recommended program: {}", blueprint.programs.primary)
        }
        None => {
            if let Some(program) = report.profile.recommended_programs.first() {
                println!("   Top program match: {}", program.name);
            }
        }
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
