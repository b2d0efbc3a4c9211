use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{error, info, warn};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use quill::agent::{
    ConversationAgent, ConversationProfile, TurnOutcome, WritingAgent, WritingOperator, WritingTask, WritingTaskKind,
};
use quill::dispatch::{CapabilityRegistry, Dispatcher, Draft};
use quill::evaluation::{DEFAULT_RUBRIC, RubricEvaluator};
use quill::history::HistorySaver;
use quill::llm::{OpenAiProvider, Provider, TimeoutProvider};
use quill::prompt::PromptLoader;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::{Config, HistoryConfig};

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("quill.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.unwrap_or("info")))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match cli.command.clone().unwrap_or_default() {
        Commands::Chat { no_eval, model } => run_chat(config, no_eval, model, cli.is_verbose()).await,
        Commands::Prompts => handle_prompts_command(config),
    }
}

/// Rubric from the prompts directory, or the built-in one
fn load_rubric(loader: &PromptLoader, name: &str) -> String {
    match loader.load_template(name) {
        Ok(rubric) => rubric,
        Err(e) => {
            warn!("Using built-in evaluator rubric: {}", e);
            DEFAULT_RUBRIC.to_string()
        }
    }
}

fn build_agent(config: &Config, provider: Arc<dyn Provider>, evaluate: bool) -> Result<ConversationAgent> {
    let loader = PromptLoader::new(&config.prompts.dir);
    let quality = config.quality.to_quality_config();
    let rubric = load_rubric(&loader, &config.prompts.evaluator);

    let writing_agent = WritingAgent::new(provider.clone())
        .with_tasks(
            WritingTask::load(&loader, &config.prompts.writing, WritingTaskKind::Creation),
            WritingTask::load(&loader, &config.prompts.writing, WritingTaskKind::Iteration),
        )
        .with_quality(quality.clone());
    let mut operator = WritingOperator::new(writing_agent, provider.clone());
    if evaluate {
        operator = operator.with_rubric(rubric.clone());
    }

    let registry = CapabilityRegistry::standard();
    let profile = ConversationProfile::load(&loader, &config.prompts.conversation, &registry)
        .context("Failed to build conversation prompt")?;
    let dispatcher = Dispatcher::new(registry, Arc::new(operator));

    let mut agent = ConversationAgent::new(provider.clone(), &profile, dispatcher).with_quality(quality);
    if evaluate {
        let evaluator = RubricEvaluator::new(provider, rubric, agent.system_prompt());
        agent = agent.with_evaluator(Arc::new(evaluator));
    }
    Ok(agent)
}

fn print_outcome(outcome: &TurnOutcome, verbose: bool) {
    println!("{} {}", "Assistant:".blue().bold(), outcome.response.answer_to_user);

    if verbose {
        let score = outcome
            .score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "not evaluated".to_string());
        println!("  {} score {} after {} attempt(s)", "Quality:".yellow(), score, outcome.attempts);
    }

    for invocation in &outcome.dispatch.invoked {
        match &invocation.draft {
            Draft::WritingStructure(draft) => {
                println!("{} writing structure {}", "Operator:".cyan(), draft.id);
                for (i, title) in draft.titles().iter().enumerate() {
                    println!("  {}. {}", i + 1, title);
                }
            }
            Draft::KnowledgeTree(tree) => {
                println!("{} knowledge tree {} for '{}'", "Operator:".cyan(), tree.id, tree.user_query);
            }
        }
    }
    for skipped in &outcome.dispatch.skipped {
        println!("  {} {}", "Skipped tool call:".yellow(), skipped);
    }
}

/// Run turns read from `input` until EOF or `exit`.
///
/// A read or turn failure ends the session with that error.
async fn chat_loop<R>(agent: &mut ConversationAgent, input: R, verbose: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        print!("{} ", "You:".green().bold());
        if let Err(e) = std::io::stdout().flush() {
            return Err(eyre::Report::new(e).wrap_err("Failed to flush stdout"));
        }

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(()),
            Err(e) => {
                error!("Failed to read input: {}", e);
                eprintln!("{} {}", "Error:".red().bold(), e);
                return Err(eyre::Report::new(e).wrap_err("Failed to read input"));
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            return Ok(());
        }

        match agent.respond_to(input).await {
            Ok(outcome) => print_outcome(&outcome, verbose),
            Err(e) => {
                error!("Turn failed: {}", e);
                eprintln!("{} {}", "Error:".red().bold(), e);
                return Err(eyre::Report::new(e).wrap_err("Turn failed"));
            }
        }
    }
}

/// Chat until the session ends, then save the history however it ended
async fn run_session<R>(agent: &mut ConversationAgent, input: R, history: &HistoryConfig, verbose: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let result = chat_loop(agent, input, verbose).await;

    if history.save {
        let path = HistorySaver::new(&history.dir)
            .save(agent.history())
            .context("Failed to save chat history")?;
        println!("{} {}", "History saved to".cyan(), path.display());
    }

    result
}

async fn run_chat(config: &Config, no_eval: bool, model: Option<String>, verbose: bool) -> Result<()> {
    let mut llm = config.llm.clone();
    if let Some(model) = model {
        llm.model = model;
    }
    info!("Starting chat with model {}", llm.model);

    let openai = Arc::new(
        OpenAiProvider::from_env(&llm.api_key_env, llm.to_provider_config()).context("Failed to create provider")?,
    );
    let provider: Arc<dyn Provider> = Arc::new(TimeoutProvider::new(openai.clone(), llm.timeout()));

    let evaluate = config.quality.enabled && !no_eval;
    let mut agent = build_agent(config, provider, evaluate)?;

    println!("{}", "Chat started. Type 'exit' to quit.".cyan());
    let result = run_session(&mut agent, BufReader::new(tokio::io::stdin()), &config.history, verbose).await;

    if verbose {
        let usage = openai.total_usage();
        println!(
            "{} {} prompt + {} completion = {} tokens",
            "Usage:".yellow(),
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total()
        );
    }

    result
}

fn handle_prompts_command(config: &Config) -> Result<()> {
    let loader = PromptLoader::new(&config.prompts.dir);
    let names = loader
        .list_available()
        .context(format!("Failed to list prompts in {}", loader.prompts_dir().display()))?;

    if names.is_empty() {
        println!("{} {}", "No prompt files in".yellow(), loader.prompts_dir().display());
        return Ok(());
    }

    println!("{} {}", "Prompts in".green(), loader.prompts_dir().display());
    for name in names {
        match loader.load(&name) {
            Ok(file) if !file.description.is_empty() => println!("  {} - {}", name.bold(), file.description),
            Ok(_) => println!("  {}", name.bold()),
            Err(e) => println!("  {} {}", name.bold(), format!("(unreadable: {})", e).red()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging once the configured level is known
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
