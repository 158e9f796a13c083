//! CLI entrypoint for ChatList
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use chatlist_application::{
    BrowseHistoryUseCase, ComparePromptInput, ComparePromptUseCase, DispatchProgress,
    DispatchReport, ManageModelsUseCase, ManageSettingsUseCase, NoProgress, NoRunLogger,
    RunLogger, SavePromptUseCase, StagingAggregator,
};
use chatlist_domain::{ModelId, ModelPatch, NewModel, PromptId, ResultId, SecretRef, Tags};
use chatlist_infrastructure::{
    ConfigLoader, EnvSecretResolver, FileConfig, HttpModelClient, JsonlRunLogger, SqliteChatStore,
};
use chatlist_presentation::output::export;
use chatlist_presentation::{
    AskArgs, Cli, Command, ConsoleFormatter, ModelsCommand, ProgressReporter, PromptsCommand,
    ResultsCommand, SettingsCommand, SimpleProgress,
};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).map_err(|e| anyhow!("Invalid configuration: {e}"))?
    };
    config.validate()?;

    if !config.output.color {
        colored::control::set_override(false);
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // === Dependency Injection ===
    let db_path = config.database.resolved_path();
    let store = Arc::new(
        SqliteChatStore::open(&db_path)
            .with_context(|| format!("Could not open database {}", db_path.display()))?,
    );
    info!("Using database {}", db_path.display());

    match command {
        Command::Ask(args) => ask(store, &config, args, cli.quiet).await,
        Command::Models { action } => models(store, action).await,
        Command::Prompts { action } => prompts(store, action).await,
        Command::Results { action } => results(store, action).await,
        Command::Settings { action } => settings(store, action).await,
    }
}

fn run_logger(config: &FileConfig) -> Arc<dyn RunLogger> {
    match config.logging.run_log.as_ref().and_then(JsonlRunLogger::open) {
        Some(logger) => {
            info!("Writing run log to {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoRunLogger),
    }
}

async fn ask(
    store: Arc<SqliteChatStore>,
    config: &FileConfig,
    args: AskArgs,
    quiet: bool,
) -> Result<()> {
    // A saved prompt row, or the literal text
    let input = match args.prompt_id {
        Some(id) => {
            let saved = BrowseHistoryUseCase::new(Arc::clone(&store))
                .prompt(PromptId::new(id))
                .await?;
            ComparePromptInput::from_saved(&saved)
        }
        None => ComparePromptInput::new(args.prompt.clone().unwrap_or_default())
            .with_tags(tags_from_args(&args.tags)),
    };
    let prompt_text = input.prompt.trim().to_string();

    let logger = run_logger(config);
    let client = Arc::new(HttpModelClient::new(EnvSecretResolver::new())?);
    let staging = Arc::new(StagingAggregator::new(Arc::clone(&store)).with_logger(Arc::clone(&logger)));
    let use_case = ComparePromptUseCase::new(client, store)
        .with_staging(Arc::clone(&staging))
        .with_defaults(config.dispatch.to_policy_defaults())
        .with_logger(logger);

    // Ctrl-C cancels the run; answers that already arrived are kept
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let progress: Box<dyn DispatchProgress> = if quiet || args.json {
        Box::new(NoProgress)
    } else if config.output.show_progress {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };

    let report = use_case
        .execute_with_progress(input, progress.as_ref(), &cancel)
        .await?;

    if args.json {
        println!("{}", ConsoleFormatter::format_json(&report));
    } else {
        println!("{}", ConsoleFormatter::format_report(&prompt_text, &report));
    }

    let Some(names) = args.save else {
        if !args.json && report.succeeded().next().is_some() {
            println!(
                "{}",
                "Answers were not saved. Re-run with --save [MODEL]... to keep them.".dimmed()
            );
        }
        return Ok(());
    };

    let selected = select_models(&report, &names)?;
    if selected.is_empty() {
        warn!("No successful answers to save");
        return Ok(());
    }
    let ids = staging.commit(&selected, &prompt_text).await?;
    if !args.json {
        println!("{} {} answer(s)", "Saved".green().bold(), ids.len());
    }
    Ok(())
}

/// `--tag` values, each of which may hold several comma-separated tags
fn tags_from_args(tags: &[String]) -> Tags {
    Tags::new(tags.iter().flat_map(|t| t.split(',')))
}

/// Ids of the outcomes to save: every success, or the named models.
fn select_models(report: &DispatchReport, names: &[String]) -> Result<Vec<ModelId>> {
    if names.is_empty() {
        return Ok(report.succeeded().map(|o| o.model_id).collect());
    }
    names
        .iter()
        .map(|name| {
            report
                .outcomes
                .values()
                .find(|o| o.model_name.eq_ignore_ascii_case(name))
                .map(|o| o.model_id)
                .ok_or_else(|| anyhow!("Model '{name}' was not part of this run"))
        })
        .collect()
}

async fn models(store: Arc<SqliteChatStore>, action: ModelsCommand) -> Result<()> {
    let models = ManageModelsUseCase::new(store);
    match action {
        ModelsCommand::List => {
            print!("{}", ConsoleFormatter::format_models(&models.list().await?));
        }
        ModelsCommand::Add {
            name,
            url,
            api_id,
            inactive,
        } => {
            let model = NewModel::try_new(name, url, api_id)?.with_active(!inactive);
            let created = models.create(model).await?;
            println!("{} {}", "Added".green().bold(), created);
        }
        ModelsCommand::Edit {
            id,
            name,
            url,
            api_id,
        } => {
            let patch = ModelPatch {
                name,
                api_url: url,
                secret: api_id.map(SecretRef::new),
                is_active: None,
            };
            if patch.is_empty() {
                bail!("Nothing to change; pass --name, --url or --api-id");
            }
            let updated = models.update(ModelId::new(id), patch).await?;
            println!("{} {}", "Updated".green().bold(), updated);
        }
        ModelsCommand::Toggle { id } => {
            let model = models.toggle(ModelId::new(id)).await?;
            let state = if model.is_active { "active" } else { "inactive" };
            println!("{} is now {}", model, state.bold());
        }
        ModelsCommand::Remove { id } => {
            models.delete(ModelId::new(id)).await?;
            println!("{} model #{}", "Removed".green().bold(), id);
        }
    }
    Ok(())
}

async fn prompts(store: Arc<SqliteChatStore>, action: PromptsCommand) -> Result<()> {
    let history = BrowseHistoryUseCase::new(Arc::clone(&store));
    match action {
        PromptsCommand::Add { text, tags } => {
            let saved = SavePromptUseCase::new(store)
                .save(&text, tags_from_args(&tags))
                .await?;
            if saved.created {
                println!("{} prompt #{}", "Saved".green().bold(), saved.id);
            } else {
                println!("Prompt already saved as #{}", saved.id);
            }
            println!(
                "{}",
                format!("Run it with: chatlist ask --prompt-id {}", saved.id).dimmed()
            );
        }
        PromptsCommand::List => {
            print!("{}", ConsoleFormatter::format_prompts(&history.prompts(None).await?));
        }
        PromptsCommand::Search { query } => {
            print!(
                "{}",
                ConsoleFormatter::format_prompts(&history.prompts(Some(&query)).await?)
            );
        }
        PromptsCommand::Show { id } => {
            let detail = history.prompt_detail(PromptId::new(id)).await?;
            print!(
                "{}",
                ConsoleFormatter::format_prompt_detail(&detail.prompt, &detail.results)
            );
        }
        PromptsCommand::Delete { id } => {
            history.delete_prompt(PromptId::new(id)).await?;
            println!("{} prompt #{} and its results", "Deleted".green().bold(), id);
        }
    }
    Ok(())
}

async fn results(store: Arc<SqliteChatStore>, action: ResultsCommand) -> Result<()> {
    let history = BrowseHistoryUseCase::new(store);
    match action {
        ResultsCommand::List { prompt: Some(id) } => {
            let detail = history.prompt_detail(PromptId::new(id)).await?;
            print!("{}", ConsoleFormatter::format_results(&detail.results));
        }
        ResultsCommand::List { prompt: None } => {
            print!("{}", ConsoleFormatter::format_results(&history.results(None).await?));
        }
        ResultsCommand::Search { query } => {
            print!(
                "{}",
                ConsoleFormatter::format_results(&history.results(Some(&query)).await?)
            );
        }
        ResultsCommand::Delete { id } => {
            history.delete_result(ResultId::new(id)).await?;
            println!("{} result #{}", "Deleted".green().bold(), id);
        }
        ResultsCommand::Export { format, out, query } => {
            let records = history.results(query.as_deref()).await?;
            let content = export::render(&records, format)?;
            std::fs::write(&out, content)
                .with_context(|| format!("Could not write {}", out.display()))?;
            println!(
                "{} {} result(s) to {}",
                "Exported".green().bold(),
                records.len(),
                out.display()
            );
        }
    }
    Ok(())
}

async fn settings(store: Arc<SqliteChatStore>, action: SettingsCommand) -> Result<()> {
    let settings = ManageSettingsUseCase::new(store);
    match action {
        SettingsCommand::List => {
            print!("{}", ConsoleFormatter::format_settings(&settings.list().await?));
        }
        SettingsCommand::Get { key } => match settings.get(&key).await? {
            Some(entry) => println!("{}", entry.value),
            None => bail!("Setting '{key}' is not set"),
        },
        SettingsCommand::Set { key, value } => {
            settings.set(&key, &value).await?;
            println!("{} {} = {}", "Set".green().bold(), key.trim(), value.trim());
        }
    }
    Ok(())
}
