mod cli;
mod commands;
mod config;
mod terminal;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use dermai_app::{ChatPage, PredictionPage};
use dermai_classify::{HttpClassifier, ResultView};
use dermai_core::config::{GenerationConfig, PageFeatures};
use dermai_core::{AppError, ClassificationResult, Config};
use dermai_llm::{create_provider, Assistant, LlmProvider};
use dermai_report::{ReportGenerator, ReportInput};

use crate::cli::{ChatArgs, CliArgs, Command, PredictArgs, ReportArgs};
use crate::commands::ChatCommand;
use crate::config::CliConfig;
use crate::terminal::{Input, Terminal};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let terminal = Terminal::new();

    dermai_core::config::load_dotenv();
    let mut config = Config::from_env();
    let cli_config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    cli_config.apply(&mut config);

    match args.command {
        Command::Predict(predict) => run_predict(&terminal, config, predict).await,
        Command::Report(report) => run_report(&terminal, &config, report).await,
        Command::Chat(chat) => run_chat(&terminal, config, &cli_config, chat).await,
    }
}

async fn run_predict(terminal: &Terminal, mut config: Config, args: PredictArgs) -> Result<()> {
    if let Some(url) = args.backend {
        config.classifier.base_url = url;
    }
    let classifier = HttpClassifier::from_config(&config.classifier)
        .context("failed to create classification client")?;
    info!(url = %classifier.predict_url(), "Using classification backend");

    let features = PageFeatures {
        chat: false,
        report: args.report,
    };
    let page = PredictionPage::new(Arc::new(classifier), features);
    page.select_image(&args.image)
        .await
        .with_context(|| format!("cannot use {}", args.image.display()))?;
    page.set_patient(args.patient.into_patient()).await;

    let spinner = terminal.start_spinner("Analyzing image...")?;
    let outcome = page.submit().await;
    spinner.stop();
    let result = outcome?.context("classification response was discarded")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        terminal.print_result(&ResultView::from(&result))?;
    }

    if args.report {
        let spinner = terminal.start_spinner("Generating PDF...")?;
        let outcome = page.download_report().await;
        spinner.stop();
        let report = outcome?;
        let dir = args.out_dir.unwrap_or(config.report.output_dir);
        let path = report.save_to(&dir)?;
        terminal.print_info(&format!("Report saved to {}", path.display()))?;
    }
    Ok(())
}

async fn run_report(terminal: &Terminal, config: &Config, args: ReportArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.result)
        .with_context(|| format!("failed to read result: {}", args.result.display()))?;
    let result: ClassificationResult = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse result: {}", args.result.display()))?;
    let image = std::fs::read(&args.image)
        .with_context(|| format!("failed to read image: {}", args.image.display()))?;

    let input = ReportInput {
        result,
        patient: args.patient.into_patient(),
        image,
    };
    let report = tokio::task::spawn_blocking(move || ReportGenerator::default().generate(&input))
        .await?
        .map_err(AppError::from)?;

    let dir = args.out_dir.unwrap_or_else(|| config.report.output_dir.clone());
    let path = report.save_to(&dir)?;
    terminal.print_info(&format!(
        "Report saved to {} ({} page{})",
        path.display(),
        report.page_count,
        if report.page_count == 1 { "" } else { "s" }
    ))?;
    Ok(())
}

async fn run_chat(
    terminal: &Terminal,
    mut config: Config,
    cli_config: &CliConfig,
    args: ChatArgs,
) -> Result<()> {
    if let Some(provider) = args.provider {
        config.assistant.provider = provider;
    }
    let provider =
        create_provider(&config.assistant).context("failed to create assistant provider")?;
    let provider: Arc<dyn LlmProvider> = Arc::from(provider);

    let assistant = match args.system_prompt.or_else(|| cli_config.system_prompt.clone()) {
        Some(prompt) => Assistant::new(provider, prompt, GenerationConfig::default()),
        None => Assistant::chatbot(provider),
    };
    let page = ChatPage::new(assistant);

    terminal.print_banner(page.assistant().provider_name())?;
    respond(terminal, page.initialize()).await?;

    loop {
        let text = match terminal.read_input()? {
            Input::Exit => break,
            Input::Empty => continue,
            Input::Text(text) => text,
        };
        match ChatCommand::parse(&text) {
            ChatCommand::Action(action) => respond(terminal, page.quick_action(action)).await?,
            ChatCommand::Questions => {
                let questions: Vec<String> =
                    page.suggested_questions().iter().map(|q| q.to_string()).collect();
                terminal.print_list("Suggested questions", &questions)?;
            }
            ChatCommand::Conditions => {
                let conditions: Vec<String> = page
                    .skin_conditions()
                    .iter()
                    .map(|c| format!("{} - {}", c.name, c.description))
                    .collect();
                terminal.print_list("Common skin conditions", &conditions)?;
            }
            ChatCommand::Ask(name) => respond(terminal, page.ask_about(&name)).await?,
            ChatCommand::Message(message) => respond(terminal, page.send(&message)).await?,
        }
    }

    page.dispose();
    Ok(())
}

/// Run one chat turn behind a spinner and print its outcome. Chat failures are
/// shown and the session continues.
async fn respond(
    terminal: &Terminal,
    turn: impl Future<Output = Result<Option<String>, AppError>>,
) -> Result<()> {
    let spinner = terminal.start_spinner("Thinking...")?;
    let outcome = turn.await;
    spinner.stop();
    match outcome {
        Ok(Some(reply)) => terminal.print_reply(&reply),
        Ok(None) => Ok(()),
        Err(e) => terminal.print_error(&e.to_string()),
    }
}
