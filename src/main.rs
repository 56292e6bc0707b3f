use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use report_qa::api::{create_router, AppState};
use report_qa::application::IngestOutcome;
use report_qa::domain::AnswerResult;
use report_qa::infrastructure::{init_tracing, AppConfig};
use report_qa::Pipeline;

#[derive(Parser)]
#[command(name = "report-qa")]
#[command(about = "Ask questions about an annual report PDF", long_about = None)]
#[command(version, args_conflicts_with_subcommands = true)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "REPORT_QA_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Ask a single question and exit instead of starting the server
    #[arg(trailing_var_arg = true)]
    question: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Build the index from the PDF, or reuse the existing one
    Ingest {
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// Rebuild even if an index already exists
        #[arg(long)]
        force: bool,
    },
    /// Answer one question from the command line
    Ask {
        #[arg(long)]
        pdf: Option<PathBuf>,
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Show the persisted index and credential status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    let command = match cli.command {
        Some(command) => command,
        None if cli.question.is_empty() => Command::Serve,
        None => Command::Ask {
            pdf: None,
            question: cli.question,
        },
    };

    match command {
        Command::Serve => serve(Pipeline::from_config(config)?).await,
        Command::Ingest { pdf, force } => {
            if let Some(pdf) = pdf {
                config.config.document.pdf_path = pdf;
            }
            ingest(&Pipeline::from_config(config)?, force).await
        }
        Command::Ask { pdf, question } => {
            if let Some(pdf) = pdf {
                config.config.document.pdf_path = pdf;
            }
            ask(&Pipeline::from_config(config)?, &question.join(" ")).await
        }
        Command::Status => status(&Pipeline::from_config(config)?).await,
    }
}

async fn serve(pipeline: Pipeline) -> anyhow::Result<()> {
    let server = pipeline.config.config.server.clone();

    if let Err(e) = pipeline.llm.check_credentials() {
        warn!(error = %e, "questions will be refused until the credential is set");
    }

    match pipeline.ingest.manifest().await {
        Ok(Some(_)) => match pipeline.ingest.load_index().await {
            Ok(report) => info!(chunks = report.manifest.chunk_count, "existing index loaded"),
            Err(e) => warn!(error = %e, "existing index could not be loaded"),
        },
        Ok(None) => info!("no index yet; upload a PDF or run `report-qa ingest`"),
        Err(e) => warn!(error = %e, "existing index could not be read"),
    }

    let state = AppState::new(pipeline);
    let app = create_router(state);

    let addr = SocketAddr::new(server.host.parse()?, server.port);
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ingest(pipeline: &Pipeline, force: bool) -> anyhow::Result<()> {
    let report = pipeline
        .ingest
        .build_index(pipeline.pdf_path(), force)
        .await?;

    let m = &report.manifest;
    match report.outcome {
        IngestOutcome::Built => println!(
            "Built index {} from {}: {} pages, {} chunks",
            m.index_id, m.source_path, m.page_count, m.chunk_count
        ),
        IngestOutcome::Loaded => println!(
            "Index {} already exists ({} chunks, built {}). Use --force to rebuild.",
            m.index_id, m.chunk_count, m.built_at
        ),
    }
    Ok(())
}

async fn ask(pipeline: &Pipeline, question: &str) -> anyhow::Result<()> {
    pipeline.llm.check_credentials()?;
    pipeline
        .ingest
        .build_index(pipeline.pdf_path(), false)
        .await?;

    let result = pipeline.qa.answer(question).await?;
    print_answer(&result);
    Ok(())
}

async fn status(pipeline: &Pipeline) -> anyhow::Result<()> {
    match pipeline.ingest.manifest().await? {
        Some(manifest) => println!("{}", serde_json::to_string_pretty(&manifest)?),
        None => println!(
            "No index at {}",
            pipeline.config.config.index.dir.display()
        ),
    }

    match pipeline.llm.check_credentials() {
        Ok(()) => println!("LLM credential: configured"),
        Err(e) => println!("LLM credential: {e}"),
    }
    Ok(())
}

fn print_answer(result: &AnswerResult) {
    println!("Answer:\n{}\n", result.answer);
    println!("Sources ({}):", result.num_sources);
    for (i, source) in result.sources.iter().enumerate() {
        println!("  [{}] page {}: {}", i + 1, source.page, source.content);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
