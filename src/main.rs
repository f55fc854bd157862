use medibot::agent::{MedicalAgent, Reflection};
use medibot::api;
use medibot::config::AppConfig;
use medibot::database::VectorDB;
use medibot::document::{ingest_path, TextChunker};
use medibot::llm::SemanticSearch;
use medibot::providers::build_providers;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::net::TcpListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Ask questions from the terminal instead of serving HTTP
    #[arg(long)]
    cli: bool,

    /// Index the documents under this path and exit
    #[arg(long, value_name = "PATH")]
    ingest: Option<PathBuf>,

    #[arg(long, default_value = "500")]
    chunk_size: usize,

    #[arg(long, default_value = "20")]
    chunk_overlap: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("{}", e);
        e
    })?;

    let (model, embedder) = build_providers(&config)?;
    let vector_db = VectorDB::new(&config.qdrant_url, &config.qdrant_api_key, config.call_timeout)?;
    if let Err(e) = vector_db.health_check().await {
        log::warn!("Qdrant is not reachable yet: {}", e);
    }
    let search = Arc::new(SemanticSearch::new(vector_db, config.collection.clone(), embedder));

    if let Some(path) = &args.ingest {
        let chunker = TextChunker::new(args.chunk_size, args.chunk_overlap);
        let report = ingest_path(path, &chunker, search.as_ref()).await?;
        log::info!(
            "Indexed {} chunks from {} documents into '{}'",
            report.chunks,
            report.documents,
            search.collection_name()
        );
        return Ok(());
    }

    log::info!("Using {} model {}", config.backend.name(), model.model_name());
    let agent = Arc::new(MedicalAgent::new(search, model).with_top_k(config.top_k));

    if args.cli {
        run_cli_mode(agent).await
    } else {
        run_api_server(&args, &config, agent).await
    }
}

async fn run_cli_mode(agent: Arc<MedicalAgent>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("{}", "Medibot ready. Ask a medical question (Ctrl-D to quit).".green());

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("👤 ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match agent.invoke(input).await {
                    Ok(state) => {
                        println!("{} {}", "🤖".bold(), state.answer().unwrap_or_default());
                        match state.reflection() {
                            Some(Reflection::Verdict(text)) => println!("{} {}", "🧠 Reflection:".dimmed(), text.dimmed()),
                            _ => println!("{}", "🧠 Reflection unavailable.".dimmed()),
                        }
                    }
                    Err(e) => println!("{}", format!("Error: {}", e).red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

async fn run_api_server(
    args: &Args,
    config: &AppConfig,
    agent: Arc<MedicalAgent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let app = api::create_api(agent, config.request_deadline, config.max_concurrent_requests);

    let listener = TcpListener::bind(&addr).await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
