use anyhow::Context;
use clap::{Parser, Subcommand};
use ezsolver::answers::{self, AnswerOptions};
use ezsolver::config;
use ezsolver::engine::WolframClient;
use ezsolver::normalize::{self, Triggers};
use ezsolver::ocr::{self, TextRecognizer, VisionClient};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ezsolver")]
#[command(about = "EZSolver: chat bot answering questions through a computational knowledge engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: EZSOLVER_CONFIG_PATH or ~/.ezsolver/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the webhook gateway.
    Serve {
        /// Config file path (default: EZSOLVER_CONFIG_PATH or ~/.ezsolver/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from PORT env, config, or 7500)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one query to the engine and print the answer cards.
    Ask {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Query text; the trigger word is stripped like in chat.
        query: Vec<String>,
    },

    /// Recognize the text in an image file and print the resulting query.
    Ocr {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Image file (JPEG or PNG).
        image: PathBuf,

        /// Also send the recognized query to the engine.
        #[arg(long)]
        solve: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Some(Commands::Serve { .. }) => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Some(Commands::Version) => {
            println!("ezsolver {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask { config, query }) => {
            if let Err(e) = run_ask(config, &query.join(" ")).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ocr {
            config,
            image,
            solve,
        }) => {
            if let Err(e) = run_ocr(config, image, solve).await {
                log::error!("ocr failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let dir = ezsolver::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (config, path) = config::load_config(config_path)?;
    log::debug!("loaded config from {}", path.display());
    ezsolver::gateway::run_gateway(config, port).await
}

async fn run_ask(config_path: Option<PathBuf>, raw_query: &str) -> anyhow::Result<()> {
    let (config, _) = config::load_config(config_path)?;
    let triggers = Triggers::from_config(&config.answers);
    let query = normalize::normalize(raw_query, &triggers);
    solve_and_print(&config, &query).await
}

async fn run_ocr(config_path: Option<PathBuf>, image: PathBuf, solve: bool) -> anyhow::Result<()> {
    let (config, _) = config::load_config(config_path)?;
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("reading {}", image.display()))?;
    let vision = VisionClient::new(
        config.vision.base_url.clone(),
        config::resolve_vision_key(&config),
    );
    let text = vision.recognize(&bytes).await?;
    let triggers = Triggers::from_config(&config.answers);
    let query = normalize::normalize(&ocr::flatten_lines(&text), &triggers);
    println!("{}", query);
    if solve {
        solve_and_print(&config, &query).await?;
    }
    Ok(())
}

async fn solve_and_print(config: &config::Config, query: &str) -> anyhow::Result<()> {
    let engine = WolframClient::new(
        config.engine.base_url.clone(),
        config::resolve_engine_app_id(config),
    );
    let pods = engine.query_pods(query).await?;
    let options = AnswerOptions {
        max_text_length: config.answers.max_text_length,
        image_proxy: config::resolve_image_proxy_url(config),
    };
    let selection = answers::select(&pods, &options);
    if !selection.had_any_result {
        println!("no result for {:?}", query);
        return Ok(());
    }
    for (i, card) in selection.cards.iter().enumerate() {
        println!("[{}] {}", i + 1, card.title);
        for line in card.text.lines() {
            println!("    {}", line);
        }
        if let Some(ref url) = card.thumbnail_url {
            println!("    thumbnail: {}", url);
        }
    }
    Ok(())
}
