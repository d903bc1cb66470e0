//! faceid - face enrollment and verification server and CLI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faceid_extract::ProcessExtractor;
use faceid_identity::EncodingStore;
use faceid_service::{EnrollImageRequest, FaceService, ServiceConfig};
use faceid_storage::RedbRepository;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod response;
mod server;

use config::Config;
use response::{UserView, enroll_response, verify_response};

/// faceid - enroll faces and recognize them later.
///
/// Each identity is a name, an email, an external user id and one face
/// encoding. A face can be enrolled only once.
///
/// Configuration is read from ~/.faceid/config.yaml when present.
#[derive(Parser)]
#[command(name = "faceid")]
#[command(about = "Face enrollment and verification")]
#[command(version)]
struct Cli {
    /// Config file (default is ~/.faceid/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Listen address (e.g. :3000), overrides the config
        #[arg(long)]
        addr: Option<String>,
    },
    /// Enroll one face image
    Enroll {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        user_id: String,
    },
    /// Verify one face image against enrolled identities
    Verify {
        #[arg(long)]
        image: PathBuf,
    },
    /// List enrolled identities
    List,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { addr } => {
            let service = Arc::new(build_service(&config)?);
            let addr = addr.unwrap_or_else(|| config.listen.clone());
            server::serve(&addr, service, config.cors_origin.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Enroll {
            image,
            name,
            email,
            user_id,
        } => {
            let service = build_service(&config)?;
            let image = read_image(&image).await?;
            let outcome = service
                .enroll(EnrollImageRequest {
                    image,
                    name,
                    email,
                    external_user_id: user_id,
                })
                .await;
            let (_, body) = enroll_response(&outcome);
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(exit_code(outcome.is_enrolled()))
        }
        Commands::Verify { image } => {
            let service = build_service(&config)?;
            let image = read_image(&image).await?;
            let outcome = service.verify(&image).await;
            let (_, body) = verify_response(&outcome);
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(exit_code(outcome.is_verified()))
        }
        Commands::List => {
            let store = open_store(&config)?;
            let records = store.snapshot();
            let users: Vec<UserView<'_>> = records
                .iter()
                .map(|record| UserView::from(record.as_ref()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&users)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_store(config: &Config) -> Result<EncodingStore> {
    let Some(path) = config.store_file() else {
        info!(dimension = config.dimension, "using in-memory store");
        return Ok(EncodingStore::in_memory(config.dimension)?);
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let repo = RedbRepository::open(&path)
        .with_context(|| format!("failed to open store {}", path.display()))?;
    let store = EncodingStore::open(config.dimension, Box::new(repo))
        .with_context(|| format!("failed to load store {}", path.display()))?;
    info!(path = %path.display(), identities = store.len(), "store opened");
    Ok(store)
}

fn build_service(config: &Config) -> Result<FaceService> {
    let store = Arc::new(open_store(config)?);
    let extractor = ProcessExtractor::new(config.extractor.program.clone())
        .with_args(config.extractor.args.iter().cloned());
    info!(program = extractor.program(), "using process extractor");
    Ok(FaceService::new(
        store,
        Arc::new(extractor),
        ServiceConfig {
            threshold: config.threshold,
            extraction_timeout: config.extraction_timeout(),
        },
    ))
}

async fn read_image(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
