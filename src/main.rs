//! workflow-sentinel CLI
//!
//! Verifies a repository's PR automation workflow end-to-end and exits 0
//! only when every check passes.

use std::path::{Path, PathBuf};

use workflow_sentinel::{
    Credentials, GitHubClient, Validate, Verifier, VerifierConfig,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: {} [config.toml]", args[0]);
        println!("\nVerifies a PR automation workflow end-to-end.");
        println!("\nWithout a config file, the built-in reference configuration is used.");
        println!("\nCredentials:");
        println!("  GITHUB_TOKEN  API token (or set it in the configured env file)");
        println!("  GITHUB_ORG    Repository owner when the config omits one");
        return;
    }

    // 1. Configuration (fatal on error, before any remote call).
    let config_path = args.get(1).map(PathBuf::from);
    let mut config = match &config_path {
        Some(path) => match VerifierConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => VerifierConfig::default(),
    };

    // 2. Credentials (the only other fatal error class).
    let credentials = match Credentials::load(Path::new(&config.env_file)) {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Failed to load credentials: {}", e);
            std::process::exit(1);
        }
    };
    config.resolve_owner(credentials.org());

    match config.validate().into_result() {
        Ok(warnings) => {
            for warning in warnings {
                tracing::warn!(%warning, "configuration warning");
            }
        }
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    }

    tracing::info!(repo = %config.repository, workflow = %config.workflow.file_name,
        "configuration loaded");

    // 3. Client and verification run.
    let client = match GitHubClient::new(&config.repository, credentials) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to construct API client: {}", e);
            std::process::exit(1);
        }
    };

    let summary = Verifier::new(client, config).run().await;

    println!("\n{}", summary.render());

    if !summary.passed {
        std::process::exit(1);
    }
}
