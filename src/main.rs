//! GitHub JSON cache CLI
//!
//! Drives the cache and summary handlers from the command line.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::env;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use github_json_cache::handlers::{
    CacheHandlers, CorsPolicy, HandlerRequest, HandlerResponse, Method, SummaryHandler,
};
use github_json_cache::summary::SummaryClient;
use github_json_cache::{CacheConfig, CacheStore, SummaryConfig};

/// CLI command
#[derive(Debug)]
enum Command {
    /// Print the cached document
    Get,
    /// Replace the cached document
    Set { document: Value },
    /// Insert or replace one key
    Update { key: String, value: Value },
    /// Empty the cache
    Clear,
    /// Summarize an article through the proxy
    Summarize { title: String, content: String },
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"github-json-cache - JSON cache stored in a GitHub repository

USAGE:
    github-json-cache get
    github-json-cache set <json-object>
    github-json-cache update <key> <json-value>
    github-json-cache clear
    github-json-cache summarize <title> <content>
    github-json-cache help

EXAMPLES:
    github-json-cache update views 42
    github-json-cache update post/hello '{{"summary": "..."}}'
    github-json-cache set '{{}}'

ENVIRONMENT:
    GITHUB_OWNER            Repository owner (required)
    GITHUB_REPO             Repository name (required)
    GITHUB_CACHE_PATH       Cache file path (default: data/cache.json)
    GITHUB_BRANCH           Branch (default: main)
    GITHUB_TOKEN            Token, required for writes
    GITHUB_CACHE_MAX_AGE    Days before the cache expires (default: 7)
    SPARK_APPID, SPARK_API_KEY, SPARK_API_SECRET
                            Summary API credentials
    RUST_LOG                Log level (trace, debug, info, warn, error)

A .env file in the working directory is loaded first when present.
"#
    );
}

/// Parse a CLI argument as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "get" => Ok(Command::Get),
        "set" => {
            let raw = args
                .get(2)
                .ok_or_else(|| anyhow!("Usage: github-json-cache set <json-object>"))?;
            let document: Value =
                serde_json::from_str(raw).context("set expects a JSON object")?;
            if !document.is_object() {
                return Err(anyhow!("set expects a JSON object"));
            }
            Ok(Command::Set { document })
        }
        "update" => {
            if args.len() < 4 {
                return Err(anyhow!("Usage: github-json-cache update <key> <json-value>"));
            }
            Ok(Command::Update {
                key: args[2].clone(),
                value: parse_value(&args[3]),
            })
        }
        "clear" => Ok(Command::Clear),
        "summarize" => {
            if args.len() < 4 {
                return Err(anyhow!("Usage: github-json-cache summarize <title> <content>"));
            }
            Ok(Command::Summarize {
                title: args[2].clone(),
                content: args[3].clone(),
            })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

fn cache_handlers() -> Result<CacheHandlers> {
    let config = CacheConfig::from_env().context("Invalid cache configuration")?;
    info!(
        owner = %config.owner,
        repo = %config.repo,
        path = %config.path,
        branch = %config.branch,
        "Using GitHub cache"
    );
    let cors = CorsPolicy::allow_list(config.allowed_origins.clone());
    let store = CacheStore::new(&config).context("Failed to create GitHub client")?;
    Ok(CacheHandlers::new(store, cors))
}

/// Print the response body and turn error statuses into a failure
fn report(response: HandlerResponse) -> Result<()> {
    if let Some(body) = &response.body {
        println!("{}", serde_json::to_string_pretty(body)?);
    }
    if response.is_success() {
        Ok(())
    } else {
        Err(anyhow!("Request failed with status {}", response.status))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "Failed to load .env file");
        }
    }

    // Parse command
    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            print_help();
            std::process::exit(1);
        }
    };

    match command {
        Command::Get => {
            let handlers = cache_handlers()?;
            report(handlers.get_cache(&HandlerRequest::new(Method::Get)).await)
        }
        Command::Set { document } => {
            let handlers = cache_handlers()?;
            let request = HandlerRequest::new(Method::Post)
                .with_body(serde_json::json!({ "data": document }));
            report(handlers.set_cache(&request).await)
        }
        Command::Update { key, value } => {
            let handlers = cache_handlers()?;
            let request = HandlerRequest::new(Method::Post)
                .with_body(serde_json::json!({ "key": key, "value": value }));
            report(handlers.update_cache(&request).await)
        }
        Command::Clear => {
            let handlers = cache_handlers()?;
            handlers.store().clear().await?;
            info!("Cache cleared");
            Ok(())
        }
        Command::Summarize { title, content } => {
            let client = SummaryClient::new(SummaryConfig::from_env())?;
            let request = HandlerRequest::new(Method::Post)
                .with_body(serde_json::json!({ "title": title, "content": content }));
            report(SummaryHandler::new(client).summarize(&request).await)
        }
        Command::Help => {
            print_help();
            Ok(())
        }
    }
}
