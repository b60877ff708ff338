//! CLI command implementations

use std::net::SocketAddr;

use anyhow::Context;
use clap::Subcommand;
use medley_core::MedleyConfig;
use medley_core::tracing_setup::{CliLogLevel, init_tracing};
use medley_search::{MAX_PER_PAGE, MediaSearchService, MediaType, SearchQuery};
use medley_web::run_server;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to
        #[arg(short, long, default_value = "4000")]
        port: u16,
        /// Console log level
        #[arg(long, value_enum, default_value_t = CliLogLevel::Info)]
        log_level: CliLogLevel,
    },
    /// Run one search against all configured providers
    Search {
        /// Search text
        query: String,
        /// Media type filter (all, image, video, audio, gif)
        #[arg(long, default_value = "all")]
        media_type: String,
        /// Result page, 1-based
        #[arg(long, default_value = "1")]
        page: u32,
        /// Items requested per provider
        #[arg(long, default_value = "20")]
        per_page: u32,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve {
            host,
            port,
            log_level,
        } => serve(host, port, log_level).await,
        Commands::Search {
            query,
            media_type,
            page,
            per_page,
            json,
        } => search(query, media_type, page, per_page, json).await,
    }
}

/// Start the API server and block until it stops
///
/// # Errors
/// - Logging setup failed or the bind address is invalid
/// - The server could not bind or crashed while serving
async fn serve(host: String, port: u16, log_level: CliLogLevel) -> anyhow::Result<()> {
    init_tracing(log_level.as_tracing_level(), None).context("failed to initialize logging")?;

    let mut config = MedleyConfig::from_env();
    config.server.bind_address = format!("{host}:{port}")
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;

    let configured = config.providers.configured();

    println!("Starting Medley API server...");
    println!("URL: http://{host}:{port}");
    println!("API: http://{host}:{port}/api/search");
    if configured.is_empty() {
        eprintln!("Warning: no provider API keys configured, searches will return empty results");
    } else {
        println!("Providers: {}", configured.join(", "));
    }
    println!();
    println!("Press Ctrl+C to stop the server");

    run_server(config).await?;

    Ok(())
}

/// Run a single aggregated search and print the results
///
/// # Errors
/// - The response could not be serialized for `--json` output
async fn search(
    query: String,
    media_type: String,
    page: u32,
    per_page: u32,
    json: bool,
) -> anyhow::Result<()> {
    let config = MedleyConfig::from_env();
    let service = MediaSearchService::from_config(&config);

    let query = build_cli_query(&query, &media_type, page, per_page);
    let response = service.search_all(&query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Results for '{}'", query.text);
    println!("{:-<60}", "");

    for source in &response.sources {
        match &source.error {
            Some(error) => println!("{}: failed ({error})", source.source.name()),
            None => println!("{}: {} items", source.source.name(), source.count),
        }
    }

    println!();
    if response.items.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for item in &response.items {
        println!("[{}] {}", item.source.name(), item.title);
        println!("    {}", item.source_url);
    }
    println!();
    println!(
        "{} of {} total results shown",
        response.items.len(),
        response.total_results
    );

    Ok(())
}

/// Normalize CLI arguments into a search query
fn build_cli_query(text: &str, media_type: &str, page: u32, per_page: u32) -> SearchQuery {
    let mut query = SearchQuery::new(text.trim());
    query.media_type = MediaType::parse_param(media_type);
    query.page = page.max(1);
    query.per_page = per_page.clamp(1, MAX_PER_PAGE);
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cli_query_normalizes_arguments() {
        let query = build_cli_query("  northern lights  ", "video", 0, 500);

        assert_eq!(query.text, "northern lights");
        assert_eq!(query.media_type, MediaType::Video);
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_build_cli_query_unknown_type_searches_all() {
        let query = build_cli_query("x", "vector", 1, 20);

        assert_eq!(query.media_type, MediaType::All);
    }
}
