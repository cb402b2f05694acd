mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use filestream_core::config::{Config, UpstreamBackend};
use filestream_core::ObjectId;
use filestream_db::models::NewFile;
use filestream_db::pool::{get_conn, init_pool, DbPool};
use filestream_db::queries::files;
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path);

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting filestream server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    filestream_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "filestream=trace,filestream_server=trace,filestream_upstream=trace,filestream_db=debug,tower_http=debug".to_string()
        } else {
            "filestream=info,filestream_server=info,filestream_upstream=info,filestream_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::AddFile {
            message_id,
            id,
            title,
            file_name,
            file_size,
            mime_type,
            poster,
            genres,
            quality,
            drive_id,
        } => {
            let id = id.map(|s| s.parse::<ObjectId>()).transpose()?;
            let new = NewFile {
                id,
                message_id,
                anime_title: title,
                file_name,
                file_size,
                mime_type,
                poster,
                genres: (!genres.is_empty()).then_some(genres),
                quality,
                drive_id,
            };
            add_file(new, cli.config.as_deref())
        }
        Commands::List => list(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("filestream {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Open the lookup database named by the config, creating its directory.
fn open_db(config: &Config) -> Result<DbPool> {
    let db_path = &config.server.db_path;
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(init_pool(&db_path.to_string_lossy())?)
}

fn add_file(new: NewFile, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let pool = open_db(&config)?;
    let conn = get_conn(&pool)?;

    let message_id = new.message_id;
    let record = files::insert_file(&conn, new)?;

    let base = config.server.public_url.trim().trim_matches('/');
    println!("Added {} (message {message_id})", record.id);
    println!("  Stream:   {base}/watch/{}", record.id);
    println!("  Download: {base}/dl/{}", record.id);
    Ok(())
}

fn list(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let pool = open_db(&config)?;
    let records = files::list_files(&*get_conn(&pool)?)?;

    if records.is_empty() {
        println!("No files registered");
        return Ok(());
    }

    let base = config.server.public_url.trim().trim_matches('/');
    for record in records {
        let message = record
            .message_id
            .map_or_else(|| "-".to_string(), |m| m.to_string());
        println!(
            "{}  message={message}  {}",
            record.id,
            record.anime_title.as_deref().unwrap_or("Unknown")
        );
        println!("    {base}/watch/{}", record.id);
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = Config::load(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Public URL: {}", config.server.public_url);
    println!("  Database: {}", config.server.db_path.display());
    match &config.upstream.backend {
        UpstreamBackend::Http(http) => {
            println!("  Upstream: http {} (channel {})", http.base_url, http.channel)
        }
        UpstreamBackend::Local { root } => {
            println!("  Upstream: local {}", root.display())
        }
    }
    println!(
        "  Chunk size: {} bytes",
        config.upstream.effective_chunk_size()
    );
    println!(
        "  Metadata timeout: {}s",
        config.upstream.metadata_timeout_secs
    );

    for warning in config.validate() {
        println!("  ⚠ {warning}");
    }

    Ok(())
}
