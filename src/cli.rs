use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "filestream")]
#[command(author, version, about = "Range-aware media streaming gateway")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the streaming server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Register an upstream message under a public object ID
    AddFile {
        /// Upstream message holding the media
        #[arg(required = true)]
        message_id: i64,

        /// Object ID to use (generated if omitted)
        #[arg(long)]
        id: Option<String>,

        /// Display title
        #[arg(long)]
        title: Option<String>,

        /// Stored file name, used when the upstream lookup fails
        #[arg(long)]
        file_name: Option<String>,

        /// Stored size in bytes
        #[arg(long)]
        file_size: Option<i64>,

        /// Stored MIME type
        #[arg(long)]
        mime_type: Option<String>,

        /// Poster image URL
        #[arg(long)]
        poster: Option<String>,

        /// Genre tag (repeatable)
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Quality label, e.g. 1080p
        #[arg(long)]
        quality: Option<String>,

        /// Google Drive file ID for the mirror link
        #[arg(long)]
        drive_id: Option<String>,
    },

    /// List registered files, newest first
    List,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
