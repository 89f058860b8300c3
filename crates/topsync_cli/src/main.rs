//! topsync CLI
//!
//! Command-line tools for topsync live documents.
//!
//! # Commands
//!
//! - `connect` - Run a headless session against a server
//! - `decode` - Decode inbound messages from stdin
//! - `encode` - Encode an outbound action

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// topsync command-line tools.
#[derive(Parser)]
#[command(name = "topsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless session; reads `update <id> <value>` and `press <id>` lines from stdin
    Connect {
        /// URL of the page the endpoint is derived from (http, https, ws or wss)
        page_url: String,

        /// Connect to this path instead of the page's own path
        #[arg(long)]
        fixed_path: Option<String>,

        /// Fixed retry delay in milliseconds
        #[arg(long, default_value = "1000", conflicts_with = "no_retry")]
        retry_ms: u64,

        /// Never reconnect after a loss
        #[arg(long)]
        no_retry: bool,

        /// Mirror field status as classes instead of attributes
        #[arg(long)]
        class_markers: bool,

        /// Replace the addressed node itself instead of its children
        #[arg(long)]
        outer_replace: bool,

        /// Id of the root container replaced by `newContent`
        #[arg(long, default_value = topsync_client::DEFAULT_ROOT_ID)]
        root_id: String,

        /// Print the document after each inbound message
        #[arg(long)]
        print: bool,
    },

    /// Decode inbound messages, one per stdin line
    Decode {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Encode an outbound action
    Encode {
        #[command(subcommand)]
        action: commands::encode::EncodeAction,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Connect {
            page_url,
            fixed_path,
            retry_ms,
            no_retry,
            class_markers,
            outer_replace,
            root_id,
            print,
        } => {
            let options = commands::connect::ConnectOptions {
                fixed_path,
                retry_ms: (!no_retry).then_some(retry_ms),
                class_markers,
                outer_replace,
                root_id,
                print,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::connect::run(&page_url, options))?;
        }
        Commands::Decode { format } => {
            commands::decode::run(&format)?;
        }
        Commands::Encode { action } => {
            commands::encode::run(action)?;
        }
        Commands::Version => {
            println!("topsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
