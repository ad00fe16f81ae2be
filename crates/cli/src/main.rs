//! linker entry point.
//!
//! Boots a [`Session`] from layered configuration and runs the interactive
//! command loop on stdin. Logging goes to stderr so it never mixes with
//! command output.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use linker_client::Session;
use linker_core::AppConfig;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod commands;
mod repl;

#[derive(Parser, Debug)]
#[command(name = "linker", about = "Audit page links against the DSM migration mapping")]
struct Args {
    /// Start with this page as the current URL
    #[arg(long)]
    url: Option<String>,

    /// CSS selector for the content region
    #[arg(long)]
    selector: Option<String>,

    /// Also extract the sidebar region
    #[arg(long, default_value_t = false)]
    include_sidebar: bool,

    /// DSM workbook to load instead of the newest dsm-MMDD.xlsx
    #[arg(long)]
    dsm: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn init_tracing(debug: bool, json: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug, args.json);

    let mut config = AppConfig::load()?;
    if let Some(selector) = args.selector {
        config.selector = selector;
    }
    if args.include_sidebar {
        config.include_sidebar = true;
    }
    if let Some(dsm) = args.dsm {
        config.dsm_file = Some(dsm);
    }

    let mut session = Session::from_config(config).await?;
    if let Some(url) = args.url {
        session.set_url(&url)?;
    }

    tracing::info!("starting linker session");
    println!("linker: type `help` for commands");

    repl::run(&mut session, BufReader::new(tokio::io::stdin())).await?;

    Ok(())
}
