mod apply;
mod bookmark_file;
mod cli;
mod commands;
mod extract;
mod interact;
mod mcp;
mod page_range;
mod pdf;
mod templates;

use anyhow::Result;
use apply::{ApplyOptions, PageOffset};
use clap::Parser;
use cli::{Cli, Commands};
use interact::{Preset, Terminal};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Apply {
            path,
            bookmarks,
            offset,
            yes,
            fallback_output,
        } => {
            let options = ApplyOptions {
                offset: PageOffset::from_entered(offset),
            };
            let mut terminal = Terminal {
                preset: Preset {
                    allow_partial: yes,
                    destination: fallback_output,
                },
            };
            commands::apply::run(&path, &bookmarks, &options, &mut terminal)?;
        }
        Commands::Extract {
            path,
            pages,
            output,
        } => {
            commands::extract::run(&path, &pages, output.as_deref())?;
        }
        Commands::View { path, output } => {
            if !commands::view::run(&path, output.as_deref())? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Prompt => commands::prompt::run(),
        Commands::Template { output } => {
            commands::template::run(output.as_deref())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so stdout stays free for command output and the MCP
/// transport.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "pdfmarks=info",
        _ => "pdfmarks=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
