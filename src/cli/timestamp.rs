//! Timestamp CLI subcommands.
//!
//! Provides commands to:
//! - `parse`: Read a signature timestamp back into an instant
//! - `render`: Print an instant the way the site signs comments
//! - `scan`: List every signature timestamp on a page

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;

use super::{engine, print_json, read_input};

/// Timestamp-related subcommands
#[derive(Subcommand, Debug)]
pub enum TimestampCommands {
    /// Parse a signature timestamp
    Parse {
        /// Timestamp text, e.g. "12:30, 31 Dec 2025 (UTC)"
        text: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render an instant as a signature timestamp
    Render {
        /// RFC 3339 instant (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },

    /// List every signature timestamp in a page
    Scan {
        /// Page file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Execute timestamp subcommands
pub async fn execute(command: TimestampCommands) -> Result<()> {
    match command {
        TimestampCommands::Parse { text, json } => execute_parse(&text, json).await,
        TimestampCommands::Render { at } => execute_render(at.as_deref()).await,
        TimestampCommands::Scan { input, json } => execute_scan(input, json).await,
    }
}

async fn execute_parse(text: &str, json: bool) -> Result<()> {
    let format = engine()?.format().context("Failed to compile site date format")?;

    let Some(parsed) = format.parse(text) else {
        anyhow::bail!("Not a valid timestamp for format '{}': {}", format.format(), text);
    };

    if json {
        return print_json(&parsed);
    }

    println!("{}", parsed.instant.to_rfc3339());
    if let Some(warning) = parsed.warning {
        eprintln!("warning: {:?}", warning);
    }
    Ok(())
}

async fn execute_render(at: Option<&str>) -> Result<()> {
    let instant = match at {
        Some(at) => DateTime::parse_from_rfc3339(at)
            .with_context(|| format!("Invalid RFC 3339 instant: {}", at))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let rendered = engine()?
        .signature_timestamp(instant)
        .context("Failed to render signature timestamp")?;
    println!("{}", rendered);
    Ok(())
}

async fn execute_scan(input: Option<PathBuf>, json: bool) -> Result<()> {
    let page = read_input(input.as_ref()).await?;
    let format = engine()?.format().context("Failed to compile site date format")?;
    let found = format.find_all(&page);

    if json {
        return print_json(&found);
    }

    if found.is_empty() {
        println!("No signature timestamps found");
        return Ok(());
    }

    println!("{:<16} {:<28} {}", "RANGE", "TEXT", "INSTANT");
    println!("{}", "-".repeat(75));
    for m in &found {
        let instant = m
            .parsed
            .as_ref()
            .map(|p| p.instant.to_rfc3339())
            .unwrap_or_else(|| "(invalid date)".to_string());
        println!(
            "{:<16} {:<28} {}",
            format!("{}..{}", m.range.0, m.range.1),
            m.text,
            instant
        );
    }
    println!("\nTotal: {} timestamp(s)", found.len());
    Ok(())
}
