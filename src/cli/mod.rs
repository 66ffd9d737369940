//! Command-line interface for reactwiki.
//!
//! Provides commands for locating signed comments, listing and applying
//! reactions, and working with the site's signature timestamps. Page text is
//! read from `--input` or stdin; the edited page is written to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::config;
use crate::engine::{ReactionEngine, ReactionRequest};
use crate::locator::CommentTarget;
use crate::reaction::ReactionAction;

pub mod timestamp;

/// reactwiki - Emoji reactions on wikitext talk pages
#[derive(Parser, Debug)]
#[command(name = "reactwiki")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find the byte offset of a signed comment
    Locate {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        io: InputArgs,
    },

    /// List the reactions on a signed comment
    List {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        io: InputArgs,
    },

    /// Add or remove a reaction and print the edited page
    React {
        /// What to do
        #[arg(value_enum)]
        action: ActionArg,

        /// Reaction icon (e.g. 👍)
        icon: String,

        /// Acting user
        #[arg(short, long, env = "REACTWIKI_USER")]
        user: String,

        /// Signature timestamp recorded for additions (defaults to now)
        #[arg(long)]
        ts: Option<String>,

        /// Write the edited page to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        io: InputArgs,
    },

    /// Parse, render or scan signature timestamps
    Timestamp {
        #[command(subcommand)]
        command: timestamp::TimestampCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Which comment to act on
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Signature timestamp of the comment, as rendered on the page
    pub timestamp: String,

    /// Expected author of the comment
    #[arg(short, long)]
    pub author: Option<String>,

    /// Zero-based index among matching signatures
    #[arg(long)]
    pub occurrence: Option<usize>,
}

impl From<TargetArgs> for CommentTarget {
    fn from(args: TargetArgs) -> Self {
        CommentTarget {
            timestamp: args.timestamp,
            author: args.author,
            occurrence: args.occurrence,
        }
    }
}

/// Page input and output format
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Page file (reads from stdin if not provided)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Reaction action for CLI (maps to ReactionAction)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ActionArg {
    /// Add a new reaction icon to the comment
    Append,

    /// Join an existing reaction
    Upvote,

    /// Leave a reaction
    Downvote,

    /// Remove every entry of the user from a reaction
    RemoveAll,
}

impl From<ActionArg> for ReactionAction {
    fn from(a: ActionArg) -> Self {
        match a {
            ActionArg::Append => ReactionAction::Append,
            ActionArg::Upvote => ReactionAction::Upvote,
            ActionArg::Downvote => ReactionAction::Downvote,
            ActionArg::RemoveAll => ReactionAction::RemoveAll,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Locate { target, io } => locate(target.into(), io).await,
            Commands::List { target, io } => list_reactions(target.into(), io).await,
            Commands::React {
                action,
                icon,
                user,
                ts,
                output,
                target,
                io,
            } => {
                let request = ReactionRequest {
                    action: action.into(),
                    icon,
                    user,
                    timestamp: ts,
                };
                react(target.into(), request, output, io).await
            }
            Commands::Timestamp { command } => timestamp::execute(command).await,
            Commands::Config => show_config().await,
        }
    }
}

/// Build the engine for the configured site
pub(crate) fn engine() -> Result<ReactionEngine> {
    let cfg = config::config()?;
    ReactionEngine::new(cfg.site.clone()).context("Failed to set up reaction engine")
}

/// Read page text from a file or stdin
pub(crate) async fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

/// Locate a comment and print its offset
async fn locate(target: CommentTarget, io: InputArgs) -> Result<()> {
    let page = read_input(io.input.as_ref()).await?;
    let position = engine()?
        .locate(&page, &target)
        .with_context(|| format!("Could not locate comment at '{}'", target.timestamp))?;

    if io.json {
        return print_json(&position);
    }

    println!("Offset:     {}", position.offset);
    println!("Signed by:  {}", position.users.join(", "));
    println!("Candidates: {}", position.candidates);
    Ok(())
}

/// List reactions on a comment
async fn list_reactions(target: CommentTarget, io: InputArgs) -> Result<()> {
    let page = read_input(io.input.as_ref()).await?;
    let found = engine()?
        .reactions_at(&page, &target)
        .with_context(|| format!("Could not list reactions at '{}'", target.timestamp))?;

    if io.json {
        return print_json(&found);
    }

    if found.reactions.is_empty() {
        println!("No reactions on this comment");
        return Ok(());
    }

    println!("{:<8} {:>5}  {}", "ICON", "COUNT", "USERS");
    println!("{}", "-".repeat(60));
    for reaction in &found.reactions {
        let users: Vec<&str> = reaction
            .data
            .participants
            .iter()
            .map(|p| p.user.as_str())
            .collect();
        println!(
            "{:<8} {:>5}  {}",
            reaction.data.icon,
            users.len(),
            users.join(", ")
        );
    }
    Ok(())
}

/// Apply a reaction and emit the edited page
async fn react(
    target: CommentTarget,
    mut request: ReactionRequest,
    output: Option<PathBuf>,
    io: InputArgs,
) -> Result<()> {
    let page = read_input(io.input.as_ref()).await?;
    let engine = engine()?;

    if request.action.is_addition() && request.timestamp.is_none() {
        request.timestamp = Some(
            engine
                .signature_timestamp(Utc::now())
                .context("Failed to render signature timestamp")?,
        );
    }

    let edit = engine.react(&page, &target, &request).with_context(|| {
        format!(
            "Could not {} {} at '{}'",
            request.action.as_str(),
            request.icon,
            target.timestamp
        )
    })?;

    if io.json {
        return print_json(&edit);
    }

    match output {
        Some(path) => {
            tokio::fs::write(&path, &edit.text)
                .await
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!("[{}] written to {}", edit.summary, path.display());
        }
        None => {
            print!("{}", edit.text);
            eprintln!("[{}]", edit.summary);
        }
    }
    Ok(())
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let cfg = config::config()?;
    let site = &cfg.site;

    println!("reactwiki configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Timestamps:");
    println!("  Date format: {}", site.date_format);
    println!("  Timezone:    {}", site.timezone);
    match &site.digits {
        Some(digits) => println!("  Digits:      {}", digits.concat()),
        None => println!("  Digits:      (ASCII)"),
    }
    println!("  Zone labels:");
    for (displayed, normalized) in &site.timezone_abbreviations {
        println!("    {} -> {}", displayed, normalized);
    }
    if !site.messages.is_empty() {
        println!("  Name overrides: {}", site.messages.len());
    }
    println!();
    println!("Signatures:");
    println!("  User namespaces:    {}", site.signature.user_namespaces.join(", "));
    println!("  Contributions:      {}", site.signature.contributions_pages.join(", "));
    println!("  Window:             {} chars", site.signature.window_chars);

    Ok(())
}
