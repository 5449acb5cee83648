use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod context;
mod terminal;

use commands::settings::ThemeArgs;
use context::AppContext;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version, about = "Parley - local chat simulator", long_about = None)]
struct Cli {
    /// Data directory (defaults to the platform data dir + /parley)
    #[arg(long, global = true, env = "PARLEY_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a message and wait for a possible reply
    Send {
        text: String,
        /// Treat the argument as an image URL or data URL
        #[arg(long)]
        image: bool,
    },
    /// Show the message thread
    History {
        /// Reveal one more page of older messages (repeatable)
        #[arg(short, long, action = ArgAction::Count)]
        more: u8,
    },
    /// Show or change settings
    Settings {
        /// Set a field, e.g. --set autoSave=false (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Show or change theme, bubble style and background
    Theme {
        /// Restore the default look before applying other flags
        #[arg(long)]
        reset: bool,
        /// Switch between light and dark
        #[arg(long, conflicts_with = "mode")]
        toggle_dark: bool,
        /// light or dark
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        bubble: Option<String>,
        #[arg(long, conflicts_with_all = ["background_image", "no_background"])]
        background_color: Option<String>,
        #[arg(long, conflicts_with = "no_background")]
        background_image: Option<String>,
        #[arg(long)]
        no_background: bool,
    },
    /// Show storage usage of the current session
    Usage,
    /// Export the current session to a backup file
    Export {
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Replace all stored data with a backup file
    Import { path: PathBuf },
    /// Delete all stored data of every session
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Check stored data for problems
    Validate,
    /// Fix problems reported by validate, then compress
    Repair,
    /// Trim long message and background lists
    Compress,
    /// List sessions that own stored data
    Sessions,
    /// Show the current session id
    Session {
        /// End the session; the next run starts a new one
        #[arg(long)]
        end: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = AppContext::open(cli.data_dir)?;

    match cli.command {
        Commands::Send { text, image } => commands::chat::send(&ctx, &text, image).await?,
        Commands::History { more } => commands::chat::history(&ctx, more).await?,
        Commands::Settings { set } => commands::settings::settings(&ctx, &set).await?,
        Commands::Theme {
            reset,
            toggle_dark,
            mode,
            color,
            bubble,
            background_color,
            background_image,
            no_background,
        } => {
            commands::settings::theme(
                &ctx,
                ThemeArgs {
                    reset,
                    toggle_dark,
                    mode,
                    color,
                    bubble,
                    background_color,
                    background_image,
                    no_background,
                },
            )
            .await?
        }
        Commands::Usage => commands::data::usage(&ctx)?,
        Commands::Export { out } => commands::data::export(&ctx, out.as_deref())?,
        Commands::Import { path } => commands::data::import(&ctx, &path)?,
        Commands::Clear { yes } => commands::data::clear(&ctx, yes).await?,
        Commands::Validate => commands::data::validate(&ctx)?,
        Commands::Repair => commands::data::repair(&ctx)?,
        Commands::Compress => commands::data::compress(&ctx)?,
        Commands::Sessions => commands::data::sessions(&ctx)?,
        Commands::Session { end } => commands::data::session(&ctx, end)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_history_more() {
        let cli = Cli::try_parse_from(["parley", "history", "--more", "--more"]).unwrap();
        match cli.command {
            Commands::History { more } => assert_eq!(more, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_settings_set() {
        let cli = Cli::try_parse_from([
            "parley",
            "settings",
            "--set",
            "autoSave=false",
            "--set",
            "colorTheme=ocean",
        ])
        .unwrap();
        match cli.command {
            Commands::Settings { set } => assert_eq!(set, vec!["autoSave=false", "colorTheme=ocean"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_theme_reset() {
        let cli = Cli::try_parse_from(["parley", "theme", "--reset", "--toggle-dark"]).unwrap();
        match cli.command {
            Commands::Theme {
                reset, toggle_dark, ..
            } => assert!(reset && toggle_dark),
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["parley", "theme", "--toggle-dark", "--mode", "dark"]).is_err());
    }
}
