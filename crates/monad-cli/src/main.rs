//! monad CLI tool.

use clap::{Arg, CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::Context;
use monad_config::scaffold::Language;
use monad_config::{FLAGS, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "monad")]
#[command(about = "Deploy a container image as a fully wired serverless function", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount all resources for this service
    Deploy,
    /// Unmount all resources for this service
    Destroy,
    /// List services matching the current git context
    List {
        /// Include every branch of the repository
        #[arg(long)]
        all: bool,
    },
    /// Registry operations
    Ecr {
        #[command(subcommand)]
        command: EcrCommands,
    },
    /// Write scaffold files to the service directory
    Init {
        /// One of go, python, node, rust
        language: Language,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Render and inspect template data
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
    /// Print the service's function logs
    Logs {
        /// Keep polling for new events
        #[arg(short, long)]
        follow: bool,
        /// Start this many minutes ago
        #[arg(long, default_value = "5")]
        since: i64,
    },
}

#[derive(Subcommand)]
enum EcrCommands {
    /// Log the local Docker daemon in to the registry
    Login,
    /// Remove an image tag, the branch tag by default
    Untag {
        tag: Option<String>,
    },
    /// Create the service repository
    Create,
    /// Delete the service repository and its images
    Delete,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Render a template file against the template data
    Render {
        file: PathBuf,
    },
    /// Print the template data
    Table,
    /// Print the image labels for this service
    Labels {
        /// Print as `--label` build arguments
        #[arg(long)]
        build_args: bool,
    },
    /// Print the rendered function environment
    Env,
    /// Decode the labels of a local image
    Image {
        /// Image reference, the service image by default
        uri: Option<String>,
    },
}

/// The derived parser plus one global flag per recognised setting.
fn command() -> clap::Command {
    FLAGS.iter().fold(Cli::command(), |cmd, flag| {
        cmd.arg(
            Arg::new(flag.flag)
                .long(flag.flag)
                .env(flag.env)
                .help(flag.description)
                .global(true),
        )
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let matches = command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::from_env();
    for flag in FLAGS {
        settings.set_opt(flag.env, matches.get_one::<String>(flag.flag).cloned());
    }

    match cli.command {
        Commands::Init { language, force } => commands::init::init(&settings, language, force)?,
        Commands::Deploy => commands::deploy(&Context::load(settings).await).await?,
        Commands::Destroy => commands::destroy(&Context::load(settings).await).await?,
        Commands::List { all } => commands::list::list(&Context::load(settings).await, all).await?,
        Commands::Ecr { command } => {
            let ctx = Context::load(settings).await;
            match command {
                EcrCommands::Login => commands::ecr::login(&ctx).await?,
                EcrCommands::Untag { tag } => commands::ecr::untag(&ctx, tag).await?,
                EcrCommands::Create => commands::ecr::create(&ctx).await?,
                EcrCommands::Delete => commands::ecr::delete(&ctx).await?,
            }
        }
        Commands::Data { command } => match command {
            DataCommands::Render { file } => {
                commands::data::render(&Context::load(settings).await, &file).await?
            }
            DataCommands::Table => commands::data::table(&Context::load(settings).await).await?,
            DataCommands::Labels { build_args } => {
                commands::data::labels(&Context::load(settings).await, build_args).await?
            }
            DataCommands::Env => commands::data::env(&Context::load(settings).await).await?,
            DataCommands::Image { uri } => commands::data::image(settings, uri).await?,
        },
        Commands::Logs { follow, since } => {
            commands::logs::logs(&Context::load(settings).await, follow, since).await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = command()
            .try_get_matches_from(["monad", "deploy", "--service", "api", "--memory", "256"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("service").unwrap(), "api");
        assert_eq!(matches.get_one::<String>("memory").unwrap(), "256");
    }

    #[test]
    fn test_init_language() {
        let matches = command()
            .try_get_matches_from(["monad", "init", "rust", "--force"])
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Init {
                language: Language::Rust,
                force: true
            }
        ));
        assert!(command().try_get_matches_from(["monad", "init", "cobol"]).is_err());
    }
}
