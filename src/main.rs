mod commands;
mod core;
mod hosting;
mod release;
mod ui;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use crate::core::config::{DEFAULT_API_URL, DEFAULT_BRANCH, DEFAULT_REMOTE, Settings};
use crate::core::error::{ReleaseError, print_error};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Cross-repository release bookkeeping: changelog, version bump, tag and hosted release
#[derive(Parser)]
#[command(name = "simple-release")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Directory holding the main repository's package.json
  #[arg(long, global = true, env = "SIMPLE_RELEASE_PROJECT", default_value = ".")]
  project: PathBuf,

  /// Git remote receiving release commits and tags
  #[arg(long, global = true, env = "SIMPLE_RELEASE_REMOTE", default_value = DEFAULT_REMOTE)]
  remote: String,

  /// Branch receiving release commits
  #[arg(long, global = true, env = "SIMPLE_RELEASE_BRANCH", default_value = DEFAULT_BRANCH)]
  branch: String,

  /// Hosting API base URL
  #[arg(long, global = true, env = "SIMPLE_RELEASE_API_URL", default_value = DEFAULT_API_URL)]
  api_url: String,

  /// Hosting API token
  #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// Verbose logging (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Register repositories and record their latest commits
  Init {
    /// Main repository (owner/name); prompts when neither this nor a stored config exists
    #[arg(long, value_name = "OWNER/NAME")]
    main: Option<String>,
    /// Dependent repository (owner/name), repeatable
    #[arg(long = "dep", value_name = "OWNER/NAME")]
    deps: Vec<String>,
  },

  /// Release everything committed since the last release
  Release {
    /// major, premajor, minor, preminor, patch, prepatch or prerelease
    #[arg(value_name = "TYPE")]
    release_type: Option<String>,
    /// Pre-release identifier for the pre* types (e.g. beta)
    #[arg(long)]
    preid: Option<String>,
    /// Show the next version and changelog without changing anything
    #[arg(long)]
    dry_run: bool,
  },

  /// Show the current version and each repository's last release
  Status {
    /// Output status in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
  let filter = EnvFilter::builder()
    .with_default_directive(default_level.into())
    .from_env_lossy();

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn main() {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) => match err.kind() {
      ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
      _ => {
        println!("Option not recognized.");
        std::process::exit(1);
      }
    },
  };

  init_tracing(cli.verbose);

  let settings = Settings::new(cli.project)
    .with_remote(cli.remote)
    .with_branch(cli.branch)
    .with_api_url(cli.api_url)
    .with_token(cli.token);

  let result = match cli.command {
    Commands::Init { main, deps } => commands::run_init(&settings, main, deps),
    Commands::Release {
      release_type,
      preid,
      dry_run,
    } => commands::run_release(&settings, release_type, preid, dry_run),
    Commands::Status { json } => commands::run_status(&settings, json),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(1);
}
