//! # fortune2 CLI
//!
//! ## Usage
//!
//! ```bash
//! fortune2 [-F <db file>] [--config <toml>] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fortune2 ingest <file>...` | Load fortune files as jars (replacing existing ones) |
//! | `fortune2 delete <jar>...` | Remove jars |
//! | `fortune2 [random] [jar...]` | Print a random fortune |
//! | `fortune2 search <pattern> [jar...]` | Print every fortune matching a regex |
//! | `fortune2 info [jar...]` | Fortune counts per jar |
//! | `fortune2 serve [port]` | Start the HTTP server |
//!
//! With no command, `random` is assumed: `fortune2 -c linux` draws from the
//! `linux` jar and shows which jar the fortune came from.
//!
//! The store location is taken from `-F`, then `$FORTUNE2FILE`, then the
//! config file, then `/usr/local/share/fortune2/fortune2.db`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use fortune2::config;
use fortune2::select::SelectionMode;
use fortune2::{info, ingest, search, select, server, FortuneError};

/// fortune2: store fortune cookies in jars and serve them at random.
#[derive(Parser)]
#[command(
    name = "fortune2",
    about = "fortune2: store fortune cookies in jars and serve them at random",
    version
)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fortune database file. Overrides `$FORTUNE2FILE` and the config file.
    #[arg(short = 'F', long = "file", global = true, value_name = "FILE")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments for the implicit `random` command, used only when no
    /// subcommand is given.
    #[command(flatten)]
    random: RandomArgs,
}

#[derive(Args, Debug, Default, Clone)]
struct RandomArgs {
    /// Jars to draw from. All jars when omitted.
    jars: Vec<String>,

    /// Give every jar the same chance instead of weighting by size.
    #[arg(short = 'e', long = "equal")]
    equal: bool,

    /// Show the jar the fortune came from.
    #[arg(short = 'c', long = "show-jar")]
    show_jar: bool,

    /// List the jars that would be drawn from, with their odds, instead of a fortune.
    #[arg(short = 'f', long = "list-jars")]
    list_jars: bool,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Load fortune files into jars.
    ///
    /// Each file becomes a jar named after the file (`linux.txt` → `linux`).
    /// An existing jar with the same name is replaced, not appended to.
    Ingest {
        /// Fortune files, records separated by lines holding a single `%`.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Delete jars.
    Delete {
        #[arg(required = true)]
        jars: Vec<String>,
    },

    /// Print a random fortune.
    Random(RandomArgs),

    /// Print every fortune matching a regular expression.
    Search {
        /// Regular expression to match against fortune bodies.
        pattern: String,

        /// Jars to search. All jars when omitted.
        jars: Vec<String>,

        /// Match regardless of letter case.
        #[arg(short = 'i', long = "ignore-case")]
        ignore_case: bool,

        /// Show the jar each fortune came from.
        #[arg(short = 'c', long = "show-jar")]
        show_jar: bool,
    },

    /// Show fortune counts per jar and each jar's share of the total.
    Info {
        /// Jars to report on. All jars when omitted.
        jars: Vec<String>,
    },

    /// Start the HTTP server.
    Serve {
        /// Port to listen on. Defaults to `[server].port` (8000).
        port: Option<u16>,
    },
}

fn init_tracing(default_level: LevelFilter) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve { .. }) => LevelFilter::INFO,
        _ => LevelFilter::WARN,
    };
    init_tracing(default_level);

    let mut cfg = config::load_or_default(cli.config.as_deref())?;
    cfg.resolve_db_path(cli.file);

    let command = cli.command.unwrap_or(Commands::Random(cli.random));

    let result = match command {
        Commands::Ingest { files } => ingest::run_ingest(&cfg, &files).await,
        Commands::Delete { jars } => ingest::run_delete(&cfg, &jars).await,
        Commands::Random(args) => {
            let mode = if args.equal {
                SelectionMode::Uniform
            } else {
                SelectionMode::Weighted
            };
            select::run_random(&cfg, &args.jars, mode, args.show_jar, args.list_jars).await
        }
        Commands::Search {
            pattern,
            jars,
            ignore_case,
            show_jar,
        } => search::run_search(&cfg, &pattern, &jars, ignore_case, show_jar).await,
        Commands::Info { jars } => info::run_info(&cfg, &jars).await,
        Commands::Serve { port } => server::run_server(&cfg, port).await,
    };

    if let Err(err) = &result {
        if let Some(FortuneError::NoJars) = err.downcast_ref::<FortuneError>() {
            println!("No fortune jars yet.");
            println!("Use 'ingest' to initialize one.");
            std::process::exit(1);
        }
    }

    result
}
