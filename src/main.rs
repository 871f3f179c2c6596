use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

mod cli_exec;

#[derive(Parser)]
#[command(name = "navgate")]
#[command(about = "Session and navigation gate for media server clients", long_about = None)]
struct Cli {
    /// Directory holding config.json and credentials.json
    #[arg(long, global = true, default_value = ".navgate")]
    data_dir: PathBuf,

    /// Prefix stripped from navigated paths (overrides config.json)
    #[arg(long, global = true)]
    base_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the saved servers into a connection state
    Connect {
        /// Ignore stored tokens for this resolution
        #[arg(long)]
        no_auto_login: bool,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List saved servers, most recently used first
    Servers {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Connect to a server by address and remember it
    AddServer {
        address: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in with a user name and password
    Login {
        /// Server id (defaults to the active server)
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "")]
        password: String,
    },

    /// Sign out of the active server
    Logout {
        /// Sign out of every server
        #[arg(long)]
        all: bool,
    },

    /// Remove a saved server
    Forget { server_id: String },

    /// Start at the first path, then navigate to each following path
    Navigate {
        #[arg(required = true)]
        paths: Vec<String>,
        /// Go back this many times afterwards
        #[arg(long, default_value_t = 0)]
        back: usize,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the route guard for a location
    Guard {
        /// Pathname plus query string
        location: String,
        #[arg(long, value_enum, default_value_t = LevelArg::User)]
        level: LevelArg,
    },

    /// Print the route url for a named target or an item (JSON object)
    RouteUrl {
        item: String,
        /// Route options as a JSON object
        #[arg(long)]
        options: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LevelArg {
    Admin,
    User,
    Public,
    Wizard,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    navgate::logging::init("navgate=info")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(cli_exec::handle_command(
        &cli.data_dir,
        cli.base_path.as_deref(),
        cli.command,
    ))
}
