use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

mod app;
mod listener;
mod shutdown;

use self::app::build_state;
use self::listener::{bind_listener, maybe_write_addr_file};
use self::shutdown::shutdown_signal;
use crate::routes::app_router;

#[derive(Parser)]
#[command(name = "navgate-devserver")]
#[command(about = "In-memory media server for navgate development", long_about = None)]
pub(crate) struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8096")]
    pub(crate) addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    pub(crate) addr_file: Option<PathBuf>,

    /// Server id (random when omitted)
    #[arg(long)]
    pub(crate) server_id: Option<String>,

    #[arg(long, default_value = "navgate dev server")]
    pub(crate) server_name: String,

    /// Version reported by the public info endpoint
    #[arg(long, default_value = "10.9.0")]
    pub(crate) version: String,

    /// Report the first-run wizard as not yet completed
    #[arg(long)]
    pub(crate) wizard_incomplete: bool,

    /// User as `name:password[:admin]`. Repeatable. Defaults to `dev::admin`.
    #[arg(long = "user")]
    pub(crate) users: Vec<String>,

    /// User name whose content requests are refused by parental control.
    #[arg(long)]
    pub(crate) restricted: Vec<String>,
}

pub(crate) async fn run() -> Result<()> {
    let args = Args::parse();

    let listener = bind_listener(args.addr).await?;
    let local_addr = listener.local_addr().context("read listener local addr")?;

    let state = build_state(&args, local_addr)?;
    let app = app_router(state);

    eprintln!("navgate-devserver listening on {}", local_addr);
    maybe_write_addr_file(args.addr_file.as_ref(), local_addr)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
