//! A small in-memory media server speaking the endpoints the gate uses.
//! Development and integration tests only.

#[path = "navgate_devserver/auth.rs"]
mod auth;
#[path = "navgate_devserver/handlers.rs"]
mod handlers;
#[path = "navgate_devserver/http_error.rs"]
mod http_error;
#[path = "navgate_devserver/routes.rs"]
mod routes;
#[path = "navgate_devserver/runtime/mod.rs"]
mod runtime;
#[path = "navgate_devserver/types.rs"]
mod types;

#[tokio::main]
async fn main() {
    if let Err(err) = runtime::run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
