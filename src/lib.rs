pub mod client;
pub mod config;
pub mod events;
pub mod gate;
pub mod guard;
pub mod host;
pub mod loader;
pub mod logging;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod session;
pub mod store;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
