use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use tokio::sync::RwLock;

use super::Args;
use crate::types::{AppState, DevUser, SharedState, random_hex};

pub(super) fn build_state(args: &Args, local_addr: SocketAddr) -> Result<SharedState> {
    let specs = if args.users.is_empty() {
        vec!["dev::admin".to_string()]
    } else {
        args.users.clone()
    };

    let mut users = HashMap::new();
    for spec in &specs {
        let user = DevUser::parse(spec)?;
        if users.insert(user.name.to_lowercase(), user).is_some() {
            anyhow::bail!("duplicate user in {:?}", spec);
        }
    }

    let mut restricted = HashSet::new();
    for name in &args.restricted {
        let Some(user) = users.get(&name.to_lowercase()) else {
            anyhow::bail!("restricted user {:?} is not defined", name);
        };
        restricted.insert(user.id.clone());
    }

    let server_id = match &args.server_id {
        Some(id) => id.clone(),
        None => random_hex(16)?,
    };

    Ok(Arc::new(AppState {
        server_id,
        server_name: args.server_name.clone(),
        version: args.version.clone(),
        local_address: format!("http://{}", local_addr),
        wizard_completed: AtomicBool::new(!args.wizard_incomplete),
        users: RwLock::new(users),
        tokens: RwLock::new(HashMap::new()),
        restricted,
    }))
}
