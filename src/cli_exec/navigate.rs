use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use navgate::guard::{AccessLevel, GuardOutcome, GuardProps, RouteGuard};
use navgate::host::RecordingViewManager;
use navgate::router::{RouteItem, RouteOptions, get_route_url};
use navgate::session::SessionContext;

use super::print_json;
use super::routes::build_router;
use crate::LevelArg;

#[derive(Serialize)]
struct NavigationReport {
    current: Option<String>,
    history: usize,
    loaded: Vec<String>,
}

pub(super) async fn navigate(
    session: Arc<SessionContext>,
    paths: Vec<String>,
    back: usize,
    json: bool,
) -> Result<()> {
    let views = Arc::new(RecordingViewManager::default());
    let router = build_router(session.clone(), views.clone())?;
    let listener = router.spawn_request_fail_listener();

    let mut paths = paths.into_iter();
    let first = paths.next().unwrap_or_else(|| "/".to_string());
    router
        .start(&first)
        .await
        .with_context(|| format!("navigate to {}", first))?;
    for path in paths {
        router
            .show(&path)
            .await
            .with_context(|| format!("navigate to {}", path))?;
    }
    for _ in 0..back {
        router.back().await.context("navigate back")?;
    }
    listener.abort();

    let report = NavigationReport {
        current: session.current_route().map(|c| c.path),
        history: router.history_len(),
        loaded: views.loaded().into_iter().map(|v| v.url).collect(),
    };
    if json {
        return print_json(&report, "navigation");
    }
    for url in &report.loaded {
        println!("loaded {}", url);
    }
    println!("current: {}", report.current.as_deref().unwrap_or("-"));
    Ok(())
}

pub(super) async fn guard(session: Arc<SessionContext>, location: &str, level: LevelArg) -> Result<()> {
    let level = match level {
        LevelArg::Admin => AccessLevel::Admin,
        LevelArg::User => AccessLevel::User,
        LevelArg::Public => AccessLevel::Public,
        LevelArg::Wizard => AccessLevel::Wizard,
    };
    let mut guard = RouteGuard::new(session, GuardProps::new(level));
    match guard.evaluate(location).await {
        GuardOutcome::Render => println!("render"),
        GuardOutcome::Navigate(target) => println!("navigate {}", target),
        GuardOutcome::Error(state) => println!("error {}", state),
        GuardOutcome::NoServerFound => println!("no server found"),
    }
    Ok(())
}

pub(super) fn route_url(item: &str, options: Option<&str>) -> Result<()> {
    let item = if item.trim_start().starts_with('{') {
        serde_json::from_str::<RouteItem>(item).context("parse item json")?
    } else {
        RouteItem::Named(item.to_string())
    };
    let options = match options {
        Some(raw) => serde_json::from_str::<RouteOptions>(raw).context("parse options json")?,
        None => RouteOptions::default(),
    };
    println!("{}", get_route_url(&item, &options)?);
    Ok(())
}
