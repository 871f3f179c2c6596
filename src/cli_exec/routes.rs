use std::sync::Arc;

use anyhow::Result;

use navgate::gate::AuthGate;
use navgate::host::{HeadlessHost, LogNotifier, ViewManager};
use navgate::loader::{ContentRegistry, ControllerRegistry, ViewLoadCoordinator};
use navgate::model::{ContentPath, ControllerId, RouteDescriptor, RouteType};
use navgate::router::Router;
use navgate::session::SessionContext;

const HOME: ControllerId = ControllerId("home");
const LOGIN: ControllerId = ControllerId("session/login");
const SELECT_SERVER: ControllerId = ControllerId("session/selectserver");
const WIZARD: ControllerId = ControllerId("wizard/start");
const DASHBOARD: ControllerId = ControllerId("dashboard");
const PREFERENCES: ControllerId = ControllerId("user/menu");
const LIST: ControllerId = ControllerId("list");
const DETAILS: ControllerId = ControllerId("details");
const LIVETV: ControllerId = ControllerId("livetv");
const SEARCH: ControllerId = ControllerId("search");
const NOW_PLAYING: ControllerId = ControllerId("playback/nowplaying");
const LIBRARY: ControllerId = ControllerId("library");

fn list_content(querystring: &str) -> String {
    if querystring.split('&').any(|p| p == "type=Programs") {
        "/livetv/programs".to_string()
    } else {
        "/list".to_string()
    }
}

/// The page table, in match priority order.
fn route_table() -> Vec<RouteDescriptor> {
    let page = |path: &str, controller: ControllerId| {
        RouteDescriptor::new(path).with_controller(controller)
    };
    vec![
        RouteDescriptor::new("/").default_route().startup(),
        page("/home", HOME).with_type(RouteType::Home),
        page("/login", LOGIN)
            .with_type(RouteType::Login)
            .anonymous()
            .startup(),
        page("/selectserver", SELECT_SERVER)
            .with_type(RouteType::SelectServer)
            .anonymous()
            .startup(),
        page("/wizard/start", WIZARD).anonymous().startup(),
        page("/dashboard", DASHBOARD)
            .with_roles("admin")
            .server_request(),
        page("/mypreferencesmenu", PREFERENCES),
        page("/list", LIST).with_content(ContentPath::FromQuery(list_content)),
        page("/details", DETAILS).with_content_query_string(),
        page("/livetv", LIVETV),
        page("/search", SEARCH),
        page("/nowplaying", NOW_PLAYING),
        page("/movies", LIBRARY),
        page("/tv", LIBRARY),
        page("/music", LIBRARY),
        page("/homevideos", LIBRARY),
    ]
}

fn content() -> ContentRegistry {
    let mut content = ContentRegistry::new();
    for path in [
        "/",
        "/home",
        "/login",
        "/selectserver",
        "/wizard/start",
        "/mypreferencesmenu",
        "/list",
        "/livetv/programs",
        "/details",
        "/livetv",
        "/search",
        "/nowplaying",
        "/movies",
        "/tv",
        "/music",
        "/homevideos",
    ] {
        content.register_static(path, &format!("<div data-page=\"{}\"></div>", path));
    }
    content
}

fn controllers() -> ControllerRegistry {
    let mut controllers = ControllerRegistry::new();
    for id in [
        HOME,
        LOGIN,
        SELECT_SERVER,
        WIZARD,
        DASHBOARD,
        PREFERENCES,
        LIST,
        DETAILS,
        LIVETV,
        SEARCH,
        NOW_PLAYING,
        LIBRARY,
    ] {
        controllers.register_ready(id);
    }
    controllers
}

/// A headless router over the built-in page table.
pub(super) fn build_router(
    session: Arc<SessionContext>,
    views: Arc<dyn ViewManager>,
) -> Result<Arc<Router>> {
    let gate = AuthGate::new(session.clone(), Arc::new(HeadlessHost), Arc::new(LogNotifier));
    let loader = ViewLoadCoordinator::new(session.clone(), views, controllers(), content());
    let router = Router::new(session, gate, loader);
    for route in route_table() {
        router.add_route(route)?;
    }
    Ok(Arc::new(router))
}
