mod common;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};

use navgate::config::GateConfig;
use navgate::gate::AuthGate;
use navgate::host::{HeadlessHost, Notifier, RecordingViewManager};
use navgate::loader::{ContentRegistry, ControllerRegistry, ViewLoadCoordinator};
use navgate::model::{ConnectionState, RouteDescriptor, RouteType};
use navgate::resolver::ConnectOptions;
use navgate::router::Router;
use navgate::session::SessionContext;

#[derive(Default)]
struct Alerts(Mutex<Vec<String>>);

impl Notifier for Alerts {
    fn alert(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

fn open_session(dir: &Path) -> Result<Arc<SessionContext>> {
    let config = GateConfig::load_or_init(dir)?;
    SessionContext::open(dir, config)
}

/// Save the dev server and sign in as `user`.
async fn sign_in(session: &SessionContext, base_url: &str, user: &str, pw: &str) -> Result<()> {
    let result = session
        .resolver()
        .connect_to_address(base_url, ConnectOptions::default())
        .await?;
    assert_eq!(result.state, ConnectionState::ServerSignIn);
    let client = result.client.context("resolved client")?;
    let auth = client.authenticate_by_name(user, pw).await?;
    session.registry().on_authenticated(&client, &auth);
    Ok(())
}

fn router(session: Arc<SessionContext>, views: Arc<RecordingViewManager>) -> Result<Arc<Router>> {
    let alerts: Arc<dyn Notifier> = Arc::new(Alerts::default());
    let gate = AuthGate::new(session.clone(), Arc::new(HeadlessHost), alerts);
    let mut content = ContentRegistry::new();
    content.register_static("/home", "<p>home</p>");
    content.register_static("/login", "<p>login</p>");
    content.register_static("/selectserver", "<p>servers</p>");
    let loader = ViewLoadCoordinator::new(session.clone(), views, ControllerRegistry::new(), content);

    let router = Router::new(session, gate, loader);
    router.add_route(RouteDescriptor::new("/").default_route().startup())?;
    router.add_route(RouteDescriptor::new("/home").with_type(RouteType::Home))?;
    router.add_route(
        RouteDescriptor::new("/login")
            .with_type(RouteType::Login)
            .anonymous()
            .startup(),
    )?;
    router.add_route(
        RouteDescriptor::new("/selectserver")
            .with_type(RouteType::SelectServer)
            .anonymous()
            .startup(),
    )?;
    router.add_route(
        RouteDescriptor::new("/dashboard")
            .with_roles("admin")
            .server_request(),
    )?;
    router.add_route(RouteDescriptor::new("/livetv").server_request())?;
    Ok(Arc::new(router))
}

#[test]
fn saved_token_survives_a_restart() -> Result<()> {
    let server = common::spawn_server(&[])?;
    let dir = tempfile::tempdir()?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let session = open_session(dir.path())?;
        sign_in(&session, &server.base_url, "dev", "").await?;
        Ok::<_, anyhow::Error>(())
    })?;

    rt.block_on(async {
        let session = open_session(dir.path())?;
        let result = session.resolver().connect(ConnectOptions::default()).await;
        assert_eq!(result.state, ConnectionState::SignedIn);
        assert_eq!(result.server_id().as_deref(), Some(common::SERVER_ID));

        let client = session.registry().active_client().context("active client")?;
        session.registry().sign_out(&client).await;
        Ok::<_, anyhow::Error>(())
    })?;

    rt.block_on(async {
        let session = open_session(dir.path())?;
        let result = session.resolver().connect(ConnectOptions::default()).await;
        assert_eq!(result.state, ConnectionState::ServerSignIn);
        Ok::<_, anyhow::Error>(())
    })
}

#[test]
fn admin_reaches_the_server_hosted_dashboard() -> Result<()> {
    let server = common::spawn_server(&[])?;
    let dir = tempfile::tempdir()?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let session = open_session(dir.path())?;
        sign_in(&session, &server.base_url, "dev", "").await?;

        let views = Arc::new(RecordingViewManager::default());
        let router = router(session.clone(), views.clone())?;
        router.start("/dashboard").await?;

        let loaded = views.loaded();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded[0].view.as_deref(),
            Some("<div data-page=\"/dashboard\"></div>")
        );
        Ok::<_, anyhow::Error>(())
    })
}

#[test]
fn non_admin_is_sent_home() -> Result<()> {
    let server = common::spawn_server(&["--user", "ann:pw"])?;
    let dir = tempfile::tempdir()?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let session = open_session(dir.path())?;
        sign_in(&session, &server.base_url, "ann", "pw").await?;

        let views = Arc::new(RecordingViewManager::default());
        let router = router(session.clone(), views.clone())?;
        router.start("/home").await?;
        router.show("/dashboard").await?;

        let current = session.current_route().context("current route")?;
        assert_eq!(current.pathname(), "/home");
        Ok::<_, anyhow::Error>(())
    })
}

#[test]
fn parental_control_forces_the_login_page() -> Result<()> {
    let server = common::spawn_server(&["--user", "kid:pw", "--restricted", "kid"])?;
    let dir = tempfile::tempdir()?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let session = open_session(dir.path())?;
        sign_in(&session, &server.base_url, "kid", "pw").await?;

        let views = Arc::new(RecordingViewManager::default());
        let router = router(session.clone(), views)?;
        let listener = router.spawn_request_fail_listener();
        router.start("/home").await?;

        let err = router.show("/livetv").await.unwrap_err();
        assert!(format!("{:#}", err).contains("403"), "{:#}", err);

        for _ in 0..100 {
            if session.current_route().is_some_and(|c| c.pathname() == "/login") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let current = session.current_route().context("current route")?;
        assert_eq!(
            current.path,
            format!("/login?serverid={}", common::SERVER_ID)
        );
        listener.abort();
        Ok::<_, anyhow::Error>(())
    })
}
