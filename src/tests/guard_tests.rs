    use super::*;
    use crate::test_support::{
        FakeTransport, public_info, saved_server, session_with, signed_in_server,
    };

    const ADDR: &str = "http://srv";
    const PUBLIC_INFO: &str = "http://srv/System/Info/Public";
    const USERS_ME: &str = "http://srv/Users/Me";

    fn guard(
        transport: &Arc<FakeTransport>,
        servers: &[crate::model::ServerInfo],
        level: AccessLevel,
    ) -> RouteGuard {
        RouteGuard::new(session_with(transport.clone(), servers), GuardProps::new(level))
    }

    #[test]
    fn props_from_roles_and_flags() {
        assert_eq!(GuardProps::from_roles("user, admin").level, AccessLevel::Admin);
        assert_eq!(GuardProps::from_roles("editor").level, AccessLevel::User);
        assert_eq!(GuardProps::from_flags(true, true).level, AccessLevel::Admin);
        assert_eq!(GuardProps::from_flags(false, true).level, AccessLevel::User);
        assert_eq!(GuardProps::from_flags(false, false).level, AccessLevel::Public);
        assert_eq!(GuardProps::default().level, AccessLevel::User);
    }

    #[tokio::test]
    async fn outdated_server_sends_root_to_server_selection() {
        let transport = FakeTransport::new();
        transport.serve(ADDR, "s1", "3.5.2");
        let mut g = guard(&transport, &[saved_server("s1", ADDR)], AccessLevel::User);
        assert_eq!(
            g.evaluate("/").await,
            GuardOutcome::Navigate(SELECT_SERVER_PATH.to_string())
        );
    }

    #[tokio::test]
    async fn outdated_server_elsewhere_shows_the_error_page() {
        let transport = FakeTransport::new();
        transport.serve(ADDR, "s1", "3.5.2");
        let mut g = guard(&transport, &[saved_server("s1", ADDR)], AccessLevel::User);
        assert_eq!(
            g.evaluate("/details?id=1").await,
            GuardOutcome::Error(ConnectionState::ServerUpdateNeeded)
        );
        assert!(!g.is_loading());
        assert!(!g.should_render_children());
    }

    #[tokio::test]
    async fn unreachable_server_bounces_to_server_selection() {
        let mut g = guard(
            &FakeTransport::new(),
            &[saved_server("s1", ADDR)],
            AccessLevel::User,
        );
        assert_eq!(
            g.evaluate("/details?id=1").await,
            GuardOutcome::Navigate(SELECT_SERVER_PATH.to_string())
        );
    }

    #[tokio::test]
    async fn sign_in_needed_bounces_to_login_with_return_url() {
        let transport = FakeTransport::new();
        transport.serve(ADDR, "s1", "10.9.0");
        let mut g = guard(&transport, &[saved_server("s1", ADDR)], AccessLevel::User);

        assert_eq!(
            g.evaluate("/details?id=1").await,
            GuardOutcome::Navigate("/login?serverid=s1&url=%2Fdetails%3Fid%3D1".to_string())
        );
        assert!(g.is_loading());
    }

    #[tokio::test]
    async fn login_page_itself_renders() {
        let transport = FakeTransport::new();
        transport.serve(ADDR, "s1", "10.9.0");
        let mut g = guard(&transport, &[saved_server("s1", ADDR)], AccessLevel::User);

        assert_eq!(g.evaluate("/login?serverid=s1").await, GuardOutcome::Render);
        assert!(g.should_render_children());
    }

    #[tokio::test]
    async fn incomplete_wizard_redirects_to_the_wizard() {
        let transport = FakeTransport::new();
        transport.reply_json(PUBLIC_INFO, public_info("s1", "10.9.0", false));
        let mut g = guard(&transport, &[saved_server("s1", ADDR)], AccessLevel::User);

        assert_eq!(
            g.evaluate("/home").await,
            GuardOutcome::Navigate(WIZARD_START_PATH.to_string())
        );
    }

    #[tokio::test]
    async fn foreign_product_counts_as_no_server() {
        let transport = FakeTransport::new();
        transport.reply_json(
            PUBLIC_INFO,
            serde_json::json!({
                "Id": "s1",
                "Version": "10.9.0",
                "ProductName": "Something Else",
            }),
        );
        let mut g = guard(&transport, &[saved_server("s1", ADDR)], AccessLevel::Wizard);
        assert_eq!(g.evaluate("/wizard/start").await, GuardOutcome::NoServerFound);
    }

    #[tokio::test]
    async fn wizard_level_renders_until_the_wizard_is_done() {
        let transport = FakeTransport::new();
        transport.reply_json(PUBLIC_INFO, public_info("s1", "10.9.0", false));
        let mut g = guard(&transport, &[saved_server("s1", ADDR)], AccessLevel::Wizard);

        assert_eq!(g.evaluate("/wizard/start").await, GuardOutcome::Render);
        assert_eq!(transport.calls_to(PUBLIC_INFO), 2);

        transport.serve(ADDR, "s1", "10.9.0");
        assert_eq!(
            g.evaluate("/wizard/start").await,
            GuardOutcome::Navigate(HOME_PATH.to_string())
        );
        // Startup resolution only ran once.
        assert_eq!(transport.calls_to(PUBLIC_INFO), 3);
    }

    #[tokio::test]
    async fn wizard_level_without_any_server() {
        let mut g = guard(&FakeTransport::new(), &[], AccessLevel::Wizard);
        assert_eq!(g.evaluate("/wizard/start").await, GuardOutcome::NoServerFound);
    }

    #[tokio::test]
    async fn public_pages_render_once_connected() {
        let mut g = guard(&FakeTransport::new(), &[], AccessLevel::Public);

        assert_eq!(g.evaluate("/selectserver").await, GuardOutcome::Render);
        assert_eq!(g.evaluate("/about").await, GuardOutcome::Render);
    }

    #[tokio::test]
    async fn signed_in_user_renders() {
        let transport = FakeTransport::new();
        transport.serve(ADDR, "s1", "10.9.0");
        transport.serve_user(ADDR, "s1", "u1", false);
        let mut g = guard(
            &transport,
            &[signed_in_server("s1", ADDR, "u1", "tok")],
            AccessLevel::User,
        );
        assert_eq!(g.evaluate("/home").await, GuardOutcome::Render);
    }

    #[tokio::test]
    async fn admin_rights_are_fetched_on_every_evaluation() {
        let transport = FakeTransport::new();
        transport.serve(ADDR, "s1", "10.9.0");
        transport.serve_user(ADDR, "s1", "u1", true);
        let mut g = guard(
            &transport,
            &[signed_in_server("s1", ADDR, "u1", "tok")],
            AccessLevel::Admin,
        );

        assert_eq!(g.evaluate("/dashboard").await, GuardOutcome::Render);
        let before = transport.calls_to(USERS_ME);
        assert_eq!(g.evaluate("/dashboard").await, GuardOutcome::Render);
        assert_eq!(transport.calls_to(USERS_ME), before + 1);

        // Demoted between mounts.
        transport.serve_user(ADDR, "s1", "u1", false);
        assert_eq!(
            g.evaluate("/dashboard").await,
            GuardOutcome::Navigate(HOME_PATH.to_string())
        );
    }

    #[tokio::test]
    async fn set_props_reevaluates_only_on_change() {
        let transport = FakeTransport::new();
        transport.serve(ADDR, "s1", "10.9.0");
        transport.serve_user(ADDR, "s1", "u1", false);
        let mut g = guard(
            &transport,
            &[signed_in_server("s1", ADDR, "u1", "tok")],
            AccessLevel::User,
        );
        g.evaluate("/dashboard").await;
        let requests = transport.requests().len();

        assert_eq!(g.set_props(GuardProps::new(AccessLevel::User), "/dashboard").await, None);
        assert_eq!(transport.requests().len(), requests);

        let outcome = g
            .set_props(GuardProps::from_roles("admin"), "/dashboard")
            .await;
        assert_eq!(outcome, Some(GuardOutcome::Navigate(HOME_PATH.to_string())));
        assert_eq!(g.props().level, AccessLevel::Admin);
    }
