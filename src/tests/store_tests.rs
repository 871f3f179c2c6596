    use super::*;
    use crate::model::{ConnectionMode, ServerInfo};

    fn server(id: &str, address: &str, accessed: i64) -> ServerInfo {
        ServerInfo {
            id: Some(id.to_string()),
            manual_address: Some(address.to_string()),
            date_last_accessed: accessed,
            ..ServerInfo::default()
        }
    }

    #[test]
    fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();
        assert!(store.credentials().servers.is_empty());
        assert!(!dir.path().join(CREDENTIALS_FILE).exists());
    }

    #[test]
    fn update_writes_through_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).unwrap();
        store
            .update(|c| {
                c.add_or_update(&server("s1", "http://a", 5));
                c.current_server_id = Some("s1".to_string());
            })
            .unwrap();

        let reopened = CredentialStore::open(dir.path()).unwrap();
        let creds = reopened.credentials();
        assert_eq!(creds.servers.len(), 1);
        assert_eq!(creds.current_server_id.as_deref(), Some("s1"));
        assert_eq!(creds.servers[0].manual_address.as_deref(), Some("http://a"));
    }

    #[test]
    fn open_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CREDENTIALS_FILE),
            r#"{"version": 7, "servers": []}"#,
        )
        .unwrap();
        let err = CredentialStore::open(dir.path()).err().unwrap();
        assert!(err.to_string().contains("unsupported credentials version 7"), "{:#}", err);
    }

    #[test]
    fn write_atomic_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn add_or_update_merges_by_id_and_keeps_token() {
        let mut creds = Credentials::default();
        let mut first = server("s1", "http://a", 1);
        first.access_token = Some("tok".to_string());
        first.user_id = Some("u1".to_string());
        creds.add_or_update(&first);

        let mut newer = server("s1", "http://b", 9);
        newer.last_connection_mode = ConnectionMode::Local;
        creds.add_or_update(&newer);

        assert_eq!(creds.servers.len(), 1);
        let s = &creds.servers[0];
        assert_eq!(s.access_token.as_deref(), Some("tok"));
        assert_eq!(s.manual_address.as_deref(), Some("http://b"));
        assert_eq!(s.date_last_accessed, 9);
        assert_eq!(s.last_connection_mode, ConnectionMode::Local);
    }

    #[test]
    fn add_or_update_matches_id_less_servers_by_address() {
        let mut creds = Credentials::default();
        creds.add_or_update(&ServerInfo::from_manual_address("http://a"));
        creds.add_or_update(&server("s1", "http://a", 3));
        assert_eq!(creds.servers.len(), 1);
        assert_eq!(creds.servers[0].id.as_deref(), Some("s1"));
    }

    #[test]
    fn sorted_servers_puts_most_recent_first() {
        let mut creds = Credentials::default();
        creds.add_or_update(&server("old", "http://old", 1));
        creds.add_or_update(&server("new", "http://new", 5));
        let ids: Vec<_> = creds
            .sorted_servers()
            .into_iter()
            .filter_map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn clear_credentials_for_unknown_server_reports_false() {
        let mut creds = Credentials::default();
        creds.add_or_update(&server("s1", "http://a", 1));
        assert!(!creds.clear_credentials_for("nope"));
        assert!(creds.clear_credentials_for("S1"));
    }
