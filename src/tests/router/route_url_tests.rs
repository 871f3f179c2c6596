    use super::*;

    fn on_server(server_id: &str) -> RouteOptions {
        RouteOptions {
            server_id: Some(server_id.to_string()),
            ..RouteOptions::default()
        }
    }

    fn item(id: &str, item_type: &str) -> RouteItem {
        RouteItem::Item(ItemRef {
            id: Some(id.to_string()),
            item_type: Some(item_type.to_string()),
            ..ItemRef::default()
        })
    }

    fn collection(id: &str, collection_type: &str) -> RouteItem {
        RouteItem::Item(ItemRef {
            id: Some(id.to_string()),
            item_type: Some("CollectionFolder".to_string()),
            collection_type: Some(collection_type.to_string()),
            is_folder: true,
            ..ItemRef::default()
        })
    }

    fn url(item: &RouteItem, options: &RouteOptions) -> String {
        get_route_url(item, options).unwrap()
    }

    #[test]
    fn named_targets() {
        let named = |name: &str| RouteItem::Named(name.to_string());
        let opts = on_server("s1");
        assert_eq!(url(&named("settings"), &opts), "#/mypreferencesmenu");
        assert_eq!(url(&named("wizard"), &opts), "#/wizard/start");
        assert_eq!(url(&named("manageserver"), &opts), "#/dashboard");
        assert_eq!(url(&named("recordedtv"), &opts), "#/livetv?tab=3&serverId=s1");
        assert_eq!(url(&named("nextup"), &opts), "#/list?type=nextup&serverId=s1");

        let err = get_route_url(&named("nowhere"), &opts).unwrap_err();
        assert!(err.to_string().contains("unknown route target"), "{:#}", err);
    }

    #[test]
    fn named_list_appends_filter_flags() {
        let opts = RouteOptions {
            item_types: Some("Movie".to_string()),
            is_favorite: true,
            is_series: true,
            ..on_server("s1")
        };
        assert_eq!(
            url(&RouteItem::Named("list".to_string()), &opts),
            "#/list?serverId=s1&type=Movie&IsFavorite=true&IsSeries=true&IsMovie=false&IsNews=false"
        );
    }

    #[test]
    fn named_livetv_sections() {
        let section = |s: &str| RouteOptions {
            section: Some(s.to_string()),
            ..on_server("s1")
        };
        let livetv = RouteItem::Named("livetv".to_string());
        assert_eq!(url(&livetv, &section("guide")), "#/livetv?tab=1&serverId=s1");
        assert_eq!(url(&livetv, &section("seriesrecording")), "#/livetv?tab=5&serverId=s1");
        assert_eq!(
            url(&livetv, &section("onnow")),
            "#/list?type=Programs&IsAiring=true&serverId=s1"
        );
        assert_eq!(url(&livetv, &on_server("s1")), "#/livetv?serverId=s1");
    }

    #[test]
    fn named_tag_is_encoded() {
        let opts = RouteOptions {
            tag: Some("sci fi&more".to_string()),
            parent_id: Some("p1".to_string()),
            ..on_server("s1")
        };
        assert_eq!(
            url(&RouteItem::Named("tag".to_string()), &opts),
            "#/list?type=tag&tag=sci%20fi%26more&serverId=s1&parentId=p1"
        );
    }

    #[test]
    fn explicit_url_wins() {
        let target = RouteItem::Item(ItemRef {
            id: Some("x".to_string()),
            item_type: Some("Genre".to_string()),
            url: Some("#/custom".to_string()),
            ..ItemRef::default()
        });
        assert_eq!(url(&target, &on_server("s1")), "#/custom");
    }

    #[test]
    fn series_timer_and_livetv_collection() {
        assert_eq!(
            url(&item("t1", "SeriesTimer"), &on_server("s1")),
            "#/details?seriesTimerId=t1&serverId=s1"
        );
        assert_eq!(
            url(&collection("lt", "livetv"), &on_server("s1")),
            "#/livetv?collectionType=livetv"
        );
    }

    #[test]
    fn genre_and_studio_lists() {
        let livetv = RouteOptions {
            context: Some("livetv".to_string()),
            ..on_server("s1")
        };
        assert_eq!(
            url(&item("g1", "Genre"), &livetv),
            "#/list?genreId=g1&serverId=s1&type=Programs"
        );

        let in_parent = RouteOptions {
            parent_id: Some("lib".to_string()),
            ..on_server("s1")
        };
        assert_eq!(
            url(&item("st", "Studio"), &in_parent),
            "#/list?studioId=st&serverId=s1&parentId=lib"
        );
        assert_eq!(
            url(&item("mg", "MusicGenre"), &on_server("s1")),
            "#/list?musicGenreId=mg&serverId=s1"
        );
    }

    #[test]
    fn collection_folders_open_their_library_page() {
        assert_eq!(
            url(&collection("m1", "movies"), &on_server("s1")),
            "#/movies?topParentId=m1&collectionType=movies"
        );
        let latest = RouteOptions {
            section: Some("latest".to_string()),
            ..on_server("s1")
        };
        assert_eq!(
            url(&collection("t1", "tvshows"), &latest),
            "#/tv?topParentId=t1&collectionType=tvshows&tab=1"
        );

        // In the folders context a library is just a folder.
        let folders = RouteOptions {
            context: Some("folders".to_string()),
            ..on_server("s1")
        };
        assert_eq!(
            url(&collection("m1", "movies"), &folders),
            "#/list?parentId=m1&serverId=s1"
        );
    }

    #[test]
    fn home_videos_need_the_experimental_layout() {
        let home_videos = collection("h1", "homevideos");
        assert_eq!(
            url(&home_videos, &on_server("s1")),
            "#/list?parentId=h1&serverId=s1"
        );
        let experimental = RouteOptions {
            experimental_layout: true,
            ..on_server("s1")
        };
        assert_eq!(url(&home_videos, &experimental), "#/homevideos?topParentId=h1");
    }

    #[test]
    fn episodes_carry_their_context() {
        let tv = RouteOptions {
            context: Some("tvshows".to_string()),
            ..on_server("s1")
        };
        assert_eq!(
            url(&item("e1", "Episode"), &tv),
            "#/details?id=e1&context=tvshows&serverId=s1"
        );
        assert_eq!(
            url(&item("p1", "Person"), &tv),
            "#/details?id=p1&serverId=s1"
        );
    }

    #[test]
    fn folders_and_plain_items() {
        let empty_folder = RouteItem::Item(ItemRef {
            is_folder: true,
            ..ItemRef::default()
        });
        assert_eq!(url(&empty_folder, &on_server("s1")), "#");

        // The item's own server id beats the option.
        let movie = RouteItem::Item(ItemRef {
            item_id: Some("m9".to_string()),
            item_type: Some("Movie".to_string()),
            server_id: Some("own".to_string()),
            ..ItemRef::default()
        });
        assert_eq!(url(&movie, &on_server("s1")), "#/details?id=m9&serverId=own");
    }

    #[test]
    fn route_items_deserialize_from_names_or_server_dtos() {
        let named: RouteItem = serde_json::from_str(r#""settings""#).unwrap();
        assert!(matches!(named, RouteItem::Named(ref n) if n == "settings"));

        let dto: RouteItem = serde_json::from_str(
            r#"{"Id":"e1","Type":"Episode","ServerId":"s1","IsFolder":false}"#,
        )
        .unwrap();
        assert_eq!(url(&dto, &RouteOptions::default()), "#/details?id=e1&serverId=s1");

        let options: RouteOptions =
            serde_json::from_str(r#"{"serverId":"s2","isFavorite":true}"#).unwrap();
        assert_eq!(options.server_id.as_deref(), Some("s2"));
        assert!(options.is_favorite);
    }
