use anyhow::Result;
use serde::Deserialize;

use super::path::encode_component;

/// A navigation target: a named destination or a library entity.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RouteItem {
    Named(String),
    Item(ItemRef),
}

/// The entity fields the url mapping reads, as the server sends them.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemRef {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub item_id: Option<String>,

    #[serde(default, rename = "Type")]
    pub item_type: Option<String>,

    #[serde(default)]
    pub server_id: Option<String>,

    #[serde(default)]
    pub collection_type: Option<String>,

    #[serde(default)]
    pub is_folder: bool,

    /// Explicit target; wins over everything else.
    #[serde(default, rename = "url")]
    pub url: Option<String>,
}

impl ItemRef {
    fn is_local(&self) -> bool {
        self.id.as_deref().is_some_and(|id| id.starts_with("local:"))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub item_types: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_airing: bool,
    #[serde(default)]
    pub is_movie: bool,
    #[serde(default)]
    pub is_series: bool,
    #[serde(default)]
    pub is_sports: bool,
    #[serde(default)]
    pub is_kids: bool,
    #[serde(default)]
    pub is_news: bool,
    /// Home videos get their own page under the experimental layout.
    #[serde(default)]
    pub experimental_layout: bool,
}

const DETAIL_TYPES: &[&str] = &[
    "Playlist",
    "TvChannel",
    "Program",
    "BoxSet",
    "MusicAlbum",
    "MusicGenre",
    "Person",
    "Recording",
    "MusicArtist",
];

/// Map an item and its context to a hash-router url (`#/...`).
pub fn get_route_url(item: &RouteItem, options: &RouteOptions) -> Result<String> {
    match item {
        RouteItem::Named(name) => named_url(name, options),
        RouteItem::Item(item) => Ok(item_url(item, options)),
    }
}

fn opt(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or_default()
}

fn named_url(name: &str, options: &RouteOptions) -> Result<String> {
    let server_id = opt(&options.server_id);
    let url = match name {
        "settings" => "#/mypreferencesmenu".to_string(),
        "wizard" => "#/wizard/start".to_string(),
        "manageserver" => "#/dashboard".to_string(),
        "recordedtv" => format!("#/livetv?tab=3&serverId={}", server_id),
        "nextup" => format!("#/list?type=nextup&serverId={}", server_id),
        "list" => list_url(options),
        "livetv" => livetv_url(options),
        "tag" => {
            let mut url = format!(
                "#/list?type=tag&tag={}&serverId={}",
                encode_component(opt(&options.tag)),
                server_id
            );
            if let Some(parent) = &options.parent_id {
                url.push_str(&format!("&parentId={}", parent));
            }
            url
        }
        other => anyhow::bail!("unknown route target {:?}", other),
    };
    Ok(url)
}

fn list_url(options: &RouteOptions) -> String {
    let mut url = format!(
        "#/list?serverId={}&type={}",
        opt(&options.server_id),
        opt(&options.item_types)
    );
    let flags = [
        (options.is_favorite, "&IsFavorite=true"),
        (options.is_airing, "&IsAiring=true"),
        (options.is_movie, "&IsMovie=true"),
        (options.is_series, "&IsSeries=true&IsMovie=false&IsNews=false"),
        (options.is_sports, "&IsSports=true"),
        (options.is_kids, "&IsKids=true"),
        (options.is_news, "&IsNews=true"),
    ];
    for (set, suffix) in flags {
        if set {
            url.push_str(suffix);
        }
    }
    url
}

fn livetv_url(options: &RouteOptions) -> String {
    let server_id = opt(&options.server_id);
    let programs = |filter: &str| format!("#/list?type=Programs&{}&serverId={}", filter, server_id);
    let tab = |n: u8| format!("#/livetv?tab={}&serverId={}", n, server_id);
    match options.section.as_deref() {
        Some("programs") => tab(0),
        Some("guide") => tab(1),
        Some("channels") => tab(2),
        Some("dvrschedule") => tab(4),
        Some("seriesrecording") => tab(5),
        Some("movies") => programs("IsMovie=true"),
        Some("shows") => programs("IsSeries=true&IsMovie=false&IsNews=false"),
        Some("sports") => programs("IsSports=true"),
        Some("kids") => programs("IsKids=true"),
        Some("news") => programs("IsNews=true"),
        Some("onnow") => programs("IsAiring=true"),
        _ => format!("#/livetv?serverId={}", server_id),
    }
}

fn item_url(item: &ItemRef, options: &RouteOptions) -> String {
    if let Some(url) = &item.url {
        return url.clone();
    }

    let context = options.context.as_deref();
    let id = item.id.as_deref().or(item.item_id.as_deref()).unwrap_or_default();
    let item_type = item
        .item_type
        .as_deref()
        .or(options.item_type.as_deref())
        .unwrap_or_default();
    let server_id = item
        .server_id
        .as_deref()
        .or(options.server_id.as_deref())
        .unwrap_or_default();
    let collection_type = item.collection_type.as_deref();
    let with_parent = |mut url: String| {
        if let Some(parent) = &options.parent_id {
            url.push_str(&format!("&parentId={}", parent));
        }
        url
    };

    if item_type == "SeriesTimer" {
        return format!("#/details?seriesTimerId={}&serverId={}", id, server_id);
    }
    if collection_type == Some("livetv") {
        return "#/livetv?collectionType=livetv".to_string();
    }

    match item.item_type.as_deref() {
        Some("Genre") => {
            let mut url = format!("#/list?genreId={}&serverId={}", id, server_id);
            if context == Some("livetv") {
                url.push_str("&type=Programs");
            }
            return with_parent(url);
        }
        Some("MusicGenre") => {
            return with_parent(format!("#/list?musicGenreId={}&serverId={}", id, server_id));
        }
        Some("Studio") => {
            return with_parent(format!("#/list?studioId={}&serverId={}", id, server_id));
        }
        _ => {}
    }

    if context != Some("folders") && !item.is_local() {
        let latest = options.section.as_deref() == Some("latest");
        let page = match collection_type {
            Some("movies") => Some("movies"),
            Some("tvshows") => Some("tv"),
            Some("music") => Some("music"),
            _ => None,
        };
        if let (Some(page), Some(collection)) = (page, collection_type) {
            let mut url = format!("#/{}?topParentId={}&collectionType={}", page, id, collection);
            if latest {
                url.push_str("&tab=1");
            }
            return url;
        }
        if options.experimental_layout && collection_type == Some("homevideos") {
            return format!("#/homevideos?topParentId={}", id);
        }
    }

    if DETAIL_TYPES.contains(&item_type) {
        return format!("#/details?id={}&serverId={}", id, server_id);
    }

    if matches!(item_type, "Series" | "Season" | "Episode") {
        let context_suffix = context
            .map(|c| format!("&context={}", c))
            .unwrap_or_default();
        return format!("#/details?id={}{}&serverId={}", id, context_suffix, server_id);
    }

    if item.is_folder {
        if id.is_empty() {
            return "#".to_string();
        }
        return format!("#/list?parentId={}&serverId={}", id, server_id);
    }

    format!("#/details?id={}&serverId={}", id, server_id)
}

#[cfg(test)]
#[path = "../tests/router/route_url_tests.rs"]
mod tests;
