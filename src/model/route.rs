use std::fmt;
use std::sync::Arc;

/// Page types the router treats specially.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RouteType {
    #[default]
    Page,
    Home,
    Login,
    SelectServer,
}

impl RouteType {
    /// Pages of "no return": going back from them means leaving the app.
    pub fn is_start_page(self) -> bool {
        matches!(self, Self::Home | Self::Login | Self::SelectServer)
    }
}

/// Key into the controller registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ControllerId(pub &'static str);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Where a route's view content comes from.
#[derive(Clone, Debug)]
pub enum ContentPath {
    Fixed(String),
    /// Computed from the request query string.
    FromQuery(fn(&str) -> String),
}

impl ContentPath {
    pub fn resolve(&self, querystring: &str) -> String {
        match self {
            Self::Fixed(p) => p.clone(),
            Self::FromQuery(f) => f(querystring),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RouteDescriptor {
    pub path: String,
    pub route_type: RouteType,
    pub anonymous: bool,
    pub startup: bool,
    pub is_default_route: bool,
    pub roles: Option<String>,
    pub controller: Option<ControllerId>,
    pub content_path: Option<ContentPath>,
    pub server_request: bool,
    pub enable_content_query_string: bool,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            route_type: RouteType::Page,
            anonymous: false,
            startup: false,
            is_default_route: false,
            roles: None,
            controller: None,
            content_path: None,
            server_request: false,
            enable_content_query_string: false,
        }
    }

    pub fn with_type(mut self, route_type: RouteType) -> Self {
        self.route_type = route_type;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn startup(mut self) -> Self {
        self.startup = true;
        self
    }

    pub fn default_route(mut self) -> Self {
        self.is_default_route = true;
        self
    }

    pub fn with_roles(mut self, roles: impl Into<String>) -> Self {
        self.roles = Some(roles.into());
        self
    }

    pub fn with_controller(mut self, id: ControllerId) -> Self {
        self.controller = Some(id);
        self
    }

    pub fn with_content(mut self, content: ContentPath) -> Self {
        self.content_path = Some(content);
        self
    }

    pub fn server_request(mut self) -> Self {
        self.server_request = true;
        self
    }

    pub fn with_content_query_string(mut self) -> Self {
        self.enable_content_query_string = true;
        self
    }

    /// Declared roles, trimmed, empty entries skipped.
    pub fn required_roles(&self) -> Vec<&str> {
        self.roles
            .as_deref()
            .map(|r| r.split(',').map(str::trim).filter(|r| !r.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Content location before base-path handling.
    pub fn content_url(&self, querystring: &str) -> String {
        let mut url = match &self.content_path {
            Some(content) => content.resolve(querystring),
            None => self.path.clone(),
        };
        if !querystring.is_empty() && self.enable_content_query_string {
            url.push('?');
            url.push_str(querystring);
        }
        url
    }
}

/// One router dispatch, consumed by the gate and then the view loader.
#[derive(Clone, Debug)]
pub struct NavigationRequest {
    /// Pathname plus `?query`, as shown in the location bar.
    pub path: String,
    pub pathname: String,
    /// Query string without the leading `?`.
    pub querystring: String,
    pub is_back: bool,
    pub route: Arc<RouteDescriptor>,
}

impl NavigationRequest {
    pub fn new(pathname: &str, querystring: &str, is_back: bool, route: Arc<RouteDescriptor>) -> Self {
        let path = if querystring.is_empty() {
            pathname.to_string()
        } else {
            format!("{}?{}", pathname, querystring)
        };
        Self {
            path,
            pathname: pathname.to_string(),
            querystring: querystring.to_string(),
            is_back,
            route,
        }
    }
}

/// The last route that finished loading.
#[derive(Clone, Debug)]
pub struct CurrentRouteInfo {
    pub route: Arc<RouteDescriptor>,
    pub path: String,
}

impl CurrentRouteInfo {
    pub fn pathname(&self) -> &str {
        self.path.split('?').next().unwrap_or_default()
    }
}
