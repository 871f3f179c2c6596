mod connection;
mod route;
mod server;

pub use self::connection::{ConnectionResult, ConnectionState};
pub use self::route::{
    ContentPath, ControllerId, CurrentRouteInfo, NavigationRequest, RouteDescriptor, RouteType,
};
pub use self::server::{
    AuthenticationResult, ConnectionMode, Credentials, PublicSystemInfo, ServerInfo, SystemInfo,
    UserDto, UserPolicy,
};
