//! Routing: the route table, the guard in front of `/dashboard`, and the
//! per-role landing dispatch.

pub mod dispatch;
pub mod guard;
pub mod route;

pub use dispatch::RoleDispatcher;
pub use guard::{GuardDecision, GuardState, Navigation, Navigator, RouteGuard};
pub use route::Route;
