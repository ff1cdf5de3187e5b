//! Role → dashboard landing route.

use super::route::Route;
use crate::models::Role;

/// Picks the landing route for a role.
pub struct RoleDispatcher;

impl RoleDispatcher {
    /// Unknown roles land where students do.
    pub fn landing(role: &Role) -> Route {
        match role {
            Role::Admin => Route::ManageClasses,
            Role::Instructor => Route::MyClasses,
            Role::User | Role::Unknown(_) => Route::EnrolledClasses,
        }
    }

    /// Where a signed-in user asking for `requested` should end up: the bare
    /// dashboard resolves to the landing route, and another role's sub-tree
    /// redirects to this role's landing route.
    pub fn resolve(role: &Role, requested: &Route) -> Route {
        match requested {
            Route::Dashboard => Self::landing(role),
            route => match route.required_role() {
                Some(required) if required != role.effective() => Self::landing(role),
                _ => route.clone(),
            },
        }
    }
}
