//! Route guard and navigation state.

use super::{dispatch::RoleDispatcher, route::Route};
use crate::models::{AppProfile, Identity, Role};
use log::debug;

/// What the guard knows about the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Session restore or role lookup still running.
    Loading,
    Unauthenticated,
    Authenticated(Role),
}

impl GuardState {
    /// `ready` is whether the session store finished restoring; `profile` is
    /// the resolved profile for `identity`, if resolution finished.
    pub fn derive(ready: bool, identity: Option<&Identity>, profile: Option<&AppProfile>) -> Self {
        match (ready, identity, profile) {
            (false, _, _) => GuardState::Loading,
            (true, None, _) => GuardState::Unauthenticated,
            (true, Some(_), None) => GuardState::Loading,
            (true, Some(_), Some(profile)) => GuardState::Authenticated(profile.role.clone()),
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show nothing yet; check again when the state changes.
    Wait,
    Allow,
    /// Go to `to` instead. `from` is the route to return to after sign-in.
    Redirect { to: Route, from: Option<Route> },
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn check(state: &GuardState, route: &Route) -> GuardDecision {
        match state {
            GuardState::Loading if route.is_protected() => GuardDecision::Wait,
            GuardState::Loading => GuardDecision::Allow,
            GuardState::Unauthenticated if route.is_protected() => GuardDecision::Redirect {
                to: Route::Login,
                from: Some(route.clone()),
            },
            GuardState::Unauthenticated => GuardDecision::Allow,
            GuardState::Authenticated(role) => {
                let resolved = RoleDispatcher::resolve(role, route);
                if &resolved == route {
                    GuardDecision::Allow
                } else {
                    GuardDecision::Redirect { to: resolved, from: None }
                }
            }
        }
    }
}

/// Result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Guard is waiting; the request is kept and retried by [`Navigator::settle`].
    Pending(Route),
    Arrived(Route),
}

/// Current location plus the route to return to after signing in.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
    requested: Option<Route>,
    return_to: Option<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            current: Route::Home,
            requested: None,
            return_to: None,
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn return_to(&self) -> Option<&Route> {
        self.return_to.as_ref()
    }

    pub fn navigate(&mut self, to: Route, state: &GuardState) -> Navigation {
        let mut target = to;
        // Dashboard dispatch plus one redirect is the longest chain.
        for _ in 0..3 {
            match RouteGuard::check(state, &target) {
                GuardDecision::Wait => {
                    debug!("Waiting for session before {}", target);
                    self.requested = Some(target.clone());
                    return Navigation::Pending(target);
                }
                GuardDecision::Allow => break,
                GuardDecision::Redirect { to, from } => {
                    debug!("Redirect {} -> {}", target, to);
                    if let Some(from) = from {
                        self.return_to = Some(from);
                    }
                    target = to;
                }
            }
        }
        self.requested = None;
        self.current = target.clone();
        Navigation::Arrived(target)
    }

    /// Re-run the guard after the state changed: a pending request is
    /// retried, and a signed-out viewer on a protected page is sent to sign in.
    pub fn settle(&mut self, state: &GuardState) -> Navigation {
        let target = self.requested.take().unwrap_or_else(|| self.current.clone());
        self.navigate(target, state)
    }

    /// After a successful sign-in: back to the remembered route, else home.
    pub fn after_login(&mut self, state: &GuardState) -> Navigation {
        let target = self.return_to.take().unwrap_or(Route::Home);
        self.navigate(target, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role) -> AppProfile {
        AppProfile {
            email: "a@b.c".into(),
            name: "A".into(),
            role,
            photo_url: None,
            is_from_auth: false,
        }
    }

    // === GuardState ===

    #[test]
    fn test_derive_states() {
        let identity = Identity::new("a@b.c");
        let admin = profile(Role::Admin);
        assert_eq!(GuardState::derive(false, Some(&identity), Some(&admin)), GuardState::Loading);
        assert_eq!(GuardState::derive(true, None, None), GuardState::Unauthenticated);
        assert_eq!(GuardState::derive(true, Some(&identity), None), GuardState::Loading);
        assert_eq!(
            GuardState::derive(true, Some(&identity), Some(&admin)),
            GuardState::Authenticated(Role::Admin)
        );
    }

    // === RouteGuard ===

    #[test]
    fn test_loading_waits_on_protected_routes() {
        assert_eq!(RouteGuard::check(&GuardState::Loading, &Route::Profile), GuardDecision::Wait);
        assert_eq!(RouteGuard::check(&GuardState::Loading, &Route::Classes), GuardDecision::Allow);
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        assert_eq!(
            RouteGuard::check(&GuardState::Unauthenticated, &Route::MyClasses),
            GuardDecision::Redirect {
                to: Route::Login,
                from: Some(Route::MyClasses)
            }
        );
        assert_eq!(
            RouteGuard::check(&GuardState::Unauthenticated, &Route::Home),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_authenticated_dashboard_dispatch() {
        let state = GuardState::Authenticated(Role::Instructor);
        assert_eq!(
            RouteGuard::check(&state, &Route::Dashboard),
            GuardDecision::Redirect {
                to: Route::MyClasses,
                from: None
            }
        );
    }

    // === Navigator ===

    #[test]
    fn test_dashboard_round_trip_through_login() {
        let mut nav = Navigator::new();

        let nav_result = nav.navigate(Route::Dashboard, &GuardState::Unauthenticated);
        assert_eq!(nav_result, Navigation::Arrived(Route::Login));
        assert_eq!(nav.return_to(), Some(&Route::Dashboard));

        let after = nav.after_login(&GuardState::Authenticated(Role::User));
        assert_eq!(after, Navigation::Arrived(Route::EnrolledClasses));
        assert_eq!(nav.return_to(), None);
    }

    #[test]
    fn test_after_login_without_return_goes_home() {
        let mut nav = Navigator::new();
        nav.navigate(Route::Login, &GuardState::Unauthenticated);
        assert_eq!(
            nav.after_login(&GuardState::Authenticated(Role::Admin)),
            Navigation::Arrived(Route::Home)
        );
    }

    #[test]
    fn test_pending_navigation_settles() {
        let mut nav = Navigator::new();
        assert_eq!(
            nav.navigate(Route::Checkout, &GuardState::Loading),
            Navigation::Pending(Route::Checkout)
        );
        assert_eq!(nav.current(), &Route::Home);

        assert_eq!(
            nav.settle(&GuardState::Authenticated(Role::User)),
            Navigation::Arrived(Route::Checkout)
        );
    }

    #[test]
    fn test_unknown_dashboard_path_needs_sign_in() {
        let missing = Route::parse("/dashboard/secret");
        let mut nav = Navigator::new();

        assert_eq!(
            nav.navigate(missing.clone(), &GuardState::Unauthenticated),
            Navigation::Arrived(Route::Login)
        );
        assert_eq!(nav.return_to(), Some(&missing));

        assert_eq!(
            nav.after_login(&GuardState::Authenticated(Role::User)),
            Navigation::Arrived(missing)
        );
    }

    #[test]
    fn test_sign_out_on_protected_page() {
        let mut nav = Navigator::new();
        nav.navigate(Route::ManageUsers, &GuardState::Authenticated(Role::Admin));
        assert_eq!(
            nav.settle(&GuardState::Unauthenticated),
            Navigation::Arrived(Route::Login)
        );
        assert_eq!(nav.return_to(), Some(&Route::ManageUsers));
    }
}
