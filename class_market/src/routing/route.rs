//! Client routes.

use crate::models::{RecordId, Role};
use std::fmt;

/// Every location the client can show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    // Public
    Home,
    Classes,
    ClassDetail(RecordId),
    Instructors,
    Login,
    Register,

    // Any signed-in user
    Dashboard,
    Profile,

    // Students
    SelectedClasses,
    EnrolledClasses,
    PaymentHistory,
    Checkout,
    CoursePlayer(RecordId),
    ApplyInstructor,

    // Instructors
    AddClass,
    MyClasses,
    ApprovedClasses,
    UpdateClass(RecordId),

    // Admins
    ManageClasses,
    ManageUsers,
    Applications,

    NotFound(String),
}

impl Route {
    /// Parse a path. Query strings, fragments and trailing slashes are ignored;
    /// anything unrecognized is [`Route::NotFound`].
    pub fn parse(path: &str) -> Self {
        let trimmed = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["classes"] => Route::Classes,
            ["classes", id] => Route::ClassDetail(id.to_string()),
            ["instructors"] => Route::Instructors,
            ["login"] => Route::Login,
            ["register"] | ["signup"] => Route::Register,
            ["dashboard"] => Route::Dashboard,
            ["dashboard", rest @ ..] => match rest {
                ["profile"] => Route::Profile,
                ["selected-classes"] => Route::SelectedClasses,
                ["enrolled-classes"] => Route::EnrolledClasses,
                ["payment-history"] => Route::PaymentHistory,
                ["checkout"] => Route::Checkout,
                ["course", id] => Route::CoursePlayer(id.to_string()),
                ["apply-instructor"] => Route::ApplyInstructor,
                ["add-class"] => Route::AddClass,
                ["my-classes"] => Route::MyClasses,
                ["approved-classes"] => Route::ApprovedClasses,
                ["update-class", id] => Route::UpdateClass(id.to_string()),
                ["manage-classes"] => Route::ManageClasses,
                ["manage-users"] => Route::ManageUsers,
                ["applications"] => Route::Applications,
                _ => Route::NotFound(trimmed.to_string()),
            },
            _ => Route::NotFound(trimmed.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Classes => "/classes".to_string(),
            Route::ClassDetail(id) => format!("/classes/{id}"),
            Route::Instructors => "/instructors".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Profile => "/dashboard/profile".to_string(),
            Route::SelectedClasses => "/dashboard/selected-classes".to_string(),
            Route::EnrolledClasses => "/dashboard/enrolled-classes".to_string(),
            Route::PaymentHistory => "/dashboard/payment-history".to_string(),
            Route::Checkout => "/dashboard/checkout".to_string(),
            Route::CoursePlayer(id) => format!("/dashboard/course/{id}"),
            Route::ApplyInstructor => "/dashboard/apply-instructor".to_string(),
            Route::AddClass => "/dashboard/add-class".to_string(),
            Route::MyClasses => "/dashboard/my-classes".to_string(),
            Route::ApprovedClasses => "/dashboard/approved-classes".to_string(),
            Route::UpdateClass(id) => format!("/dashboard/update-class/{id}"),
            Route::ManageClasses => "/dashboard/manage-classes".to_string(),
            Route::ManageUsers => "/dashboard/manage-users".to_string(),
            Route::Applications => "/dashboard/applications".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    /// Everything under `/dashboard` needs a signed-in identity, including
    /// paths there that match no page.
    pub fn is_protected(&self) -> bool {
        match self {
            Route::Home
            | Route::Classes
            | Route::ClassDetail(_)
            | Route::Instructors
            | Route::Login
            | Route::Register => false,
            Route::NotFound(path) => path.starts_with("/dashboard/"),
            _ => true,
        }
    }

    /// Role whose sub-tree this route belongs to, if any.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::SelectedClasses
            | Route::EnrolledClasses
            | Route::PaymentHistory
            | Route::Checkout
            | Route::CoursePlayer(_)
            | Route::ApplyInstructor => Some(Role::User),
            Route::AddClass | Route::MyClasses | Route::ApprovedClasses | Route::UpdateClass(_) => {
                Some(Role::Instructor)
            }
            Route::ManageClasses | Route::ManageUsers | Route::Applications => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl From<&str> for Route {
    fn from(path: &str) -> Self {
        Route::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_public_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/classes"), Route::Classes);
        assert_eq!(Route::parse("/classes/abc123"), Route::ClassDetail("abc123".into()));
        assert_eq!(Route::parse("/login?next=1"), Route::Login);
        assert_eq!(Route::parse("/signup"), Route::Register);
    }

    #[test]
    fn test_parse_dashboard_routes() {
        assert_eq!(Route::parse("/dashboard/"), Route::Dashboard);
        assert_eq!(Route::parse("/dashboard/my-classes"), Route::MyClasses);
        assert_eq!(Route::parse("/dashboard/course/c9"), Route::CoursePlayer("c9".into()));
        assert_eq!(Route::parse("/dashboard/update-class/c9"), Route::UpdateClass("c9".into()));
    }

    #[test]
    fn test_unknown_paths() {
        assert_eq!(Route::parse("/nowhere"), Route::NotFound("/nowhere".into()));
        assert_eq!(
            Route::parse("/dashboard/secret"),
            Route::NotFound("/dashboard/secret".into())
        );
        assert!(!Route::parse("/nowhere").is_protected());
        assert!(!Route::parse("/dashboards").is_protected());
        assert!(Route::parse("/dashboard/secret").is_protected());
        assert_eq!(Route::parse("/dashboard/secret").required_role(), None);
    }

    #[test]
    fn test_path_roundtrip() {
        let routes = [
            Route::Home,
            Route::ClassDetail("x".into()),
            Route::Profile,
            Route::Checkout,
            Route::CoursePlayer("y".into()),
            Route::UpdateClass("z".into()),
            Route::Applications,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn test_protection_and_roles() {
        assert!(!Route::Classes.is_protected());
        assert!(Route::Dashboard.is_protected());
        assert!(Route::Profile.is_protected());
        assert_eq!(Route::Profile.required_role(), None);
        assert_eq!(Route::Checkout.required_role(), Some(Role::User));
        assert_eq!(Route::AddClass.required_role(), Some(Role::Instructor));
        assert_eq!(Route::ManageUsers.required_role(), Some(Role::Admin));
    }
}
