//! Admin dashboard: class moderation, user roles and instructor applications.

use super::{ViewContext, ViewError, ViewResult, require_role};
use crate::{
    fetch::{Loadable, Resource},
    models::{AppProfile, ApplicationStatus, ClassStatus, Course, InstructorApplication, Role, StatusChange, UserRecord},
    net::WriteAck,
};
use log::info;

const ADMIN_ONLY: &str = "Only admins can do this";

/// Every class, for moderation.
pub struct ManageClassesView {
    ctx: ViewContext,
    viewer: AppProfile,
    classes: Resource<Vec<Course>>,
}

impl ManageClassesView {
    pub fn new(ctx: ViewContext, viewer: &AppProfile) -> Self {
        Self {
            ctx,
            viewer: viewer.clone(),
            classes: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        self.classes.start(async move {
            ctx.call(ctx.api().all_classes())
                .await
                .map_err(|e| e.client_message())
        });
    }

    pub fn state(&self) -> Loadable<Vec<Course>> {
        self.classes.state()
    }

    pub async fn settled(&self) -> Loadable<Vec<Course>> {
        self.classes.settled().await
    }

    pub async fn approve(&mut self, class_id: &str) -> ViewResult<WriteAck> {
        self.moderate(class_id, ClassStatus::Approved, None).await
    }

    pub async fn reject(&mut self, class_id: &str, feedback: Option<&str>) -> ViewResult<WriteAck> {
        self.moderate(class_id, ClassStatus::Rejected, feedback).await
    }

    /// Only pending classes move; the current status is re-read from the backend.
    async fn moderate(&mut self, class_id: &str, to: ClassStatus, feedback: Option<&str>) -> ViewResult<WriteAck> {
        require_role(&self.viewer, Role::Admin, ADMIN_ONLY)?;
        let current = self.ctx.call(self.ctx.api().class(class_id)).await?;
        if !current.status.can_transition_to(to) {
            return Err(ViewError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        let change = StatusChange {
            status: to,
            feedback: feedback
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        };
        let ack = self
            .ctx
            .call(self.ctx.api().set_class_status(class_id, &change))
            .await?;
        info!("Class {} is now {}", class_id, to);
        self.refresh();
        Ok(ack)
    }
}

/// Every user, with role changes.
pub struct ManageUsersView {
    ctx: ViewContext,
    viewer: AppProfile,
    users: Resource<Vec<UserRecord>>,
}

impl ManageUsersView {
    pub fn new(ctx: ViewContext, viewer: &AppProfile) -> Self {
        Self {
            ctx,
            viewer: viewer.clone(),
            users: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        self.users.start(async move {
            ctx.call(ctx.api().users())
                .await
                .map_err(|e| e.client_message())
        });
    }

    pub fn state(&self) -> Loadable<Vec<UserRecord>> {
        self.users.state()
    }

    pub async fn settled(&self) -> Loadable<Vec<UserRecord>> {
        self.users.settled().await
    }

    pub async fn make_admin(&mut self, user_id: &str) -> ViewResult<WriteAck> {
        self.set_role(user_id, Role::Admin).await
    }

    pub async fn make_instructor(&mut self, user_id: &str) -> ViewResult<WriteAck> {
        self.set_role(user_id, Role::Instructor).await
    }

    async fn set_role(&mut self, user_id: &str, role: Role) -> ViewResult<WriteAck> {
        require_role(&self.viewer, Role::Admin, ADMIN_ONLY)?;
        if let Some(user) = self
            .users
            .state()
            .loaded()
            .and_then(|users| users.iter().find(|u| u.id.as_deref() == Some(user_id)))
            && user.role == role
        {
            return Ok(WriteAck::default());
        }

        let ack = self
            .ctx
            .call(self.ctx.api().set_user_role(user_id, &role))
            .await?;
        info!("User {} is now {}", user_id, role);
        self.refresh();
        Ok(ack)
    }
}

/// Instructor applications.
pub struct ApplicationsView {
    ctx: ViewContext,
    viewer: AppProfile,
    applications: Resource<Vec<InstructorApplication>>,
}

impl ApplicationsView {
    pub fn new(ctx: ViewContext, viewer: &AppProfile) -> Self {
        Self {
            ctx,
            viewer: viewer.clone(),
            applications: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        self.applications.start(async move {
            ctx.call(ctx.api().applications())
                .await
                .map_err(|e| e.client_message())
        });
    }

    pub fn state(&self) -> Loadable<Vec<InstructorApplication>> {
        self.applications.state()
    }

    pub async fn settled(&self) -> Loadable<Vec<InstructorApplication>> {
        self.applications.settled().await
    }

    /// Approve: the applicant becomes an instructor, then the application is closed.
    pub async fn approve(&mut self, application: &InstructorApplication) -> ViewResult<WriteAck> {
        require_role(&self.viewer, Role::Admin, ADMIN_ONLY)?;
        let user = self
            .ctx
            .call(self.ctx.api().user(&application.email))
            .await?
            .ok_or(ViewError::NotPermitted("Applicant has no account"))?;
        let user_id = user
            .id
            .ok_or(ViewError::NotPermitted("Applicant has no account"))?;

        self.ctx
            .call(self.ctx.api().set_user_role(&user_id, &Role::Instructor))
            .await?;
        self.decide(application, ApplicationStatus::Approved).await
    }

    pub async fn reject(&mut self, application: &InstructorApplication) -> ViewResult<WriteAck> {
        require_role(&self.viewer, Role::Admin, ADMIN_ONLY)?;
        self.decide(application, ApplicationStatus::Rejected).await
    }

    async fn decide(&mut self, application: &InstructorApplication, status: ApplicationStatus) -> ViewResult<WriteAck> {
        let ack = self
            .ctx
            .call(self.ctx.api().decide_application(&application.id, status))
            .await?;
        info!("Application {} from {} {}", application.id, application.email, status);
        self.refresh();
        Ok(ack)
    }
}
