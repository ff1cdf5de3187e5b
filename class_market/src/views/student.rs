//! Student dashboard: enrolled classes, payment history, the course player
//! and the instructor application form.

use super::{ViewContext, ViewError, ViewResult, require_role};
use crate::{
    fetch::{Loadable, Resource},
    models::{AppProfile, ApplicationStatus, Course, Lesson, NewApplication, PaymentRecord, Role},
    net::WriteAck,
    progress::{LessonRef, ProgressStore},
    validation::{ValidationError, require},
};
use chrono::Utc;
use log::info;
use std::{collections::BTreeSet, sync::Arc};

pub struct EnrolledView {
    ctx: ViewContext,
    email: String,
    classes: Resource<Vec<Course>>,
}

impl EnrolledView {
    pub fn new(ctx: ViewContext, viewer: &AppProfile) -> Self {
        Self {
            ctx,
            email: viewer.email.clone(),
            classes: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        let email = self.email.clone();
        self.classes.start(async move {
            ctx.call(ctx.api().enrolled_classes(&email))
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
}

/// Payments, newest first.
pub struct PaymentHistoryView {
    ctx: ViewContext,
    email: String,
    payments: Resource<Vec<PaymentRecord>>,
}

impl PaymentHistoryView {
    pub fn new(ctx: ViewContext, viewer: &AppProfile) -> Self {
        Self {
            ctx,
            email: viewer.email.clone(),
            payments: Resource::new(),
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        let email = self.email.clone();
        self.payments.start(async move {
            ctx.call(ctx.api().payments(&email))
                .await
                .map(|mut payments| {
                    payments.sort_by(|a, b| b.date.cmp(&a.date));
                    payments
                })
                .map_err(|e| e.client_message())
        });
    }

    pub fn state(&self) -> Loadable<Vec<PaymentRecord>> {
        self.payments.state()
    }

    pub async fn settled(&self) -> Loadable<Vec<PaymentRecord>> {
        self.payments.settled().await
    }
}

/// Plays an enrolled course and tracks which lessons are done.
pub struct CoursePlayer {
    ctx: ViewContext,
    email: String,
    course_id: String,
    progress: Arc<ProgressStore>,
    course: Resource<Course>,
}

impl CoursePlayer {
    pub fn new(ctx: ViewContext, viewer: &AppProfile, course_id: impl Into<String>, progress: Arc<ProgressStore>) -> Self {
        Self {
            ctx,
            email: viewer.email.clone(),
            course_id: course_id.into(),
            progress,
            course: Resource::new(),
        }
    }

    /// Loads the course, refusing classes the viewer is not enrolled in.
    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        let email = self.email.clone();
        let id = self.course_id.clone();
        self.course.start(async move {
            load_enrolled_course(&ctx, &email, &id)
                .await
                .map_err(|e| e.client_message())
        });
    }

    pub fn state(&self) -> Loadable<Course> {
        self.course.state()
    }

    pub async fn settled(&self) -> Loadable<Course> {
        self.course.settled().await
    }

    pub fn lesson(&self, at: LessonRef) -> Option<Lesson> {
        self.course
            .state()
            .loaded()
            .and_then(|c| c.modules.get(at.0))
            .and_then(|m| m.lessons.get(at.1))
            .cloned()
    }

    pub fn completed(&self) -> BTreeSet<LessonRef> {
        self.progress.completed(&self.email, &self.course_id)
    }

    pub fn toggle_complete(&self, at: LessonRef) -> ViewResult<bool> {
        if self.lesson(at).is_none() {
            return Err(ValidationError::Invalid {
                field: "lesson",
                reason: format!("no lesson {}.{}", at.0 + 1, at.1 + 1),
            }
            .into());
        }
        Ok(self.progress.toggle(&self.email, &self.course_id, at)?)
    }

    pub fn percent(&self) -> u8 {
        self.course
            .state()
            .loaded()
            .map_or(0, |c| self.progress.percent(&self.email, c))
    }
}

async fn load_enrolled_course(ctx: &ViewContext, email: &str, id: &str) -> ViewResult<Course> {
    let enrolled = ctx.call(ctx.api().enrolled_classes(email)).await?;
    enrolled
        .into_iter()
        .find(|c| c.id == id)
        .ok_or(ViewError::NotPermitted("You are not enrolled in this class"))
}

/// Apply-as-instructor form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationForm {
    pub title: String,
    pub experience: String,
}

/// Submit an instructor application for a student.
pub async fn apply_instructor(ctx: &ViewContext, viewer: &AppProfile, form: &ApplicationForm) -> ViewResult<WriteAck> {
    require_role(viewer, Role::User, "Only students can apply to teach")?;
    require("title", &form.title)?;
    require("experience", &form.experience)?;

    let application = NewApplication {
        name: viewer.name.clone(),
        email: viewer.email.clone(),
        title: form.title.trim().to_string(),
        experience: form.experience.trim().to_string(),
        status: ApplicationStatus::Pending,
        submitted_at: Utc::now(),
    };
    let ack = ctx.call(ctx.api().submit_application(&application)).await?;
    info!("Instructor application submitted by {}", viewer.email);
    Ok(ack)
}
