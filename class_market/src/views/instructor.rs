//! Instructor dashboard: add, list, update and delete classes.

use super::{Confirm, ViewContext, ViewError, ViewResult, require_role};
use crate::{
    fetch::{Loadable, Resource},
    models::{AppProfile, ClassStatus, Course, CourseForm, Role},
    net::WriteAck,
    upload::ImageHost,
    validation::{ValidationError, validate_image},
};
use log::info;

/// An image picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Submit a new class. It always starts out pending.
///
/// The form and the image are validated before anything is uploaded.
pub async fn add_class(
    ctx: &ViewContext,
    host: &dyn ImageHost,
    viewer: &AppProfile,
    form: &CourseForm,
    image: Option<&ImageFile>,
) -> ViewResult<WriteAck> {
    require_role(viewer, Role::Instructor, "Only instructors can add classes")?;
    form.validate()?;
    let image = image.ok_or(ValidationError::Required("image"))?;
    validate_image(&image.name, &image.bytes)?;

    let url = host.upload(&image.name, &image.bytes).await?;
    let ack = ctx
        .call(ctx.api().create_class(&form.submission(viewer, url)))
        .await?;
    info!("{} submitted class '{}' for review", viewer.email, form.name.trim());
    Ok(ack)
}

/// Edit one of the viewer's classes; a new image is optional.
pub async fn update_class(
    ctx: &ViewContext,
    host: &dyn ImageHost,
    viewer: &AppProfile,
    existing: &Course,
    form: &CourseForm,
    image: Option<&ImageFile>,
) -> ViewResult<WriteAck> {
    require_owner(viewer, existing)?;
    form.validate()?;

    let url = match image {
        Some(image) => {
            validate_image(&image.name, &image.bytes)?;
            Some(host.upload(&image.name, &image.bytes).await?)
        }
        None => None,
    };
    let ack = ctx
        .call(ctx.api().update_class(&existing.id, &form.update(existing, url)))
        .await?;
    info!("{} updated class {}", viewer.email, existing.id);
    Ok(ack)
}

fn require_owner(viewer: &AppProfile, course: &Course) -> ViewResult<()> {
    require_role(viewer, Role::Instructor, "Only instructors can edit classes")?;
    if !course.instructor_email.eq_ignore_ascii_case(&viewer.email) {
        return Err(ViewError::NotPermitted("You can only change your own classes"));
    }
    Ok(())
}

/// The viewer's classes in every status, or only the approved ones.
pub struct MyClassesView {
    ctx: ViewContext,
    viewer: AppProfile,
    approved_only: bool,
    classes: Resource<Vec<Course>>,
}

impl MyClassesView {
    pub fn new(ctx: ViewContext, viewer: &AppProfile) -> Self {
        Self {
            ctx,
            viewer: viewer.clone(),
            approved_only: false,
            classes: Resource::new(),
        }
    }

    /// The "approved classes" page.
    pub fn approved(ctx: ViewContext, viewer: &AppProfile) -> Self {
        Self {
            approved_only: true,
            ..Self::new(ctx, viewer)
        }
    }

    pub fn refresh(&mut self) {
        let ctx = self.ctx.clone();
        let email = self.viewer.email.clone();
        let approved_only = self.approved_only;
        self.classes.start(async move {
            ctx.call(ctx.api().instructor_classes(&email))
                .await
                .map(|classes| {
                    classes
                        .into_iter()
                        .filter(|c| !approved_only || c.status == ClassStatus::Approved)
                        .collect()
                })
                .map_err(|e| e.client_message())
        });
    }

    pub fn state(&self) -> Loadable<Vec<Course>> {
        self.classes.state()
    }

    pub async fn settled(&self) -> Loadable<Vec<Course>> {
        self.classes.settled().await
    }

    /// Delete one of the listed classes after confirmation, then refetch.
    /// A list still loading is waited for before the lookup.
    pub async fn delete(&mut self, class_id: &str, confirm: &dyn Confirm) -> ViewResult<()> {
        let listed = self.classes.settled().await;
        let course = listed
            .loaded()
            .and_then(|classes| classes.iter().find(|c| c.id == class_id).cloned())
            .ok_or_else(|| {
                ViewError::Validation(ValidationError::Invalid {
                    field: "class",
                    reason: format!("{class_id} is not one of your classes"),
                })
            })?;
        require_owner(&self.viewer, &course)?;

        if !confirm.confirm(&format!("Delete '{}'? This cannot be undone.", course.name)) {
            return Err(ViewError::Cancelled);
        }

        self.ctx.call(self.ctx.api().delete_class(class_id)).await?;
        info!("{} deleted class {}", self.viewer.email, class_id);
        self.refresh();
        Ok(())
    }
}
