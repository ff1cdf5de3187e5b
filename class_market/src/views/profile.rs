//! Profile page: change display name and photo.

use super::{ViewContext, ViewError, ViewResult, instructor::ImageFile};
use crate::{
    models::{AppProfile, Identity},
    upload::ImageHost,
    validation::require,
};
use log::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    /// New photo to upload; keeps the current one when absent.
    pub photo: Option<ImageFile>,
}

/// Update the identity provider profile, then the backend user record.
pub async fn update_profile(
    ctx: &ViewContext,
    host: &dyn ImageHost,
    viewer: &AppProfile,
    form: &ProfileForm,
) -> ViewResult<Identity> {
    require("name", &form.name)?;
    if ctx.session().current().is_none() {
        return Err(ViewError::NotSignedIn);
    }

    let photo_url = match &form.photo {
        Some(photo) => Some(host.upload(&photo.name, &photo.bytes).await?),
        None => viewer.photo_url.clone(),
    };

    let name = form.name.trim();
    let identity = ctx.session().update_user(name, photo_url.as_deref()).await?;
    ctx.call(
        ctx.api()
            .update_user_profile(&viewer.email, name, photo_url.as_deref()),
    )
    .await?;
    info!("Profile updated for {}", viewer.email);
    Ok(identity)
}
