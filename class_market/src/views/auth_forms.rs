//! Sign-in and registration forms.

use super::{ViewContext, ViewResult};
use crate::{
    models::{Identity, UserRecord},
    validation::{require, validate_email, validate_password, validate_password_confirmation},
};
use log::{info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub photo_url: Option<String>,
}

impl RegisterForm {
    pub fn validate(&self) -> ViewResult<()> {
        require("name", &self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_password_confirmation(&self.password, &self.confirm_password)?;
        Ok(())
    }
}

pub async fn login(ctx: &ViewContext, form: &LoginForm) -> ViewResult<Identity> {
    validate_email(&form.email)?;
    require("password", &form.password)?;
    Ok(ctx.session().login(&form.email, &form.password).await?)
}

pub async fn google_login(ctx: &ViewContext, google_id_token: &str) -> ViewResult<Identity> {
    require("Google token", google_id_token)?;
    let identity = ctx.session().google_login(google_id_token).await?;
    save_user_record(ctx, &identity).await;
    Ok(identity)
}

/// Create the account, set its profile and save the backend user record as
/// a student.
pub async fn register(ctx: &ViewContext, form: &RegisterForm) -> ViewResult<Identity> {
    form.validate()?;
    ctx.session().sign_up(&form.email, &form.password).await?;
    let photo = form
        .photo_url
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let identity = ctx.session().update_user(form.name.trim(), photo).await?;
    save_user_record(ctx, &identity).await;
    info!("Registered {}", form.email.trim());
    Ok(identity)
}

/// Best effort: the backend ignores users it already knows, and a missing
/// record only means the profile falls back to the identity.
async fn save_user_record(ctx: &ViewContext, identity: &Identity) {
    let Some(email) = identity.email() else {
        return;
    };
    let record = UserRecord::new_student(email, &identity.label(), identity.photo_url.clone());
    if let Err(e) = ctx.api().save_user(&record).await {
        warn!("Could not save user record for {}: {}", email, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{validation::ValidationError, views::ViewError};

    fn form() -> RegisterForm {
        RegisterForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "Secret!1".into(),
            confirm_password: "Secret!1".into(),
            photo_url: None,
        }
    }

    #[test]
    fn test_register_form_valid() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_register_form_mismatch() {
        let mut f = form();
        f.confirm_password = "Secret!2".into();
        assert!(matches!(
            f.validate(),
            Err(ViewError::Validation(ValidationError::PasswordMismatch))
        ));
    }

    #[test]
    fn test_register_form_requires_name() {
        let mut f = form();
        f.name = " ".into();
        assert!(matches!(
            f.validate(),
            Err(ViewError::Validation(ValidationError::Required("name")))
        ));
    }
}
