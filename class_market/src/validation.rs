//! Form-level validation, checked client-side before anything is submitted.

use thiserror::Error;

/// Largest image accepted for upload (2 MiB).
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Minimum password length accepted by the sign-up form.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required field left empty
    #[error("{0} is required")]
    Required(&'static str),

    /// Field present but not acceptable
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// Password does not meet the sign-up rules
    #[error("Password too weak: {0}")]
    WeakPassword(&'static str),

    /// Password and confirmation differ
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Image format not supported
    #[error("Unsupported image type '{0}'. Use PNG, JPEG, GIF or WebP")]
    UnsupportedImage(String),

    /// Image over the size limit
    #[error("Image is {size} bytes, the limit is {limit} bytes")]
    ImageTooLarge { size: usize, limit: usize },
}

/// Result type for validation checks
pub type ValidationResult<T> = Result<T, ValidationError>;

pub fn require(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

/// Loose shape check; the identity provider has the final word.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    require("email", email)?;
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::Invalid {
            field: "email",
            reason: format!("'{email}' is not an email address"),
        })
    }
}

/// Sign-up password rules: length, an uppercase letter and a special character.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::WeakPassword("must be at least 6 characters"));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::WeakPassword("must contain an uppercase letter"));
    }
    if !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        return Err(ValidationError::WeakPassword("must contain a special character"));
    }
    Ok(())
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> ValidationResult<()> {
    if password == confirmation {
        Ok(())
    } else {
        Err(ValidationError::PasswordMismatch)
    }
}

/// Image type guessed from the file name, as a MIME type.
pub fn image_mime(file_name: &str) -> ValidationResult<&'static str> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        _ => Err(ValidationError::UnsupportedImage(file_name.to_string())),
    }
}

pub fn validate_image(file_name: &str, bytes: &[u8]) -> ValidationResult<&'static str> {
    let mime = image_mime(file_name)?;
    if bytes.is_empty() {
        return Err(ValidationError::Required("image"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge {
            size: bytes.len(),
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(mime)
}
