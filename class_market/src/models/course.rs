//! Classes (courses), their content outline and moderation status.

use super::{RecordId, profile::AppProfile};
use crate::{
    upload::card_image,
    validation::{ValidationError, ValidationResult},
};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Moderation status of a class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ClassStatus {
    /// Only pending submissions are moderated.
    pub fn can_transition_to(self, next: ClassStatus) -> bool {
        matches!(
            (self, next),
            (ClassStatus::Pending, ClassStatus::Approved) | (ClassStatus::Pending, ClassStatus::Rejected)
        )
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassStatus::Pending => write!(f, "pending"),
            ClassStatus::Approved => write!(f, "approved"),
            ClassStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub title: String,
    #[serde(default)]
    pub video_link: String,
    /// Minutes.
    #[serde(default)]
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Class document as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_url")]
    pub image: Option<String>,
    #[serde(default)]
    pub instructor_name: String,
    #[serde(default)]
    pub instructor_email: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub available_seats: u32,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub status: ClassStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default)]
    pub total_enrolled: u32,
    #[serde(default)]
    pub total_lessons: u32,
    /// Minutes.
    #[serde(default)]
    pub total_duration: u32,
    /// Card image after checking that it loads; set by the views that show cards.
    #[serde(skip)]
    pub shown_image: Option<String>,
}

impl Course {
    /// Image for the class card: the checked image when there is one, else
    /// the stored URL with the missing-image fallback.
    pub fn card_image(&self) -> &str {
        match &self.shown_image {
            Some(shown) => shown.as_str(),
            None => card_image(self.image.as_deref()),
        }
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_seats == 0
    }

    /// Lesson count derived from the outline, falling back to the stored total.
    pub fn lesson_count(&self) -> u32 {
        let counted: usize = self.modules.iter().map(|m| m.lessons.len()).sum();
        if counted == 0 {
            self.total_lessons
        } else {
            counted as u32
        }
    }
}

/// Image URLs arrive as anything from a proper string to `null`, `""` or a
/// nested object; only a non-blank string is kept.
fn lenient_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(url) if !url.trim().is_empty() => Some(url.trim().to_string()),
        _ => None,
    })
}

/// Instructor input for creating or editing a class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseForm {
    pub name: String,
    pub price: f64,
    pub available_seats: u32,
    pub modules: Vec<Module>,
}

impl CourseForm {
    /// Form-level checks, run before anything is uploaded or submitted.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required("class name"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::Invalid {
                field: "price",
                reason: "must be a non-negative amount".to_string(),
            });
        }
        if self.available_seats == 0 {
            return Err(ValidationError::Invalid {
                field: "available seats",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.modules.is_empty() {
            return Err(ValidationError::Required("at least one module"));
        }
        for (m_idx, module) in self.modules.iter().enumerate() {
            if module.title.trim().is_empty() {
                return Err(ValidationError::Invalid {
                    field: "module title",
                    reason: format!("module {} has no title", m_idx + 1),
                });
            }
            if module.lessons.is_empty() {
                return Err(ValidationError::Invalid {
                    field: "lessons",
                    reason: format!("module '{}' has no lessons", module.title),
                });
            }
            for lesson in &module.lessons {
                if lesson.title.trim().is_empty() || lesson.video_link.trim().is_empty() {
                    return Err(ValidationError::Invalid {
                        field: "lesson",
                        reason: format!("every lesson in '{}' needs a title and a video link", module.title),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn total_lessons(&self) -> u32 {
        self.modules.iter().map(|m| m.lessons.len() as u32).sum()
    }

    pub fn total_duration(&self) -> u32 {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter())
            .map(|l| l.duration)
            .sum()
    }

    /// New-class payload; every submission starts out pending.
    pub fn submission(&self, instructor: &AppProfile, image: String) -> ClassSubmission {
        ClassSubmission {
            name: self.name.trim().to_string(),
            image,
            instructor_name: instructor.name.clone(),
            instructor_email: instructor.email.clone(),
            price: self.price,
            available_seats: self.available_seats,
            modules: self.modules.clone(),
            status: Some(ClassStatus::Pending),
            total_enrolled: Some(0),
            total_lessons: self.total_lessons(),
            total_duration: self.total_duration(),
        }
    }

    /// Edit payload; moderation status and enrollment are left untouched.
    pub fn update(&self, existing: &Course, image: Option<String>) -> ClassSubmission {
        ClassSubmission {
            name: self.name.trim().to_string(),
            image: image.or_else(|| existing.image.clone()).unwrap_or_default(),
            instructor_name: existing.instructor_name.clone(),
            instructor_email: existing.instructor_email.clone(),
            price: self.price,
            available_seats: self.available_seats,
            modules: self.modules.clone(),
            status: None,
            total_enrolled: None,
            total_lessons: self.total_lessons(),
            total_duration: self.total_duration(),
        }
    }

    pub fn from_course(course: &Course) -> Self {
        Self {
            name: course.name.clone(),
            price: course.price,
            available_seats: course.available_seats,
            modules: course.modules.clone(),
        }
    }
}

/// Body of `POST /classes` and `PUT /classes/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSubmission {
    pub name: String,
    pub image: String,
    pub instructor_name: String,
    pub instructor_email: String,
    pub price: f64,
    pub available_seats: u32,
    pub modules: Vec<Module>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ClassStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_enrolled: Option<u32>,
    pub total_lessons: u32,
    pub total_duration: u32,
}

/// Body of `PATCH /classes/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ClassStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}
