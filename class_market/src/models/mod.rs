//! Data models shared by the backend API, the session store and the views.
//!
//! Every record mirrors the backend's camelCase JSON through explicit serde
//! renames. Normalization (role case-folding, lenient image fields, field
//! defaults) happens here, at the boundary, so views never second-guess the
//! shape of a payload.

pub mod application;
pub mod cart;
pub mod course;
pub mod identity;
pub mod payment;
pub mod profile;

pub use application::{ApplicationStatus, InstructorApplication, NewApplication};
pub use cart::{CartEntry, CartItem, NewCartItem, cart_total};
pub use course::{ClassStatus, ClassSubmission, Course, CourseForm, Lesson, Module, StatusChange};
pub use identity::Identity;
pub use payment::{PaymentIntent, PaymentIntentRequest, PaymentRecord};
pub use profile::{AppProfile, Role, UserRecord};

/// Backend document identifier (`_id`).
pub type RecordId = String;
