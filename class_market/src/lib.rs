//! # Class Market
//!
//! Client core for an online class marketplace: students browse and buy
//! classes, instructors submit and manage them, admins moderate.
//!
//! The library owns everything between the user and the remote services:
//! the identity session and its backend access token, the typed backend API,
//! role resolution, the route guard, and one controller per feature view.
//! Rendering is left to the embedding client.
//!
//! ## Flow
//!
//! 1. [`SessionStore::init`] restores the persisted identity and exchanges it
//!    for an access token.
//! 2. [`ProfileResolver`] turns the identity into a profile with a role.
//! 3. [`RouteGuard`] holds protected routes until the role is known and
//!    sends signed-out visitors to `/login`.
//! 4. [`RoleDispatcher`] picks the dashboard landing route for the role.
//! 5. Feature views in [`views`] run their own fetches and mutations.
//!
//! ## Core Modules
//!
//! - [`auth`]: identity provider and session store
//! - [`net`]: public and authenticated HTTP clients, typed endpoints
//! - [`routing`]: routes, guard, dispatcher
//! - [`views`]: per-view controllers
//!
//! ## Example
//!
//! ```
//! use class_market::{Role, RoleDispatcher};
//!
//! let landing = RoleDispatcher::landing(&Role::parse("Instructor"));
//! assert_eq!(landing.path(), "/dashboard/my-classes");
//! ```

/// Identity provider and session store.
pub mod auth;
pub use auth::{IdentityProvider, RestIdentityProvider, SessionStore};

/// Environment configuration.
pub mod config;
pub use config::{ClientConfig, ConfigError, ConfigOverrides};

pub mod fetch;
pub use fetch::{Loadable, Resource};

/// Records exchanged with the backend.
pub mod models;
pub use models::{AppProfile, Course, Identity, Role};

/// HTTP clients and typed endpoints.
pub mod net;
pub use net::{ApiError, AuthedClient, MarketApi, PublicClient};

pub mod payment;
pub use payment::{PaymentGateway, StripeGateway};

pub mod profile;
pub use profile::ProfileResolver;

pub mod progress;

/// Routes, guard and role dispatch.
pub mod routing;
pub use routing::{GuardState, Navigator, RoleDispatcher, Route, RouteGuard};

pub mod store;
pub use store::{FileStore, LocalStore, MemoryStore};

pub mod upload;
pub mod validation;

/// Feature view controllers.
pub mod views;
