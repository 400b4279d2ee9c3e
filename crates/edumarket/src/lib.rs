//! Core domain for the education consultancy marketplace.
//!
//! Services here are transport agnostic: they own the business rules (review aggregation,
//! inquiry replacement, onboarding moderation) and talk to storage through repository traits.
//! The HTTP surface lives in the `edumarket-api` service crate.

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod ids;
pub mod inquiries;
pub mod mail;
pub mod marketplace;
pub mod moderation;
pub mod notifications;
pub mod reviews;
pub mod store;
pub mod telemetry;

pub use marketplace::{Marketplace, SecuritySettings};
