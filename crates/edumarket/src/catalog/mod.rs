//! Career library, blog posts and the public home summary.

pub mod blogs;
pub mod careers;
pub mod repository;
pub mod service;

pub use blogs::{Blog, BlogDraft, BlogTeaser, PLACEHOLDER_IMAGE};
pub use careers::{sample_careers, Career, CareerQuery, NewCareer};
pub use repository::CatalogRepository;
pub use service::{CatalogService, HomeSummary};
