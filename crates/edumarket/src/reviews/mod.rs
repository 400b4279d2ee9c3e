//! Reviews and the institution rating aggregate.
//!
//! Every create, delete or approval change recomputes the owning institution's `rating` / `totalReviews` from the
//! full set of approved reviews after the write commits; nothing is maintained incrementally.

pub mod aggregate;
pub mod domain;
pub mod repository;
pub mod service;

pub use aggregate::RatingSummary;
pub use domain::{NewReview, Review, ReviewEntry, ValidReview};
pub use repository::ReviewRepository;
pub use service::ReviewService;
