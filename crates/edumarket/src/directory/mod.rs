//! Searchable institution catalog carrying the denormalized review aggregate.

pub mod domain;
pub mod repository;
pub mod search;
pub mod service;

pub use domain::{ContactDetails, FeeStructure, Institution, InstitutionProfileUpdate};
pub use repository::DirectoryRepository;
pub use search::{InstitutionQuery, SortKey};
pub use service::DirectoryService;
