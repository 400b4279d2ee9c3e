//! Student-to-institution contact requests. A newer inquiry from the same student replaces the
//! older ones for that institution.

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{Inquiry, InquiryForm, InquiryStatus, StudentInquiry};
pub use repository::InquiryRepository;
pub use service::InquiryService;
