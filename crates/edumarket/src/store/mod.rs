//! Storage seam shared by every domain module.
//!
//! Each domain declares its own repository trait next to its service; [`Store`] bundles them so
//! the HTTP layer can be generic over a single backend. [`DocumentStore`] is that backend: id-keyed
//! tables in memory, optionally written through to a SQLite file so records survive a restart.

mod document;
mod journal;
mod records;
mod table;

use serde::Serialize;

use crate::accounts::AccountRepository;
use crate::catalog::CatalogRepository;
use crate::directory::DirectoryRepository;
use crate::inquiries::InquiryRepository;
use crate::moderation::ModerationRepository;
use crate::notifications::NotificationRepository;
use crate::reviews::ReviewRepository;

pub use document::DocumentStore;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub(crate) fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Every repository the marketplace needs, satisfied by one backend.
pub trait Store:
    AccountRepository
    + DirectoryRepository
    + ReviewRepository
    + InquiryRepository
    + NotificationRepository
    + ModerationRepository
    + CatalogRepository
    + 'static
{
}

impl<T> Store for T where
    T: AccountRepository
        + DirectoryRepository
        + ReviewRepository
        + InquiryRepository
        + NotificationRepository
        + ModerationRepository
        + CatalogRepository
        + 'static
{
}

/// One-based page selection used by the admin listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            page: page.filter(|page| *page > 0).unwrap_or(1),
            limit: limit.filter(|limit| *limit > 0).unwrap_or(10),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Slices an already ordered result set.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let data = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit)
            .collect();
        Page {
            data,
            total,
            total_pages: total.div_ceil(self.limit),
            current_page: self.page,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Case-insensitive substring match used by the directory, admin and career searches.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
