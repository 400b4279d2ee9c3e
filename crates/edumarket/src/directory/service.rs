use std::sync::Arc;

use chrono::Utc;

use super::domain::{Institution, InstitutionProfileUpdate};
use super::repository::DirectoryRepository;
use super::search::InstitutionQuery;
use crate::error::ServiceError;
use crate::ids::InstitutionId;
use crate::store::{contains_ignore_case, Page, PageRequest};

/// Public directory plus the institution- and admin-side profile operations.
pub struct DirectoryService<S> {
    store: Arc<S>,
}

impl<S> DirectoryService<S>
where
    S: DirectoryRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn search(&self, query: &InstitutionQuery) -> Result<Vec<Institution>, ServiceError> {
        let candidates = self.store.list_institutions()?;
        Ok(query.apply(candidates))
    }

    /// Detail lookup. Returns unlisted institutions too, matching the public detail page.
    pub fn get(&self, id: &InstitutionId) -> Result<Institution, ServiceError> {
        self.store
            .fetch_institution(id)?
            .ok_or_else(|| ServiceError::not_found("Institution not found"))
    }

    pub fn update_profile(
        &self,
        id: &InstitutionId,
        update: InstitutionProfileUpdate,
    ) -> Result<Institution, ServiceError> {
        let institution = self
            .store
            .edit_institution(id, |institution| {
                update.apply(institution, Utc::now());
                Ok::<_, ServiceError>(())
            })?
            .ok_or_else(|| ServiceError::not_found("Institution not found"))?;
        tracing::info!(institution_id = %id, "institution profile updated");
        Ok(institution)
    }

    /// Admin listing: every institution regardless of status, newest first.
    pub fn admin_list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Institution>, ServiceError> {
        let term = search.map(str::trim).filter(|term| !term.is_empty());
        let matched = self
            .store
            .list_institutions()?
            .into_iter()
            .filter(|institution| match term {
                Some(term) => {
                    contains_ignore_case(&institution.name, term)
                        || contains_ignore_case(&institution.location, term)
                }
                None => true,
            })
            .collect();
        Ok(page.apply(matched))
    }

    /// Flips `isActive`, returning the new value.
    pub fn toggle_active(&self, id: &InstitutionId) -> Result<bool, ServiceError> {
        let is_active = self
            .store
            .edit_institution(id, |institution| {
                institution.is_active = !institution.is_active;
                institution.updated_at = Utc::now();
                Ok::<_, ServiceError>(())
            })?
            .map(|institution| institution.is_active)
            .ok_or_else(|| ServiceError::not_found("Institution not found"))?;
        tracing::info!(institution_id = %id, is_active, "institution status toggled");
        Ok(is_active)
    }

    pub fn delete(&self, id: &InstitutionId) -> Result<(), ServiceError> {
        if !self.store.delete_institution(id)? {
            return Err(ServiceError::not_found("Institution not found"));
        }
        tracing::info!(institution_id = %id, "institution deleted");
        Ok(())
    }
}
