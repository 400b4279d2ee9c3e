use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::blogs::{Blog, BlogDraft, BlogTeaser};
use super::careers::{sample_careers, Career, CareerQuery, NewCareer};
use super::repository::CatalogRepository;
use crate::accounts::{AccountRepository, UserRole};
use crate::directory::DirectoryRepository;
use crate::error::ServiceError;
use crate::ids::BlogId;

const HOME_BLOG_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSummary {
    pub total_institutions: usize,
    pub total_students: usize,
    pub total_careers: usize,
    pub latest_blogs: Vec<BlogTeaser>,
}

pub struct CatalogService<S> {
    store: Arc<S>,
}

impl<S> CatalogService<S>
where
    S: CatalogRepository + DirectoryRepository + AccountRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn careers(&self, query: &CareerQuery) -> Result<Vec<Career>, ServiceError> {
        Ok(query.apply(self.store.list_careers()?))
    }

    pub fn create_career(&self, form: NewCareer) -> Result<Career, ServiceError> {
        let career = form.into_career(Utc::now()).map_err(ServiceError::invalid)?;
        self.store.insert_careers(vec![career.clone()])?;
        Ok(career)
    }

    /// Inserts the starter library, returning how many careers were added.
    pub fn seed_careers(&self) -> Result<usize, ServiceError> {
        let now = Utc::now();
        let careers = sample_careers()
            .into_iter()
            .map(|form| form.into_career(now))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ServiceError::invalid)?;
        let inserted = self.store.insert_careers(careers)?;
        tracing::info!(inserted, "career library seeded");
        Ok(inserted)
    }

    pub fn blogs(&self) -> Result<Vec<Blog>, ServiceError> {
        Ok(self.store.list_blogs()?)
    }

    pub fn blog(&self, id: &BlogId) -> Result<Blog, ServiceError> {
        self.store
            .fetch_blog(id)?
            .ok_or_else(|| ServiceError::not_found("Blog not found"))
    }

    pub fn create_blog(&self, draft: BlogDraft, image: Option<String>) -> Result<Blog, ServiceError> {
        let blog = draft
            .into_blog(image, Utc::now())
            .map_err(ServiceError::invalid)?;
        Ok(self.store.insert_blog(blog)?)
    }

    pub fn update_blog(
        &self,
        id: &BlogId,
        draft: BlogDraft,
        image: Option<String>,
    ) -> Result<Blog, ServiceError> {
        self.store
            .edit_blog(id, |blog| {
                draft.apply(blog, image, Utc::now());
                Ok::<_, ServiceError>(())
            })?
            .ok_or_else(|| ServiceError::not_found("Blog not found"))
    }

    pub fn delete_blog(&self, id: &BlogId) -> Result<(), ServiceError> {
        if !self.store.delete_blog(id)? {
            return Err(ServiceError::not_found("Blog not found"));
        }
        Ok(())
    }

    pub fn home_summary(&self) -> Result<HomeSummary, ServiceError> {
        let total_institutions = self
            .store
            .list_institutions()?
            .iter()
            .filter(|institution| institution.is_listed())
            .count();
        let latest_blogs = self
            .store
            .list_blogs()?
            .iter()
            .take(HOME_BLOG_LIMIT)
            .map(BlogTeaser::from)
            .collect();

        Ok(HomeSummary {
            total_institutions,
            total_students: self.store.users_with_role(UserRole::Student)?.len(),
            total_careers: self.store.list_careers()?.len(),
            latest_blogs,
        })
    }
}
