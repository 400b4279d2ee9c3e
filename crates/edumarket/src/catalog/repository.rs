use super::blogs::Blog;
use super::careers::Career;
use crate::ids::BlogId;
use crate::store::RepositoryError;

pub trait CatalogRepository: Send + Sync {
    fn insert_careers(&self, careers: Vec<Career>) -> Result<usize, RepositoryError>;
    fn list_careers(&self) -> Result<Vec<Career>, RepositoryError>;

    fn insert_blog(&self, blog: Blog) -> Result<Blog, RepositoryError>;
    /// Applies `change` to the stored post under the store lock.
    fn edit_blog<E>(
        &self,
        id: &BlogId,
        change: impl FnOnce(&mut Blog) -> Result<(), E>,
    ) -> Result<Option<Blog>, E>
    where
        E: From<RepositoryError>;
    fn fetch_blog(&self, id: &BlogId) -> Result<Option<Blog>, RepositoryError>;
    fn delete_blog(&self, id: &BlogId) -> Result<bool, RepositoryError>;
    /// Newest first.
    fn list_blogs(&self) -> Result<Vec<Blog>, RepositoryError>;
}
