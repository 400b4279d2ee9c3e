use super::domain::{UserRecord, UserRole};
use crate::ids::UserId;
use crate::store::RepositoryError;

/// Storage for student and admin records.
pub trait AccountRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already taken.
    fn insert_user(&self, user: UserRecord) -> Result<UserRecord, RepositoryError>;
    /// Applies `change` to the stored record under the store lock. Nothing is written when it
    /// fails; `None` means the user does not exist.
    fn edit_user<E>(
        &self,
        id: &UserId,
        change: impl FnOnce(&mut UserRecord) -> Result<(), E>,
    ) -> Result<Option<UserRecord>, E>
    where
        E: From<RepositoryError>;
    fn fetch_user(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;
    /// Newest first.
    fn users_with_role(&self, role: UserRole) -> Result<Vec<UserRecord>, RepositoryError>;
    fn delete_user(&self, id: &UserId) -> Result<bool, RepositoryError>;
}
