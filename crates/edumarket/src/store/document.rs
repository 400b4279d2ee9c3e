use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::accounts::{AccountRepository, UserRecord, UserRole};
use crate::catalog::{Blog, Career, CatalogRepository};
use crate::directory::{DirectoryRepository, Institution};
use crate::ids::{
    BlogId, ConsultationId, InquiryId, InstitutionId, NotificationId, RecipientId, RequestId,
    ReviewId, UserId,
};
use crate::inquiries::{Inquiry, InquiryRepository};
use crate::moderation::{Consultation, InstitutionRequest, ModerationRepository};
use crate::notifications::{Notification, NotificationRepository};
use crate::reviews::{Review, ReviewRepository};

use super::journal::{Journal, Write};
use super::table::{Document, Table};
use super::RepositoryError;

#[derive(Debug, Default)]
struct State {
    journal: Journal,
    users: Table<UserRecord>,
    institutions: Table<Institution>,
    reviews: Table<Review>,
    inquiries: Table<Inquiry>,
    notifications: Table<Notification>,
    requests: Table<InstitutionRequest>,
    consultations: Table<Consultation>,
    careers: Table<Career>,
    blogs: Table<Blog>,
}

/// Routes generic table operations to the field holding that record type.
trait Holds<T> {
    fn table(&self) -> &Table<T>;
    fn table_mut(&mut self) -> &mut Table<T>;
}

macro_rules! holds {
    ($($field:ident: $record:ty),+ $(,)?) => {
        $(
            impl Holds<$record> for State {
                fn table(&self) -> &Table<$record> {
                    &self.$field
                }

                fn table_mut(&mut self) -> &mut Table<$record> {
                    &mut self.$field
                }
            }
        )+
    };
}

holds!(
    users: UserRecord,
    institutions: Institution,
    reviews: Review,
    inquiries: Inquiry,
    notifications: Notification,
    requests: InstitutionRequest,
    consultations: Consultation,
    careers: Career,
    blogs: Blog,
);

impl State {
    fn reload<T: Document>(&mut self) -> Result<usize, RepositoryError>
    where
        Self: Holds<T>,
    {
        let rows = self.journal.load(T::COLLECTION)?;
        let loaded = rows.len();
        let table: &mut Table<T> = self.table_mut();
        for (seq, body) in rows {
            table.restore(seq, T::decode(&body)?);
        }
        Ok(loaded)
    }

    fn insert_rows<T: Document>(&mut self, rows: Vec<T>) -> Result<usize, RepositoryError>
    where
        Self: Holds<T>,
    {
        let writes = <Self as Holds<T>>::table(self).stage_inserts(&rows)?;
        self.journal.commit(&writes)?;
        let inserted = rows.len();
        let table: &mut Table<T> = self.table_mut();
        for row in rows {
            table.append(row);
        }
        Ok(inserted)
    }

    fn edit_row<T: Document, E>(
        &mut self,
        id: &str,
        change: impl FnOnce(&mut T) -> Result<(), E>,
    ) -> Result<Option<T>, E>
    where
        Self: Holds<T>,
        E: From<RepositoryError>,
    {
        let table: &Table<T> = self.table();
        let Some(current) = table.get(id) else {
            return Ok(None);
        };
        let mut draft = current.clone();
        change(&mut draft)?;

        let write = <Self as Holds<T>>::table(self).stage_replace(&draft)?;
        self.journal.commit(std::slice::from_ref(&write))?;
        <Self as Holds<T>>::table_mut(self).replace(draft.clone());
        Ok(Some(draft))
    }

    fn delete_rows<T: Document>(&mut self, ids: &[String]) -> Result<Vec<T>, RepositoryError>
    where
        Self: Holds<T>,
    {
        let writes: Vec<Write> = ids.iter().map(|id| Write::delete::<T>(id)).collect();
        self.journal.commit(&writes)?;
        let table: &mut Table<T> = self.table_mut();
        Ok(ids.iter().filter_map(|id| table.remove(id)).collect())
    }

    fn delete_row<T: Document>(&mut self, id: &str) -> Result<Option<T>, RepositoryError>
    where
        Self: Holds<T>,
    {
        if !<Self as Holds<T>>::table(self).contains(id) {
            return Ok(None);
        }
        Ok(self.delete_rows(&[id.to_string()])?.pop())
    }
}

/// The marketplace's document store. Each repository call holds the lock for its whole
/// duration, so every call is atomic with respect to the others.
///
/// [`DocumentStore::new`] keeps records in memory only; [`DocumentStore::open`] also writes
/// them through to a SQLite file and reads them back on start.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    inner: Arc<Mutex<State>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let mut state = State {
            journal: Journal::open(path)?,
            ..State::default()
        };

        let loaded = state.reload::<UserRecord>()?
            + state.reload::<Institution>()?
            + state.reload::<Review>()?
            + state.reload::<Inquiry>()?
            + state.reload::<Notification>()?
            + state.reload::<InstitutionRequest>()?
            + state.reload::<Consultation>()?
            + state.reload::<Career>()?
            + state.reload::<Blog>()?;
        tracing::info!(path = %path.display(), documents = loaded, "document store opened");

        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("document store lock poisoned".to_string()))
    }
}

impl AccountRepository for DocumentStore {
    fn insert_user(&self, user: UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut state = self.lock()?;
        if state.users.contains(user.id.as_str())
            || state.users.any(|existing| existing.email == user.email)
        {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(vec![user.clone()])?;
        Ok(user)
    }

    fn edit_user<E>(
        &self,
        id: &UserId,
        change: impl FnOnce(&mut UserRecord) -> Result<(), E>,
    ) -> Result<Option<UserRecord>, E>
    where
        E: From<RepositoryError>,
    {
        self.lock()?.edit_row(id.as_str(), change)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.lock()?.users.get(id.as_str()).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.lock()?.users.find(|user| user.email == email).cloned())
    }

    fn users_with_role(&self, role: UserRole) -> Result<Vec<UserRecord>, RepositoryError> {
        Ok(self.lock()?.users.newest_first(|user| user.role == role))
    }

    fn delete_user(&self, id: &UserId) -> Result<bool, RepositoryError> {
        Ok(self
            .lock()?
            .delete_row::<UserRecord>(id.as_str())?
            .is_some())
    }
}

impl DirectoryRepository for DocumentStore {
    fn insert_institution(
        &self,
        institution: Institution,
    ) -> Result<Institution, RepositoryError> {
        let mut state = self.lock()?;
        if state.institutions.contains(institution.id.as_str())
            || state
                .institutions
                .any(|existing| existing.login_email() == institution.login_email())
        {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(vec![institution.clone()])?;
        Ok(institution)
    }

    fn edit_institution<E>(
        &self,
        id: &InstitutionId,
        change: impl FnOnce(&mut Institution) -> Result<(), E>,
    ) -> Result<Option<Institution>, E>
    where
        E: From<RepositoryError>,
    {
        self.lock()?.edit_row(id.as_str(), change)
    }

    fn fetch_institution(
        &self,
        id: &InstitutionId,
    ) -> Result<Option<Institution>, RepositoryError> {
        Ok(self.lock()?.institutions.get(id.as_str()).cloned())
    }

    fn find_institution_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Institution>, RepositoryError> {
        Ok(self
            .lock()?
            .institutions
            .find(|institution| institution.login_email() == email)
            .cloned())
    }

    fn list_institutions(&self) -> Result<Vec<Institution>, RepositoryError> {
        Ok(self.lock()?.institutions.newest_first(|_| true))
    }

    fn delete_institution(&self, id: &InstitutionId) -> Result<bool, RepositoryError> {
        Ok(self
            .lock()?
            .delete_row::<Institution>(id.as_str())?
            .is_some())
    }

    fn set_rating(
        &self,
        id: &InstitutionId,
        rating: f64,
        total_reviews: u32,
    ) -> Result<(), RepositoryError> {
        self.lock()?
            .edit_row(id.as_str(), |institution: &mut Institution| {
                institution.rating = rating;
                institution.total_reviews = total_reviews;
                Ok::<_, RepositoryError>(())
            })
            .map(|_| ())
    }
}

impl ReviewRepository for DocumentStore {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut state = self.lock()?;
        if state.reviews.contains(review.id.as_str())
            || state.reviews.any(|existing| {
                existing.institution_id == review.institution_id
                    && existing.author_id == review.author_id
            })
        {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(vec![review.clone()])?;
        Ok(review)
    }

    fn edit_review<E>(
        &self,
        id: &ReviewId,
        change: impl FnOnce(&mut Review) -> Result<(), E>,
    ) -> Result<Option<Review>, E>
    where
        E: From<RepositoryError>,
    {
        self.lock()?.edit_row(id.as_str(), change)
    }

    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.lock()?.reviews.get(id.as_str()).cloned())
    }

    fn find_review(
        &self,
        institution: &InstitutionId,
        author: &UserId,
    ) -> Result<Option<Review>, RepositoryError> {
        Ok(self
            .lock()?
            .reviews
            .find(|review| &review.institution_id == institution && &review.author_id == author)
            .cloned())
    }

    fn delete_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.lock()?.delete_row(id.as_str())
    }

    fn reviews_for_institution(
        &self,
        institution: &InstitutionId,
    ) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .lock()?
            .reviews
            .newest_first(|review| &review.institution_id == institution))
    }

    fn reviews_by_author(&self, author: &UserId) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .lock()?
            .reviews
            .newest_first(|review| &review.author_id == author))
    }

    fn all_reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        Ok(self.lock()?.reviews.newest_first(|_| true))
    }

    fn approved_ratings(&self, institution: &InstitutionId) -> Result<Vec<u8>, RepositoryError> {
        Ok(self
            .lock()?
            .reviews
            .oldest_first()
            .filter(|review| &review.institution_id == institution && review.is_approved)
            .map(|review| review.rating)
            .collect())
    }
}

impl InquiryRepository for DocumentStore {
    fn insert_inquiry(&self, inquiry: Inquiry) -> Result<Inquiry, RepositoryError> {
        let mut state = self.lock()?;
        if state.inquiries.contains(inquiry.id.as_str()) {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(vec![inquiry.clone()])?;
        Ok(inquiry)
    }

    fn edit_inquiry<E>(
        &self,
        id: &InquiryId,
        change: impl FnOnce(&mut Inquiry) -> Result<(), E>,
    ) -> Result<Option<Inquiry>, E>
    where
        E: From<RepositoryError>,
    {
        self.lock()?.edit_row(id.as_str(), change)
    }

    fn fetch_inquiry(&self, id: &InquiryId) -> Result<Option<Inquiry>, RepositoryError> {
        Ok(self.lock()?.inquiries.get(id.as_str()).cloned())
    }

    fn delete_inquiries_from(
        &self,
        author: &UserId,
        institution: &InstitutionId,
    ) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        let ids = state.inquiries.keys_where(|inquiry| {
            inquiry.author_id.as_ref() == Some(author) && &inquiry.institution_id == institution
        });
        Ok(state.delete_rows::<Inquiry>(&ids)?.len())
    }

    fn inquiries_for_institution(
        &self,
        institution: &InstitutionId,
    ) -> Result<Vec<Inquiry>, RepositoryError> {
        Ok(self
            .lock()?
            .inquiries
            .newest_first(|inquiry| &inquiry.institution_id == institution))
    }
}

impl NotificationRepository for DocumentStore {
    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, RepositoryError> {
        let mut state = self.lock()?;
        if state.notifications.contains(notification.id.as_str()) {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(vec![notification.clone()])?;
        Ok(notification)
    }

    fn insert_notifications(
        &self,
        notifications: Vec<Notification>,
    ) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        if state.notifications.clashes(&notifications) {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(notifications)
    }

    fn notifications_for(
        &self,
        recipient: &RecipientId,
    ) -> Result<Vec<Notification>, RepositoryError> {
        Ok(self
            .lock()?
            .notifications
            .newest_first(|notification| &notification.recipient == recipient))
    }

    fn mark_notification_read(
        &self,
        recipient: &RecipientId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let mut state = self.lock()?;
        let owned = state
            .notifications
            .get(id.as_str())
            .is_some_and(|notification| &notification.recipient == recipient);
        if !owned {
            return Ok(None);
        }
        state.edit_row(id.as_str(), |notification: &mut Notification| {
            notification.is_read = true;
            Ok::<_, RepositoryError>(())
        })
    }

    fn mark_all_notifications_read(
        &self,
        recipient: &RecipientId,
    ) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        let unread: Vec<Notification> = state
            .notifications
            .oldest_first()
            .filter(|notification| &notification.recipient == recipient && !notification.is_read)
            .map(|notification| Notification {
                is_read: true,
                ..notification.clone()
            })
            .collect();

        let writes = unread
            .iter()
            .map(|notification| state.notifications.stage_replace(notification))
            .collect::<Result<Vec<_>, _>>()?;
        state.journal.commit(&writes)?;

        let updated = unread.len();
        for notification in unread {
            state.notifications.replace(notification);
        }
        Ok(updated)
    }

    fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>, RepositoryError> {
        Ok(self
            .lock()?
            .notifications
            .oldest_first()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

impl ModerationRepository for DocumentStore {
    fn insert_request(
        &self,
        request: InstitutionRequest,
    ) -> Result<InstitutionRequest, RepositoryError> {
        let mut state = self.lock()?;
        if state.requests.contains(request.id.as_str()) {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(vec![request.clone()])?;
        Ok(request)
    }

    fn edit_request<E>(
        &self,
        id: &RequestId,
        change: impl FnOnce(&mut InstitutionRequest) -> Result<(), E>,
    ) -> Result<Option<InstitutionRequest>, E>
    where
        E: From<RepositoryError>,
    {
        self.lock()?.edit_row(id.as_str(), change)
    }

    fn fetch_request(&self, id: &RequestId) -> Result<Option<InstitutionRequest>, RepositoryError> {
        Ok(self.lock()?.requests.get(id.as_str()).cloned())
    }

    fn list_requests(&self) -> Result<Vec<InstitutionRequest>, RepositoryError> {
        Ok(self.lock()?.requests.newest_first(|_| true))
    }

    fn requests_for_email(
        &self,
        email: &str,
    ) -> Result<Vec<InstitutionRequest>, RepositoryError> {
        Ok(self
            .lock()?
            .requests
            .newest_first(|request| request.application.email == email))
    }

    fn insert_consultation(
        &self,
        consultation: Consultation,
    ) -> Result<Consultation, RepositoryError> {
        let mut state = self.lock()?;
        if state.consultations.contains(consultation.id.as_str()) {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(vec![consultation.clone()])?;
        Ok(consultation)
    }

    fn edit_consultation<E>(
        &self,
        id: &ConsultationId,
        change: impl FnOnce(&mut Consultation) -> Result<(), E>,
    ) -> Result<Option<Consultation>, E>
    where
        E: From<RepositoryError>,
    {
        self.lock()?.edit_row(id.as_str(), change)
    }

    fn fetch_consultation(
        &self,
        id: &ConsultationId,
    ) -> Result<Option<Consultation>, RepositoryError> {
        Ok(self.lock()?.consultations.get(id.as_str()).cloned())
    }

    fn list_consultations(&self) -> Result<Vec<Consultation>, RepositoryError> {
        Ok(self.lock()?.consultations.newest_first(|_| true))
    }

    fn consultations_for_user(&self, user: &UserId) -> Result<Vec<Consultation>, RepositoryError> {
        Ok(self
            .lock()?
            .consultations
            .newest_first(|consultation| &consultation.user_id == user))
    }
}

impl CatalogRepository for DocumentStore {
    fn insert_careers(&self, careers: Vec<Career>) -> Result<usize, RepositoryError> {
        let mut state = self.lock()?;
        if state.careers.clashes(&careers) {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(careers)
    }

    fn list_careers(&self) -> Result<Vec<Career>, RepositoryError> {
        Ok(self.lock()?.careers.oldest_first().cloned().collect())
    }

    fn insert_blog(&self, blog: Blog) -> Result<Blog, RepositoryError> {
        let mut state = self.lock()?;
        if state.blogs.contains(blog.id.as_str()) {
            return Err(RepositoryError::Conflict);
        }
        state.insert_rows(vec![blog.clone()])?;
        Ok(blog)
    }

    fn edit_blog<E>(
        &self,
        id: &BlogId,
        change: impl FnOnce(&mut Blog) -> Result<(), E>,
    ) -> Result<Option<Blog>, E>
    where
        E: From<RepositoryError>,
    {
        self.lock()?.edit_row(id.as_str(), change)
    }

    fn fetch_blog(&self, id: &BlogId) -> Result<Option<Blog>, RepositoryError> {
        Ok(self.lock()?.blogs.get(id.as_str()).cloned())
    }

    fn delete_blog(&self, id: &BlogId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.delete_row::<Blog>(id.as_str())?.is_some())
    }

    fn list_blogs(&self) -> Result<Vec<Blog>, RepositoryError> {
        Ok(self.lock()?.blogs.newest_first(|_| true))
    }
}
