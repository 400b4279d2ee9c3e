use std::sync::Arc;

use chrono::Duration;

use crate::accounts::{AccountService, PasswordHasher, TokenIssuer};
use crate::catalog::CatalogService;
use crate::config::AuthConfig;
use crate::directory::DirectoryService;
use crate::inquiries::InquiryService;
use crate::mail::Mailer;
use crate::moderation::ModerationService;
use crate::notifications::NotificationService;
use crate::reviews::ReviewService;
use crate::store::Store;

/// Token and hashing parameters shared by the services.
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl From<&AuthConfig> for SecuritySettings {
    fn from(config: &AuthConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_ttl: Duration::hours(config.token_ttl_hours),
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

/// Every domain service wired against one store and one mail transport.
pub struct Marketplace<S> {
    pub store: Arc<S>,
    pub accounts: AccountService<S>,
    pub directory: DirectoryService<S>,
    pub reviews: ReviewService<S>,
    pub inquiries: InquiryService<S>,
    pub notifications: NotificationService<S>,
    pub moderation: ModerationService<S>,
    pub catalog: CatalogService<S>,
}

impl<S: Store> Marketplace<S> {
    pub fn new(store: Arc<S>, mailer: Arc<dyn Mailer>, settings: &SecuritySettings) -> Self {
        let hasher = PasswordHasher::new(settings.bcrypt_cost);
        let tokens = TokenIssuer::new(&settings.jwt_secret, settings.token_ttl);

        Self {
            accounts: AccountService::new(store.clone(), hasher, tokens, mailer.clone()),
            directory: DirectoryService::new(store.clone()),
            reviews: ReviewService::new(store.clone()),
            inquiries: InquiryService::new(store.clone()),
            notifications: NotificationService::new(store.clone()),
            moderation: ModerationService::new(store.clone(), hasher, mailer),
            catalog: CatalogService::new(store.clone()),
            store,
        }
    }
}
