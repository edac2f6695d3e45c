//! HTTP 共享状态

use std::sync::Arc;

use yamdb_adapter_email::EmailTemplate;
use yamdb_auth_core::TokenService;
use yamdb_common::{PageLimits, PageRequest};
use yamdb_ports::EmailSender;

use crate::application::{AccountService, CatalogService, ReviewService};
use crate::infrastructure::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub reviews: Arc<ReviewService>,
    pub tokens: Arc<TokenService>,
    pub page_limits: PageLimits,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        tokens: Arc<TokenService>,
        mailer: Arc<dyn EmailSender>,
        templates: Arc<EmailTemplate>,
        page_limits: PageLimits,
    ) -> Self {
        let accounts = AccountService::new(
            repositories.users.clone(),
            tokens.clone(),
            mailer,
            templates,
        );
        let catalog = CatalogService::new(
            repositories.categories.clone(),
            repositories.genres.clone(),
            repositories.titles.clone(),
        );
        let reviews = ReviewService::new(
            repositories.titles,
            repositories.reviews,
            repositories.comments,
        );

        Self {
            accounts: Arc::new(accounts),
            catalog: Arc::new(catalog),
            reviews: Arc::new(reviews),
            tokens,
            page_limits,
        }
    }

    pub fn page(&self, limit: Option<u32>, offset: Option<u32>) -> PageRequest {
        PageRequest::resolve(limit, offset, &self.page_limits)
    }
}
