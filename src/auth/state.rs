use super::storage::UserStore;
use crate::{cookie::CookieConfig, tokens::TokenManager};
use std::sync::Arc;

/// Everything the credential handlers share.
#[derive(Debug, Clone)]
pub struct AuthState {
    tokens: Arc<TokenManager>,
    users: UserStore,
    cookie: CookieConfig,
}

impl AuthState {
    #[must_use]
    pub fn new(tokens: Arc<TokenManager>, users: UserStore, cookie: CookieConfig) -> Self {
        Self {
            tokens,
            users,
            cookie,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    #[must_use]
    pub fn users(&self) -> &UserStore {
        &self.users
    }

    #[must_use]
    pub fn cookie(&self) -> &CookieConfig {
        &self.cookie
    }
}
