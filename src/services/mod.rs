//! Business logic services

pub mod auth;
pub mod books;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub books: books::BooksService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        let auth = auth::AuthService::new(repository.clone(), auth_config);
        Self {
            users: users::UsersService::new(repository.clone(), auth.clone()),
            books: books::BooksService::new(repository),
            auth,
        }
    }
}
