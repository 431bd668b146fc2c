use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn, orm_from_pool},
    middleware::session::SessionRegistry,
    password::PasswordEncoder,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub passwords: Arc<dyn PasswordEncoder>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(pool: &DbPool, passwords: Arc<dyn PasswordEncoder>) -> Self {
        Self {
            orm: orm_from_pool(pool),
            passwords,
            sessions: SessionRegistry::new(),
        }
    }
}
