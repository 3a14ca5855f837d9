//! Product catalog and account backend: sequential product ids, stock
//! derived from per-size inventory, redacted product views, and
//! shopper/admin authentication over MongoDB.

pub mod accounts;
pub mod allocator;
pub mod assets;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod handlers;
pub mod inventory;
pub mod middleware;
pub mod models;
pub mod passwords;
pub mod store;
pub mod token;

use actix_web::web;

use crate::accounts::Accounts;
use crate::allocator::IdAllocator;
use crate::assets::AssetStore;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::store::StoreHandle;
use crate::token::TokenIssuer;

/// Shared request state, built once and cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub catalog: web::Data<Catalog>,
    pub accounts: web::Data<Accounts>,
    pub environment: web::Data<config::Environment>,
}

impl AppState {
    pub fn new(config: &Config, store: &StoreHandle) -> Self {
        let catalog = Catalog::new(
            store.catalog.clone(),
            IdAllocator::new(config.id_base, config.id_strategy),
            AssetStore::new(config.upload_dir.clone(), &config.public_url),
            config.delete_secret.clone(),
        );
        let accounts = Accounts::new(
            store.accounts.clone(),
            TokenIssuer::new(config.jwt_secret.clone(), config.token_ttl_hours),
        );

        AppState {
            catalog: web::Data::new(catalog),
            accounts: web::Data::new(accounts),
            environment: web::Data::new(config.environment),
        }
    }
}
