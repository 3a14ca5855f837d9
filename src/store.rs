//! Persistence seams. Services only ever see `Arc<dyn CatalogStore>` and
//! `Arc<dyn AccountStore>`; the concrete backend is chosen at startup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::config::{Config, StoreBackend};
use crate::db::MongoStore;
use crate::error::{ApiError, ApiResult};
use crate::models::{AdminUser, Product, User};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every product, in insertion order.
    async fn all_products(&self) -> ApiResult<Vec<Product>>;

    async fn find_product(&self, id: i64) -> ApiResult<Option<Product>>;

    /// Persists a new product. Implementations refresh the derived stock
    /// fields before writing.
    async fn insert_product(&self, product: Product) -> ApiResult<Product>;

    async fn find_and_delete_product(&self, id: i64) -> ApiResult<Option<Product>>;

    async fn delete_all_products(&self) -> ApiResult<u64>;

    /// Atomically increments the named sequence and returns the new value,
    /// starting at 1.
    async fn next_sequence(&self, name: &str) -> ApiResult<i64>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>>;

    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: User) -> ApiResult<()>;

    async fn find_admin(&self, username: &str) -> ApiResult<Option<AdminUser>>;

    /// Fails with `Conflict` when the username is taken.
    async fn insert_admin(&self, admin: AdminUser) -> ApiResult<()>;
}

/// The open store, shared by every worker. Close it once the server stops.
pub struct StoreHandle {
    pub catalog: Arc<dyn CatalogStore>,
    pub accounts: Arc<dyn AccountStore>,
    mongo: Option<mongodb::Client>,
}

impl StoreHandle {
    pub async fn open(config: &Config) -> ApiResult<Self> {
        match config.store {
            StoreBackend::Memory => {
                log::warn!("Using the in-memory store; data is lost on shutdown");
                Ok(Self::memory())
            }
            StoreBackend::Mongo => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| ApiError::Store("DATABASE_URL must be set".to_string()))?;
                let store = Arc::new(MongoStore::connect(url, &config.database_name).await?);
                Ok(StoreHandle {
                    mongo: Some(store.client()),
                    catalog: store.clone(),
                    accounts: store,
                })
            }
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        StoreHandle {
            catalog: store.clone(),
            accounts: store,
            mongo: None,
        }
    }

    /// Waits for outstanding cursors and sessions, then disconnects.
    pub async fn close(self) {
        if let Some(client) = self.mongo {
            client.shutdown().await;
            log::info!("MongoDB connection closed");
        }
    }
}

#[derive(Default)]
struct MemoryState {
    products: Vec<Product>,
    users: Vec<User>,
    admins: Vec<AdminUser>,
    counters: HashMap<String, i64>,
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    fn lock(&self) -> ApiResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| ApiError::Store("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn all_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.lock()?.products.clone())
    }

    async fn find_product(&self, id: i64) -> ApiResult<Option<Product>> {
        Ok(self.lock()?.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, mut product: Product) -> ApiResult<Product> {
        product.refresh_stock();
        if product.storage_id.is_none() {
            product.storage_id = Some(ObjectId::new());
        }
        self.lock()?.products.push(product.clone());
        Ok(product)
    }

    async fn find_and_delete_product(&self, id: i64) -> ApiResult<Option<Product>> {
        let mut state = self.lock()?;
        let position = state.products.iter().position(|p| p.id == id);
        Ok(position.map(|index| state.products.remove(index)))
    }

    async fn delete_all_products(&self) -> ApiResult<u64> {
        let mut state = self.lock()?;
        let deleted = state.products.len() as u64;
        state.products.clear();
        Ok(deleted)
    }

    async fn next_sequence(&self, name: &str) -> ApiResult<i64> {
        let mut state = self.lock()?;
        let seq = state.counters.entry(name.to_string()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: User) -> ApiResult<()> {
        let mut state = self.lock()?;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::Conflict("Email is already in use".to_string()));
        }
        state.users.push(user);
        Ok(())
    }

    async fn find_admin(&self, username: &str) -> ApiResult<Option<AdminUser>> {
        Ok(self
            .lock()?
            .admins
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn insert_admin(&self, admin: AdminUser) -> ApiResult<()> {
        let mut state = self.lock()?;
        if state.admins.iter().any(|a| a.username == admin.username) {
            return Err(ApiError::Conflict("Username is already in use".to_string()));
        }
        state.admins.push(admin);
        Ok(())
    }
}
