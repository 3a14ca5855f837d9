use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::error::{ApiError, ApiResult};
use crate::models::{AdminUser, Counter, Product, User};
use crate::store::{AccountStore, CatalogStore};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    client: Client,
    products: Collection<Product>,
    users: Collection<User>,
    admins: Collection<AdminUser>,
    counters: Collection<Counter>,
}

impl MongoStore {
    pub async fn connect(database_url: &str, database_name: &str) -> ApiResult<Self> {
        let client_options = ClientOptions::parse(database_url).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(database_name);

        let store = Self::with_database(client, &db);
        store.ensure_indexes().await?;
        log::info!("Connected to MongoDB database {}", database_name);
        Ok(store)
    }

    fn with_database(client: Client, db: &Database) -> Self {
        MongoStore {
            client,
            products: db.collection("products"),
            users: db.collection("users"),
            admins: db.collection("adminusers"),
            counters: db.collection("counters"),
        }
    }

    async fn ensure_indexes(&self) -> ApiResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.admins
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        Ok(())
    }

    /// Handle for shutting the connection pool down.
    pub fn client(&self) -> Client {
        self.client.clone()
    }
}

fn by_public_id(id: i64) -> Document {
    doc! { "id": id }
}

// The collection's natural order is not guaranteed; ObjectIds grow with
// insertion time, so sorting on them recovers insertion order.
fn insertion_order() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": 1 }).build()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn conflict_or_store(err: mongodb::error::Error, conflict: &str) -> ApiError {
    if is_duplicate_key(&err) {
        ApiError::Conflict(conflict.to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl CatalogStore for MongoStore {
    async fn all_products(&self) -> ApiResult<Vec<Product>> {
        let cursor = self.products.find(doc! {}, insertion_order()).await?;
        let products: Vec<Product> = cursor.try_collect().await?;
        Ok(products)
    }

    async fn find_product(&self, id: i64) -> ApiResult<Option<Product>> {
        Ok(self.products.find_one(by_public_id(id), None).await?)
    }

    async fn insert_product(&self, mut product: Product) -> ApiResult<Product> {
        product.refresh_stock();
        let result = self.products.insert_one(&product, None).await?;
        product.storage_id = result.inserted_id.as_object_id();
        log::debug!("Inserted product {} as {:?}", product.id, product.storage_id);
        Ok(product)
    }

    async fn find_and_delete_product(&self, id: i64) -> ApiResult<Option<Product>> {
        Ok(self
            .products
            .find_one_and_delete(by_public_id(id), None)
            .await?)
    }

    async fn delete_all_products(&self) -> ApiResult<u64> {
        let result = self.products.delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }

    async fn next_sequence(&self, name: &str) -> ApiResult<i64> {
        let filter = doc! { "_id": name };
        let update = doc! { "$inc": { "seq": 1_i64 } };

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        self.counters
            .find_one_and_update(filter, update, options)
            .await?
            .map(|counter| counter.seq)
            .ok_or_else(|| ApiError::Store("Failed to generate sequence value".to_string()))
    }
}

#[async_trait]
impl AccountStore for MongoStore {
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn insert_user(&self, user: User) -> ApiResult<()> {
        self.users
            .insert_one(&user, None)
            .await
            .map_err(|e| conflict_or_store(e, "Email is already in use"))?;
        Ok(())
    }

    async fn find_admin(&self, username: &str) -> ApiResult<Option<AdminUser>> {
        Ok(self
            .admins
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn insert_admin(&self, admin: AdminUser) -> ApiResult<()> {
        self.admins
            .insert_one(&admin, None)
            .await
            .map_err(|e| conflict_or_store(e, "Username is already in use"))?;
        Ok(())
    }
}
