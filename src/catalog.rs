use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::allocator::IdAllocator;
use crate::assets::AssetStore;
use crate::error::{ApiError, ApiResult};
use crate::format::{self, FormattedProduct};
use crate::inventory::{self, SizeCounts};
use crate::models::{AddProductInput, Inventory, Product, DEFAULT_DESCRIPTION};
use crate::store::CatalogStore;

/// Summary returned after a product is saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSaved {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub available: bool,
    pub count: i64,
}

/// Validated add-product request.
#[derive(Debug, Clone, PartialEq)]
struct NewProduct {
    name: String,
    image: String,
    category: String,
    description: String,
    retail_price: f64,
    sale_price: Option<f64>,
    sizes: SizeCounts,
}

pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    allocator: IdAllocator,
    assets: AssetStore,
    delete_secret: Option<String>,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        allocator: IdAllocator,
        assets: AssetStore,
        delete_secret: Option<String>,
    ) -> Self {
        Catalog {
            store,
            allocator,
            assets,
            delete_secret,
        }
    }

    pub async fn add_product(&self, input: AddProductInput) -> ApiResult<ProductSaved> {
        let new = validate(input)?;
        let id = self.allocator.allocate(self.store.as_ref()).await?;

        let now = Utc::now();
        let product = Product {
            storage_id: None,
            id,
            name: new.name,
            image: new.image,
            category: new.category,
            description: new.description,
            inventory: Inventory::new(new.sizes),
            retail_price: new.retail_price,
            sale_price: new.sale_price,
            date_added: now,
            date_modified: now,
            in_stock: 0,
            available: false,
            revision: 0,
        };

        let saved = self.store.insert_product(product).await?;
        let level = inventory::aggregate(&saved.inventory.counts);
        log::info!("Product saved: {} - {}", saved.id, saved.name);

        Ok(ProductSaved {
            id: saved.id,
            name: saved.name,
            category: saved.category,
            available: level.available,
            count: level.total,
        })
    }

    /// Deletes one product and queues removal of its image file.
    pub async fn remove_product(&self, id: Option<&Value>) -> ApiResult<i64> {
        let id = id
            .and_then(as_integer)
            .ok_or_else(|| ApiError::Validation("Missing required fields".to_string()))?;

        let product = self
            .store
            .find_and_delete_product(id)
            .await?
            .ok_or_else(|| {
                log::info!("Product id: {} not found, cannot delete.", id);
                ApiError::NotFound("Product not found".to_string())
            })?;

        self.assets.schedule_removal(product.image);
        log::info!("Removed: {}", id);
        Ok(id)
    }

    pub async fn delete_all_products(&self, password: Option<&str>) -> ApiResult<u64> {
        let authorized = matches!(
            (self.delete_secret.as_deref(), password),
            (Some(secret), Some(given)) if secret == given
        );
        if !authorized {
            return Err(ApiError::Unauthorized(
                "Unauthorized access deleting all products".to_string(),
            ));
        }

        let deleted = self.store.delete_all_products().await?;
        log::warn!("Deleted all {} products", deleted);
        Ok(deleted)
    }

    pub async fn list_products(&self) -> ApiResult<Vec<FormattedProduct>> {
        let products: Vec<FormattedProduct> = self
            .store
            .all_products()
            .await?
            .into_iter()
            .map(format::format)
            .collect();
        log::debug!(
            "All products fetched: {:?}",
            products.iter().map(|(id, _)| *id).collect::<Vec<_>>()
        );
        Ok(products)
    }

    pub async fn get_product(&self, id: i64) -> ApiResult<FormattedProduct> {
        let product = self
            .store
            .find_product(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
        log::debug!("1 Product fetched {}", product.id);
        Ok(format::format(product))
    }
}

fn validate(input: AddProductInput) -> ApiResult<NewProduct> {
    let missing = || ApiError::Validation("Missing required fields".to_string());

    let name = required_text(input.name).ok_or_else(missing)?;
    let image = required_text(input.image).ok_or_else(missing)?;
    let category = required_text(input.category).ok_or_else(missing)?;
    let retail_price = input
        .retail_price
        .filter(|v| !v.is_null())
        .ok_or_else(missing)?;

    let retail_price = as_number(&retail_price)
        .filter(|price| *price > 0.0)
        .ok_or_else(|| ApiError::Validation("Invalid retail_price value".to_string()))?;

    let sizes = SizeCounts {
        xs: size_count("xs", input.xs.as_ref())?,
        s: size_count("s", input.s.as_ref())?,
        m: size_count("m", input.m.as_ref())?,
        l: size_count("l", input.l.as_ref())?,
        xl: size_count("xl", input.xl.as_ref())?,
    };
    if sizes.checked_total().is_none() {
        return Err(ApiError::Validation("Invalid inventory value".to_string()));
    }

    Ok(NewProduct {
        name,
        image,
        category,
        description: required_text(input.description)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        retail_price,
        sale_price: normalize_sale_price(input.sale_price.as_ref()),
        sizes,
    })
}

fn required_text(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Anything that is not a positive number means "no sale".
pub fn normalize_sale_price(value: Option<&Value>) -> Option<f64> {
    value.and_then(as_number).filter(|price| *price > 0.0)
}

fn size_count(size: &str, value: Option<&Value>) -> ApiResult<i64> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(v) => as_integer(v)
            .filter(|count| *count >= 0)
            .ok_or_else(|| ApiError::Validation(format!("Invalid {} value", size))),
    }
}

/// A JSON number, or a string holding one.
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Whole JSON numbers (`1001` or `1001.0`), or a string holding one.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdStrategy;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::path::PathBuf;

    fn catalog() -> Catalog {
        Catalog::new(
            Arc::new(MemoryStore::default()),
            IdAllocator::new(1001, IdStrategy::LastInserted),
            AssetStore::new(PathBuf::from("/nonexistent"), "http://localhost:4000"),
            Some("let-me-delete".to_string()),
        )
    }

    fn input(body: Value) -> AddProductInput {
        serde_json::from_value(body).unwrap()
    }

    fn tee() -> AddProductInput {
        input(json!({
            "name": "Tee",
            "image": "u",
            "category": "shirts",
            "retail_price": 20,
            "m": 5
        }))
    }

    #[test]
    fn sale_price_normalization() {
        for raw in [json!(0), json!(-5), json!("abc"), Value::Null] {
            assert_eq!(normalize_sale_price(Some(&raw)), None, "{}", raw);
        }
        assert_eq!(normalize_sale_price(None), None);
        assert_eq!(normalize_sale_price(Some(&json!(49.99))), Some(49.99));
        assert_eq!(normalize_sale_price(Some(&json!("49.99"))), Some(49.99));
    }

    #[test]
    fn validation_requires_core_fields() {
        let err = validate(input(json!({"name": "Tee", "image": "u", "retail_price": 3}))).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "Missing required fields"));

        let err = validate(input(json!({
            "name": "Tee", "image": "u", "category": "shirts", "retail_price": "abc"
        })))
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "Invalid retail_price value"));
    }

    #[test]
    fn validation_rejects_negative_sizes() {
        let err = validate(input(json!({
            "name": "Tee", "image": "u", "category": "shirts", "retail_price": 20, "xl": -1
        })))
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "Invalid xl value"));
    }

    #[test]
    fn validation_fills_defaults() {
        let new = validate(input(json!({
            "name": "Tee", "image": "u", "category": "shirts", "retail_price": "20", "s": "2"
        })))
        .unwrap();
        assert_eq!(new.retail_price, 20.0);
        assert_eq!(new.description, DEFAULT_DESCRIPTION);
        assert_eq!(new.sizes.s, 2);
        assert_eq!(new.sizes.xs, 0);
        assert_eq!(new.sale_price, None);
    }

    #[test]
    fn validation_rejects_inventory_that_overflows() {
        let err = validate(input(json!({
            "name": "Tee", "image": "u", "category": "shirts", "retail_price": 20,
            "xs": i64::MAX, "s": 1
        })))
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "Invalid inventory value"));
    }

    #[test]
    fn whole_floats_count_as_integers() {
        assert_eq!(as_integer(&json!(1001.0)), Some(1001));
        assert_eq!(as_integer(&json!(1001.5)), None);
        assert_eq!(as_integer(&json!(1e300)), None);
        assert_eq!(as_integer(&json!(" 7 ")), Some(7));
    }

    #[actix_web::test]
    async fn remove_accepts_whole_float_id() {
        let catalog = catalog();
        catalog.add_product(tee()).await.unwrap();
        assert_eq!(catalog.remove_product(Some(&json!(1001.0))).await.unwrap(), 1001);
    }

    #[actix_web::test]
    async fn add_first_product() {
        let saved = catalog().add_product(tee()).await.unwrap();
        assert_eq!(
            saved,
            ProductSaved {
                id: 1001,
                name: "Tee".into(),
                category: "shirts".into(),
                available: true,
                count: 5,
            }
        );
    }

    #[actix_web::test]
    async fn ids_follow_the_previous_insert() {
        let catalog = catalog();
        for expected in 1001..1004 {
            assert_eq!(catalog.add_product(tee()).await.unwrap().id, expected);
        }
    }

    #[actix_web::test]
    async fn out_of_stock_product_is_unavailable() {
        let saved = catalog()
            .add_product(input(json!({
                "name": "Hat", "image": "u", "category": "hats", "retail_price": 9.5
            })))
            .await
            .unwrap();
        assert_eq!(saved.count, 0);
        assert!(!saved.available);
    }

    #[actix_web::test]
    async fn remove_and_get() {
        let catalog = catalog();
        catalog.add_product(tee()).await.unwrap();

        let (id, view) = catalog.get_product(1001).await.unwrap();
        assert_eq!(id, 1001);
        assert_eq!(view.in_stock, 5);

        assert_eq!(catalog.remove_product(Some(&json!("1001"))).await.unwrap(), 1001);
        assert!(matches!(
            catalog.get_product(1001).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            catalog.remove_product(Some(&json!(1001))).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            catalog.remove_product(None).await.unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[actix_web::test]
    async fn delete_all_needs_the_secret() {
        let catalog = catalog();
        catalog.add_product(tee()).await.unwrap();

        let err = catalog.delete_all_products(Some("guess")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert!(catalog.delete_all_products(None).await.is_err());
        assert_eq!(catalog.list_products().await.unwrap().len(), 1);

        assert_eq!(catalog.delete_all_products(Some("let-me-delete")).await.unwrap(), 1);
        assert!(catalog.list_products().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn delete_all_is_closed_without_a_configured_secret() {
        let catalog = Catalog::new(
            Arc::new(MemoryStore::default()),
            IdAllocator::new(1001, IdStrategy::LastInserted),
            AssetStore::new(PathBuf::from("/nonexistent"), "http://localhost:4000"),
            None,
        );
        assert!(catalog.delete_all_products(Some("")).await.is_err());
    }
}
