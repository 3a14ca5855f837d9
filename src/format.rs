use serde::Serialize;

use crate::inventory::SizeCounts;
use crate::models::Product;

/// Client-facing product. Storage ids, the revision marker and the
/// timestamps have no field here, so they cannot leak into a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub category: String,
    pub description: String,
    pub inventory: SizeCounts,
    pub retail_price: f64,
    pub sale_price: Option<f64>,
    pub in_stock: i64,
    pub available: bool,
}

/// Serializes as `[id, view]`.
pub type FormattedProduct = (i64, ProductView);

pub fn format(product: Product) -> FormattedProduct {
    let view = ProductView {
        id: product.id,
        name: product.name,
        image: product.image,
        category: product.category,
        description: product.description,
        inventory: product.inventory.counts,
        retail_price: product.retail_price,
        sale_price: product.sale_price,
        in_stock: product.in_stock,
        available: product.available,
    };
    (product.id, view)
}
