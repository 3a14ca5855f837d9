use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::inventory::{self, SizeCounts};
use crate::passwords::PasswordHash;

pub const DEFAULT_DESCRIPTION: &str = "A lightweight, usually knitted pullover sweater that is worn over a shirt, polo, or t-shirt to provide additional warmth and comfort.";

pub const CART_SLOTS: usize = 30;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Inventory {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<ObjectId>,
    #[serde(flatten)]
    pub counts: SizeCounts,
}

impl Inventory {
    pub fn new(counts: SizeCounts) -> Self {
        Inventory {
            storage_id: Some(ObjectId::new()),
            counts,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<ObjectId>,
    pub id: i64,
    pub name: String,
    pub image: String,
    pub category: String,
    pub description: String,
    pub inventory: Inventory,
    pub retail_price: f64,
    pub sale_price: Option<f64>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date_added: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date_modified: DateTime<Utc>,
    #[serde(default)]
    pub in_stock: i64,
    #[serde(default)]
    pub available: bool,
    #[serde(rename = "__v", default)]
    pub revision: i32,
}

impl Product {
    /// Recomputes `in_stock` and `available` from the inventory. Every
    /// store backend calls this right before writing the record.
    pub fn refresh_stock(&mut self) {
        let level = inventory::aggregate(&self.inventory.counts);
        self.in_stock = level.total;
        self.available = level.available;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: PasswordHash,
    #[serde(rename = "cartData")]
    pub cart_data: BTreeMap<String, i64>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

pub fn empty_cart() -> BTreeMap<String, i64> {
    (0..CART_SLOTS).map(|slot| (slot.to_string(), 0)).collect()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdminUser {
    pub username: String,
    pub password: PasswordHash,
    #[serde(rename = "clearanceLevel")]
    pub clearance_level: i32,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Counter {
    pub _id: String,
    pub seq: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,
}

// Request bodies. Every field is optional so that a missing field is
// reported as a validation failure by the services rather than a decode
// error. Numeric product fields accept numbers or numeric strings.

#[derive(Debug, Default, Deserialize)]
pub struct AddProductInput {
    pub name: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub retail_price: Option<Value>,
    pub sale_price: Option<Value>,
    pub xs: Option<Value>,
    pub s: Option<Value>,
    pub m: Option<Value>,
    pub l: Option<Value>,
    pub xl: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveProductInput {
    pub id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAllInput {
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignUpInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminCreateInput {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "clearanceLevel")]
    pub clearance_level: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminLoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}
