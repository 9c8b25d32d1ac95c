//! Typed persistence gateway over the `produtos` and `users` collections.
//!
//! Each operation the handlers need is a method with concrete input and
//! output types. `mongo` talks to MongoDB, `memory` keeps documents in
//! process and backs the test suite.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{
    CategoryStock, PriceAdjustment, Product, ProductUpdate, StockValue, UpdateOutcome, User,
};

pub mod memory;
pub mod mongo;

pub use memory::{MemoryProductStore, MemoryUserStore};
pub use mongo::{MongoProductStore, MongoUserStore};

/// Upper bound for any single gateway call.
pub const DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
    #[error("operation exceeded the {0:?} deadline")]
    Timeout(Duration),
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Runs a gateway call under [`DEADLINE`].
pub async fn with_deadline<T, F>(call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(DEADLINE, call)
        .await
        .map_err(|_| StoreError::Timeout(DEADLINE))?
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Product>>;

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Product>>;

    async fn insert(&self, product: &Product) -> StoreResult<()>;

    /// Overwrites name, price and stock; nothing else.
    async fn update_fields(&self, id: ObjectId, fields: &ProductUpdate)
        -> StoreResult<UpdateOutcome>;

    /// Returns the number of deleted documents.
    async fn delete(&self, id: ObjectId) -> StoreResult<u64>;

    async fn find_by_category(&self, category: &str) -> StoreResult<Vec<Product>>;

    /// Case-insensitive regex over name, description and tags.
    async fn search(&self, pattern: &str) -> StoreResult<Vec<Product>>;

    /// Atomic `$inc` on the stock field. No floor is applied.
    async fn increment_stock(&self, id: ObjectId, delta: i64) -> StoreResult<UpdateOutcome>;

    async fn set_price(
        &self,
        id: ObjectId,
        change: &PriceAdjustment,
        at: DateTime<Utc>,
    ) -> StoreResult<UpdateOutcome>;

    /// Products with stock strictly below `threshold`.
    async fn find_low_stock(&self, threshold: i64) -> StoreResult<Vec<Product>>;

    async fn set_image(&self, id: ObjectId, url: &str, at: DateTime<Utc>)
        -> StoreResult<UpdateOutcome>;

    async fn stock_by_category(&self) -> StoreResult<Vec<CategoryStock>>;

    async fn top_sellers(&self, limit: i64) -> StoreResult<Vec<Product>>;

    /// `None` when the collection is empty.
    async fn stock_value(&self) -> StoreResult<Option<StockValue>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact, case-sensitive email match.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn insert(&self, user: &User) -> StoreResult<()>;

    async fn touch_last_access(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<()>;
}
