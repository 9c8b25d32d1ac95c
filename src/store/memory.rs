use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use regex::RegexBuilder;
use tokio::sync::RwLock;

use super::{ProductStore, StoreError, StoreResult, UserStore};
use crate::models::{
    CategoryStock, PriceAdjustment, Product, ProductUpdate, StockValue, UpdateOutcome, User,
};

/// Products kept in insertion order behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        MemoryProductStore {
            products: RwLock::new(products),
        }
    }

    async fn filtered<F>(&self, keep: F) -> Vec<Product>
    where
        F: Fn(&Product) -> bool,
    {
        let products = self.products.read().await;
        products.iter().filter(|p| keep(p)).cloned().collect()
    }

    async fn modify<F>(&self, id: ObjectId, apply: F) -> UpdateOutcome
    where
        F: FnOnce(&mut Product),
    {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                let before = product.clone();
                apply(product);
                UpdateOutcome {
                    matched: 1,
                    modified: u64::from(*product != before),
                }
            }
            None => UpdateOutcome::default(),
        }
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.products.write().await;
        if products.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Backend(format!("duplicate key {}", product.id)));
        }
        products.push(product.clone());
        Ok(())
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        fields: &ProductUpdate,
    ) -> StoreResult<UpdateOutcome> {
        Ok(self
            .modify(id, |p| {
                p.name = fields.name.clone();
                p.price = fields.price;
                p.stock = fields.stock;
            })
            .await)
    }

    async fn delete(&self, id: ObjectId) -> StoreResult<u64> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok((before - products.len()) as u64)
    }

    async fn find_by_category(&self, category: &str) -> StoreResult<Vec<Product>> {
        Ok(self.filtered(|p| p.category == category).await)
    }

    async fn search(&self, pattern: &str) -> StoreResult<Vec<Product>> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(self
            .filtered(|p| {
                re.is_match(&p.name)
                    || re.is_match(&p.description)
                    || p.tags.iter().flatten().any(|t| re.is_match(t))
            })
            .await)
    }

    async fn increment_stock(&self, id: ObjectId, delta: i64) -> StoreResult<UpdateOutcome> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(UpdateOutcome::default());
        };

        let stock = product
            .stock
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend(format!("stock overflow on {}", id)))?;
        let modified = u64::from(stock != product.stock);
        product.stock = stock;
        Ok(UpdateOutcome { matched: 1, modified })
    }

    async fn set_price(
        &self,
        id: ObjectId,
        change: &PriceAdjustment,
        at: DateTime<Utc>,
    ) -> StoreResult<UpdateOutcome> {
        Ok(self
            .modify(id, |p| {
                p.price = change.price;
                p.promo_price = Some(change.promo_price);
                p.updated_at = at;
            })
            .await)
    }

    async fn find_low_stock(&self, threshold: i64) -> StoreResult<Vec<Product>> {
        Ok(self.filtered(|p| p.stock < threshold).await)
    }

    async fn set_image(
        &self,
        id: ObjectId,
        url: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<UpdateOutcome> {
        Ok(self
            .modify(id, |p| {
                p.image_url = Some(url.to_string());
                p.updated_at = at;
            })
            .await)
    }

    async fn stock_by_category(&self) -> StoreResult<Vec<CategoryStock>> {
        let products = self.products.read().await;
        let mut groups: BTreeMap<&str, CategoryStock> = BTreeMap::new();

        for p in products.iter() {
            let row = groups.entry(p.category.as_str()).or_insert_with(|| CategoryStock {
                category: Some(p.category.clone()),
                product_count: 0,
                total_stock: 0,
                total_value: 0.0,
            });
            row.product_count += 1;
            row.total_stock += p.stock;
            row.total_value += p.price * p.stock as f64;
        }

        Ok(groups.into_values().collect())
    }

    async fn top_sellers(&self, limit: i64) -> StoreResult<Vec<Product>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let mut products = self.products.read().await.clone();
        // Descending; documents without the field sort last.
        products.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));
        products.truncate(limit as usize);
        Ok(products)
    }

    async fn stock_value(&self) -> StoreResult<Option<StockValue>> {
        let products = self.products.read().await;
        if products.is_empty() {
            return Ok(None);
        }

        Ok(Some(products.iter().fold(StockValue::default(), |mut acc, p| {
            acc.total_value += p.price * p.stock as f64;
            acc.total_items += p.stock;
            acc.product_count += 1;
            acc
        })))
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> StoreResult<()> {
        self.users.write().await.push(user.clone());
        Ok(())
    }

    async fn touch_last_access(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_access = Some(at);
        }
        Ok(())
    }
}
