use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::results::UpdateResult;
use mongodb::{Collection, Database};
use serde::de::DeserializeOwned;

use super::{ProductStore, StoreError, StoreResult, UserStore};
use crate::models::{
    CategoryStock, PriceAdjustment, Product, ProductUpdate, StockValue, UpdateOutcome, User,
};

pub const PRODUCTS: &str = "produtos";
pub const USERS: &str = "users";

impl From<UpdateResult> for UpdateOutcome {
    fn from(r: UpdateResult) -> Self {
        UpdateOutcome {
            matched: r.matched_count,
            modified: r.modified_count,
        }
    }
}

/// Decodes each row on its own, skipping rows that do not fit `T`.
fn decode_lenient<T: DeserializeOwned>(rows: Vec<Document>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match bson::from_document::<T>(row) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Skipping undecodable document: {}", e);
                None
            }
        })
        .collect()
}

pub struct MongoProductStore {
    collection: Collection<Product>,
}

impl MongoProductStore {
    pub fn new(db: &Database) -> Self {
        MongoProductStore {
            collection: db.collection::<Product>(PRODUCTS),
        }
    }

    async fn find_many(&self, filter: Document) -> StoreResult<Vec<Product>> {
        let cursor = self.collection.find(filter, None).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> StoreResult<Vec<Document>> {
        let cursor = self.collection.aggregate(pipeline, None).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    fn search_filter(pattern: &str) -> Document {
        doc! {
            "$or": [
                { "nome": { "$regex": pattern, "$options": "i" } },
                { "descricao": { "$regex": pattern, "$options": "i" } },
                { "tags": { "$regex": pattern, "$options": "i" } },
            ]
        }
    }

    fn category_pipeline() -> Vec<Document> {
        vec![
            doc! {
                "$group": {
                    "_id": "$categoria",
                    "total_produtos": { "$sum": 1 },
                    "total_estoque": { "$sum": "$estoque" },
                    "valor_total": { "$sum": { "$multiply": ["$preco", "$estoque"] } },
                }
            },
            doc! {
                "$project": {
                    "_id": 0,
                    "categoria": "$_id",
                    "total_produtos": 1,
                    "total_estoque": 1,
                    "valor_total": 1,
                }
            },
            doc! { "$sort": { "categoria": 1 } },
        ]
    }

    fn stock_value_pipeline() -> Vec<Document> {
        vec![
            doc! {
                "$group": {
                    "_id": null,
                    "valor_total": { "$sum": { "$multiply": ["$preco", "$estoque"] } },
                    "total_itens": { "$sum": "$estoque" },
                    "total_produtos": { "$sum": 1 },
                }
            },
            doc! { "$project": { "_id": 0 } },
        ]
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn list(&self) -> StoreResult<Vec<Product>> {
        self.find_many(doc! {}).await
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Product>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert(&self, product: &Product) -> StoreResult<()> {
        self.collection.insert_one(product, None).await?;
        Ok(())
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        fields: &ProductUpdate,
    ) -> StoreResult<UpdateOutcome> {
        let update = doc! {
            "$set": {
                "nome": &fields.name,
                "preco": fields.price,
                "estoque": fields.stock,
            }
        };
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await?;
        Ok(result.into())
    }

    async fn delete(&self, id: ObjectId) -> StoreResult<u64> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count)
    }

    async fn find_by_category(&self, category: &str) -> StoreResult<Vec<Product>> {
        self.find_many(doc! { "categoria": category }).await
    }

    async fn search(&self, pattern: &str) -> StoreResult<Vec<Product>> {
        self.find_many(Self::search_filter(pattern)).await
    }

    async fn increment_stock(&self, id: ObjectId, delta: i64) -> StoreResult<UpdateOutcome> {
        let update = doc! { "$inc": { "estoque": delta } };
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await?;
        Ok(result.into())
    }

    async fn set_price(
        &self,
        id: ObjectId,
        change: &PriceAdjustment,
        at: DateTime<Utc>,
    ) -> StoreResult<UpdateOutcome> {
        let update = doc! {
            "$set": {
                "preco": change.price,
                "preco_promocional": change.promo_price,
                "ultima_atualizacao": bson::DateTime::from_chrono(at),
            }
        };
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await?;
        Ok(result.into())
    }

    async fn find_low_stock(&self, threshold: i64) -> StoreResult<Vec<Product>> {
        self.find_many(doc! { "estoque": { "$lt": threshold } }).await
    }

    async fn set_image(
        &self,
        id: ObjectId,
        url: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<UpdateOutcome> {
        let update = doc! {
            "$set": {
                "imagem_url": url,
                "ultima_atualizacao": bson::DateTime::from_chrono(at),
            }
        };
        let result = self.collection.update_one(doc! { "_id": id }, update, None).await?;
        Ok(result.into())
    }

    async fn stock_by_category(&self) -> StoreResult<Vec<CategoryStock>> {
        self.aggregate(Self::category_pipeline())
            .await?
            .into_iter()
            .map(|row| bson::from_document::<CategoryStock>(row).map_err(StoreError::from))
            .collect()
    }

    async fn top_sellers(&self, limit: i64) -> StoreResult<Vec<Product>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let pipeline = vec![
            doc! { "$sort": { "vendas_totais": -1 } },
            doc! { "$limit": limit },
        ];
        Ok(decode_lenient(self.aggregate(pipeline).await?))
    }

    async fn stock_value(&self) -> StoreResult<Option<StockValue>> {
        match self.aggregate(Self::stock_value_pipeline()).await?.into_iter().next() {
            Some(row) => Ok(Some(bson::from_document(row)?)),
            None => Ok(None),
        }
    }
}

pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        MongoUserStore {
            collection: db.collection::<User>(USERS),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }, None).await?)
    }

    async fn insert(&self, user: &User) -> StoreResult<()> {
        self.collection.insert_one(user, None).await?;
        Ok(())
    }

    async fn touch_last_access(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<()> {
        let update = doc! { "$set": { "ultimo_acesso": bson::DateTime::from_chrono(at) } };
        self.collection.update_one(doc! { "_id": id }, update, None).await?;
        Ok(())
    }
}
