use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// `Option<DateTime<Utc>>` stored as a nullable BSON date.
mod optional_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(bson::DateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(bson::DateTime::to_chrono))
    }
}

/// Stored shape of a catalog entry in the `produtos` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "preco")]
    pub price: f64,
    #[serde(rename = "preco_promocional", default, skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<f64>,
    #[serde(rename = "estoque")]
    pub stock: i64,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "fornecedor", default)]
    pub supplier: String,
    #[serde(rename = "codigo_barras", default)]
    pub barcode: String,
    #[serde(rename = "data_criacao", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "ultima_atualizacao", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    // ativo, inativo, em_promocao
    #[serde(default)]
    pub status: String,
    #[serde(rename = "imagem_url", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    // Only populated by external tooling; read by the top-sellers report.
    #[serde(rename = "vendas_totais", default, skip_serializing_if = "Option::is_none")]
    pub total_sales: Option<i64>,
}

impl Product {
    pub fn from_input(input: ProductInput, now: DateTime<Utc>) -> Self {
        Product {
            id: ObjectId::new(),
            name: input.name,
            description: input.description,
            price: input.price,
            promo_price: input.promo_price,
            stock: input.stock,
            category: input.category,
            supplier: input.supplier,
            barcode: input.barcode,
            created_at: now,
            updated_at: now,
            status: input.status,
            image_url: input.image_url,
            tags: input.tags,
            total_sales: None,
        }
    }
}

/// Outward JSON projection of a [`Product`], with the id rendered as hex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "preco")]
    pub price: f64,
    #[serde(rename = "preco_promocional", default, skip_serializing_if = "Option::is_none")]
    pub promo_price: Option<f64>,
    #[serde(rename = "estoque")]
    pub stock: i64,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "fornecedor")]
    pub supplier: String,
    #[serde(rename = "codigo_barras")]
    pub barcode: String,
    #[serde(rename = "data_criacao")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "ultima_atualizacao")]
    pub updated_at: DateTime<Utc>,
    pub status: String,
    #[serde(rename = "imagem_url", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "vendas_totais", default, skip_serializing_if = "Option::is_none")]
    pub total_sales: Option<i64>,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        ProductView {
            id: p.id.to_hex(),
            name: p.name,
            description: p.description,
            price: p.price,
            promo_price: p.promo_price,
            stock: p.stock,
            category: p.category,
            supplier: p.supplier,
            barcode: p.barcode,
            created_at: p.created_at,
            updated_at: p.updated_at,
            status: p.status,
            image_url: p.image_url,
            tags: p.tags,
            total_sales: p.total_sales,
        }
    }
}

/// Body accepted by product create and update. Every field is optional on the
/// wire and falls back to its zero value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "preco")]
    pub price: f64,
    #[serde(rename = "preco_promocional")]
    pub promo_price: Option<f64>,
    #[serde(rename = "estoque")]
    pub stock: i64,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "fornecedor")]
    pub supplier: String,
    #[serde(rename = "codigo_barras")]
    pub barcode: String,
    pub status: String,
    #[serde(rename = "imagem_url")]
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// The three fields a full product update overwrites.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

impl From<ProductInput> for ProductUpdate {
    fn from(input: ProductInput) -> Self {
        ProductUpdate {
            name: input.name,
            price: input.price,
            stock: input.stock,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StockAdjustment {
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "operacao")]
    pub operation: String,
}

impl StockAdjustment {
    /// Signed delta to apply. Only an explicit add tag increments; every other
    /// value, including an empty one, decrements. `None` when the quantity
    /// cannot be negated.
    pub fn delta(&self) -> Option<i64> {
        match self.operation.as_str() {
            "add" | "adicionar" => Some(self.quantity),
            _ => self.quantity.checked_neg(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriceAdjustment {
    #[serde(rename = "novo_preco")]
    pub price: f64,
    #[serde(rename = "preco_promocional")]
    pub promo_price: f64,
}

/// Result of a single-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStock {
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "total_produtos")]
    pub product_count: i64,
    #[serde(rename = "total_estoque")]
    pub total_stock: i64,
    #[serde(rename = "valor_total")]
    pub total_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockValue {
    #[serde(rename = "valor_total")]
    pub total_value: f64,
    #[serde(rename = "total_itens")]
    pub total_items: i64,
    #[serde(rename = "total_produtos")]
    pub product_count: i64,
}

/// Stored account in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password_hash: String,
    // admin, manager, user
    pub role: String,
    #[serde(rename = "data_criacao", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "ultimo_acesso", default, with = "optional_bson_datetime")]
    pub last_access: Option<DateTime<Utc>>,
    #[serde(rename = "ativo")]
    pub active: bool,
}

/// Account as returned by registration; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "data_criacao")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "ultimo_acesso")]
    pub last_access: Option<DateTime<Utc>>,
    #[serde(rename = "ativo")]
    pub active: bool,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        UserView {
            id: u.id.to_hex(),
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role.clone(),
            created_at: u.created_at,
            last_access: u.last_access,
            active: u.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(u: &User) -> Self {
        UserSummary {
            id: u.id.to_hex(),
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUpInput {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInInput {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}
