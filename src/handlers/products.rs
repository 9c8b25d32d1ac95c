use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::stream::StreamExt;
use serde::Deserialize;
use serde_json::json;

use super::{object_id, parse_limit, LimitParams};
use crate::error::ApiError;
use crate::middleware::Principal;
use crate::models::{PriceAdjustment, Product, ProductInput, ProductView, StockAdjustment};
use crate::store::{with_deadline, ProductStore};
use crate::uploads::UploadStore;

type Products = web::Data<dyn ProductStore>;

const LOW_STOCK_DEFAULT: i64 = 5;
const IMAGE_FIELD: &str = "imagem";

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

fn views(products: Vec<Product>) -> Vec<ProductView> {
    products.into_iter().map(ProductView::from).collect()
}

pub async fn list(products: Products) -> Result<HttpResponse, ApiError> {
    let found = with_deadline(products.list()).await?;
    Ok(HttpResponse::Ok().json(views(found)))
}

pub async fn get(products: Products, id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    match with_deadline(products.find_by_id(object_id(&id))).await? {
        Some(product) => Ok(HttpResponse::Ok().json(ProductView::from(product))),
        None => Err(ApiError::not_found("Produto não encontrado")),
    }
}

pub async fn create(
    products: Products,
    principal: Principal,
    data: web::Json<ProductInput>,
) -> Result<HttpResponse, ApiError> {
    let product = Product::from_input(data.into_inner(), Utc::now());
    with_deadline(products.insert(&product)).await?;

    log::info!("Product {} created by {}", product.id, principal.user_id);
    Ok(HttpResponse::Created().json(ProductView::from(product)))
}

pub async fn update(
    products: Products,
    id: web::Path<String>,
    data: web::Json<ProductInput>,
) -> Result<HttpResponse, ApiError> {
    let id = object_id(&id);
    let outcome = with_deadline(products.update_fields(id, &data.into_inner().into())).await?;

    log::info!("Product {} updated ({} matched)", id, outcome.matched);
    Ok(HttpResponse::Ok().json(json!({ "message": "Produto atualizado com sucesso" })))
}

/// Succeeds whether or not a document matched.
pub async fn delete(
    products: Products,
    principal: Principal,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = object_id(&id);
    let deleted = with_deadline(products.delete(id)).await?;

    log::info!("Product {} deleted by {} ({} removed)", id, principal.user_id, deleted);
    Ok(HttpResponse::Ok().json(json!({ "message": "Produto removido com sucesso" })))
}

pub async fn by_category(
    products: Products,
    category: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let found = with_deadline(products.find_by_category(&category)).await?;
    Ok(HttpResponse::Ok().json(views(found)))
}

pub async fn search(
    products: Products,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, ApiError> {
    let found = with_deadline(products.search(&params.q)).await?;
    Ok(HttpResponse::Ok().json(views(found)))
}

pub async fn adjust_stock(
    products: Products,
    id: web::Path<String>,
    data: web::Json<StockAdjustment>,
) -> Result<HttpResponse, ApiError> {
    let id = object_id(&id);
    let delta = data
        .delta()
        .ok_or_else(|| ApiError::validation("Quantidade inválida"))?;
    let outcome = with_deadline(products.increment_stock(id, delta)).await?;

    log::info!("Stock of product {} changed by {}", id, delta);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Estoque atualizado",
        "modificados": outcome.modified,
    })))
}

pub async fn adjust_price(
    products: Products,
    id: web::Path<String>,
    data: web::Json<PriceAdjustment>,
) -> Result<HttpResponse, ApiError> {
    let id = object_id(&id);
    let outcome = with_deadline(products.set_price(id, &data, Utc::now())).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Preço atualizado",
        "modificados": outcome.modified,
    })))
}

pub async fn low_stock(
    products: Products,
    params: web::Query<LimitParams>,
) -> Result<HttpResponse, ApiError> {
    let threshold = parse_limit(params.limite.as_deref(), LOW_STOCK_DEFAULT);
    let found = with_deadline(products.find_low_stock(threshold)).await?;
    Ok(HttpResponse::Ok().json(views(found)))
}

/// Stores the `imagem` form file and points the product at it. Files already
/// written are left in place if the product update fails.
pub async fn upload_image(
    products: Products,
    uploads: web::Data<UploadStore>,
    id: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let id = object_id(&id);
    let (original_name, bytes) = read_image(payload)
        .await
        .ok_or_else(|| ApiError::validation("Arquivo não encontrado"))?;

    let now = Utc::now();
    let file_name = UploadStore::file_name(&id, &original_name, now);
    let url = uploads.save(&file_name, &bytes).await.map_err(|e| {
        log::error!("Failed to write {}: {}", file_name, e);
        ApiError::dependency("Erro ao salvar arquivo")
    })?;

    with_deadline(products.set_image(id, &url, now)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Imagem atualizada",
        "url": url,
    })))
}

async fn read_image(mut payload: Multipart) -> Option<(String, Vec<u8>)> {
    while let Some(item) = payload.next().await {
        let mut field = item.ok()?;
        let (name, file_name) = {
            let disposition = field.content_disposition();
            (
                disposition.get_name().map(str::to_owned),
                disposition.get_filename().map(str::to_owned),
            )
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk.ok()?);
        }

        if let (Some(IMAGE_FIELD), Some(file_name)) = (name.as_deref(), file_name) {
            return Some((file_name, bytes));
        }
    }
    None
}
