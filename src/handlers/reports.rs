use actix_web::{web, HttpResponse};

use super::{parse_limit, LimitParams};
use crate::error::ApiError;
use crate::models::ProductView;
use crate::store::{with_deadline, ProductStore};

type Products = web::Data<dyn ProductStore>;

const TOP_SELLERS_DEFAULT: i64 = 10;

/// Per-category count, stock and value.
pub async fn stock(products: Products) -> Result<HttpResponse, ApiError> {
    let rows = with_deadline(products.stock_by_category()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Products ordered by `vendas_totais`. Nothing in this API writes that
/// field, so ordering depends on external data.
pub async fn top_sellers(
    products: Products,
    params: web::Query<LimitParams>,
) -> Result<HttpResponse, ApiError> {
    let limit = parse_limit(params.limite.as_deref(), TOP_SELLERS_DEFAULT);
    let found = with_deadline(products.top_sellers(limit)).await?;
    let views: Vec<ProductView> = found.into_iter().map(ProductView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn total_value(products: Products) -> Result<HttpResponse, ApiError> {
    let totals = with_deadline(products.stock_value()).await?.unwrap_or_default();
    Ok(HttpResponse::Ok().json(totals))
}
