use std::sync::Arc;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{guard, web, HttpRequest};
use mongodb::Database;

use crate::auth::TokenService;
use crate::error::ApiError;
use crate::handlers::{accounts, products, reports};
use crate::middleware::{RequireAuth, RequireRole};
use crate::store::{MongoProductStore, MongoUserStore, ProductStore, UserStore};
use crate::uploads::UploadStore;

/// Everything the handlers depend on, built once at startup.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub uploads: UploadStore,
}

impl AppServices {
    pub fn mongo(db: &Database, tokens: TokenService, uploads: UploadStore) -> Self {
        AppServices {
            products: Arc::new(MongoProductStore::new(db)),
            users: Arc::new(MongoUserStore::new(db)),
            tokens,
            uploads,
        }
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation_with("Dados inválidos", err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation_with("Parâmetros inválidos", err.to_string()).into()
}

/// Registers every route. Role gates are attached inside the scopes that
/// carry `RequireAuth`, so authentication always runs first.
pub fn configure(cfg: &mut web::ServiceConfig, services: &AppServices) {
    cfg.app_data(web::Data::from(services.products.clone()))
        .app_data(web::Data::from(services.users.clone()))
        .app_data(web::Data::new(services.tokens.clone()))
        .app_data(web::Data::new(services.uploads.clone()))
        .app_data(
            web::JsonConfig::default()
                .content_type_required(false)
                .error_handler(json_error),
        )
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/register", web::post().to(accounts::register))
        .route("/login", web::post().to(accounts::login))
        .service(
            web::scope("/produtos")
                .wrap(RequireAuth::new(services.tokens.clone()))
                .service(
                    web::resource("")
                        .guard(guard::Post())
                        .wrap(RequireRole::manager())
                        .route(web::post().to(products::create)),
                )
                .route("", web::get().to(products::list))
                .route("/busca", web::get().to(products::search))
                .route("/baixo-estoque", web::get().to(products::low_stock))
                .route("/categoria/{categoria}", web::get().to(products::by_category))
                .service(
                    web::resource("/{id}")
                        .guard(guard::Put())
                        .wrap(RequireRole::manager())
                        .route(web::put().to(products::update)),
                )
                .service(
                    web::resource("/{id}")
                        .guard(guard::Delete())
                        .wrap(RequireRole::admin())
                        .route(web::delete().to(products::delete)),
                )
                .route("/{id}", web::get().to(products::get))
                .service(
                    web::resource("/{id}/estoque")
                        .wrap(RequireRole::manager())
                        .route(web::patch().to(products::adjust_stock)),
                )
                .service(
                    web::resource("/{id}/preco")
                        .wrap(RequireRole::manager())
                        .route(web::patch().to(products::adjust_price)),
                )
                .service(
                    web::resource("/{id}/imagem")
                        .wrap(RequireRole::manager())
                        .route(web::post().to(products::upload_image)),
                ),
        )
        .service(
            web::scope("/relatorios")
                .wrap(RequireRole::manager())
                .wrap(RequireAuth::new(services.tokens.clone()))
                .route("/estoque", web::get().to(reports::stock))
                .route(
                    "/produtos-mais-vendidos",
                    web::get().to(reports::top_sellers),
                )
                .route("/valor-total-estoque", web::get().to(reports::total_value)),
        );
}
