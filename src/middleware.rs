//! Authentication and role gating.
//!
//! `RequireAuth` validates the bearer token and stores a [`Principal`] in the
//! request extensions. `RequireRole` reads that principal, so it must sit
//! inside `RequireAuth` in the chain; on its own it rejects every request.

use std::rc::Rc;

use actix_service::{forward_ready, Service};
use actix_web::body::EitherBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ok, ready, LocalBoxFuture, Ready};

use crate::auth::TokenService;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn from_claim(role: &str) -> Option<Role> {
        match role {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// Identity attached to a request once its token has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: String,
}

impl Principal {
    pub fn role(&self) -> Option<Role> {
        Role::from_claim(&self.role)
    }
}

impl FromRequest for Principal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        ready(principal.ok_or_else(|| ApiError::unauthenticated("Token não fornecido").into()))
    }
}

/// Strips a literal `Bearer ` prefix; anything else is passed through as-is.
fn bearer_token(header: &str) -> &str {
    header.strip_prefix("Bearer ").unwrap_or(header)
}

pub struct RequireAuth {
    tokens: TokenService,
}

impl RequireAuth {
    pub fn new(tokens: TokenService) -> Self {
        RequireAuth { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireAuthMiddleware {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        })
    }
}

pub struct RequireAuthMiddleware<S> {
    service: Rc<S>,
    tokens: TokenService,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let tokens = self.tokens.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get(AUTHORIZATION)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_str().unwrap_or_default().to_owned());

            let Some(header) = header else {
                let err = ApiError::unauthenticated("Token não fornecido");
                return Ok(req.error_response(err).map_into_right_body());
            };

            let claims = match tokens.validate(bearer_token(&header)) {
                Ok(claims) => claims,
                Err(e) => {
                    log::debug!("Rejected token for {}: {}", req.path(), e);
                    let err = ApiError::unauthenticated("Token inválido");
                    return Ok(req.error_response(err).map_into_right_body());
                }
            };

            req.extensions_mut().insert(Principal {
                user_id: claims.sub,
                role: claims.role,
            });

            service.call(req).await.map(|res| res.map_into_left_body())
        })
    }
}

/// Admits only principals whose role is in the allowed set.
pub struct RequireRole {
    allowed: &'static [Role],
}

impl RequireRole {
    pub fn admin() -> Self {
        RequireRole {
            allowed: &[Role::Admin],
        }
    }

    pub fn manager() -> Self {
        RequireRole {
            allowed: &[Role::Admin, Role::Manager],
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireRoleMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed: self.allowed,
        })
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed: &'static [Role],
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let permitted = req
            .extensions()
            .get::<Principal>()
            .and_then(Principal::role)
            .map_or(false, |role| self.allowed.contains(&role));

        if !permitted {
            let res = req.error_response(ApiError::Authorization);
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await.map(|res| res.map_into_left_body()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};
    use chrono::Duration;

    async fn whoami(principal: Principal) -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({
            "sub": principal.user_id,
            "role": principal.role,
        }))
    }

    fn tokens() -> TokenService {
        TokenService::new("middleware-secret", Duration::hours(1))
    }

    #[::core::prelude::v1::test]
    fn strips_only_literal_bearer_prefix() {
        assert_eq!(bearer_token("Bearer abc"), "abc");
        assert_eq!(bearer_token("abc"), "abc");
        assert_eq!(bearer_token("bearer abc"), "bearer abc");
    }

    #[::core::prelude::v1::test]
    fn parses_known_roles_only() {
        assert_eq!(Role::from_claim("manager"), Some(Role::Manager));
        assert_eq!(Role::from_claim("Admin"), None);
        assert_eq!(Role::from_claim(""), None);
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let app = test::init_service(
            App::new().service(
                web::scope("")
                    .wrap(RequireAuth::new(tokens()))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn token_without_prefix_is_accepted() {
        let app = test::init_service(
            App::new().service(
                web::scope("")
                    .wrap(RequireAuth::new(tokens()))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let token = tokens().issue("u-1", "user").unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", token))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sub"], "u-1");
        assert_eq!(body["role"], "user");
    }

    #[actix_web::test]
    async fn role_gate_without_auth_always_rejects() {
        let app = test::init_service(
            App::new().service(
                web::scope("")
                    .wrap(RequireRole::manager())
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let token = tokens().issue("u-1", "admin").unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn role_gate_checks_allowed_set() {
        let app = test::init_service(
            App::new().service(
                web::scope("")
                    .wrap(RequireRole::admin())
                    .wrap(RequireAuth::new(tokens()))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        for (role, expected) in [
            ("admin", StatusCode::OK),
            ("manager", StatusCode::FORBIDDEN),
            ("user", StatusCode::FORBIDDEN),
            ("superuser", StatusCode::FORBIDDEN),
        ] {
            let token = tokens().issue("u-1", role).unwrap();
            let req = test::TestRequest::get()
                .uri("/me")
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "role {role}");
        }
    }
}
