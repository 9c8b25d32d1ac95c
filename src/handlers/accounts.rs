use actix_web::{web, HttpResponse};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::auth::{self, TokenService};
use crate::error::ApiError;
use crate::models::{AuthResponse, SignInInput, SignUpInput, User, UserSummary, UserView};
use crate::store::{with_deadline, UserStore};

type Users = web::Data<dyn UserStore>;

const DEFAULT_ROLE: &str = "user";

/// Creates an account. The email check and the insert are separate calls, so
/// concurrent sign-ups with one email can both succeed.
pub async fn register(
    users: Users,
    new_user: web::Json<SignUpInput>,
) -> Result<HttpResponse, ApiError> {
    let input = new_user.into_inner();
    if input.name.is_empty() || input.email.is_empty() || input.password.is_empty() {
        return Err(ApiError::validation("Nome, email e senha são obrigatórios"));
    }

    if with_deadline(users.find_by_email(&input.email)).await?.is_some() {
        return Err(ApiError::validation("Email já cadastrado"));
    }

    let password_hash = auth::hash_password(&input.password)?;

    let new_account = User {
        id: ObjectId::new(),
        name: input.name,
        email: input.email,
        password_hash,
        role: input
            .role
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        created_at: Utc::now(),
        last_access: None,
        active: true,
    };

    with_deadline(users.insert(&new_account)).await?;

    log::info!("Registered user {} with role {}", new_account.id, new_account.role);
    Ok(HttpResponse::Created().json(UserView::from(&new_account)))
}

pub async fn login(
    users: Users,
    tokens: web::Data<TokenService>,
    data: web::Json<SignInInput>,
) -> Result<HttpResponse, ApiError> {
    if data.email.is_empty() || data.password.is_empty() {
        return Err(ApiError::validation("Email e senha são obrigatórios"));
    }

    let user = with_deadline(users.find_by_email(&data.email))
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Email não encontrado"))?;

    if !auth::verify_password(&user.password_hash, &data.password) {
        log::info!("Failed login for user {}", user.id);
        return Err(ApiError::unauthenticated("Senha incorreta"));
    }

    let token = tokens.issue(&user.id.to_hex(), &user.role)?;

    // Best effort: the caller never sees this outcome.
    let store = users.clone().into_inner();
    let user_id = user.id;
    actix_web::rt::spawn(async move {
        if let Err(e) = with_deadline(store.touch_last_access(user_id, Utc::now())).await {
            log::warn!("Failed to record last access for {}: {}", user_id, e);
        }
    });

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}
