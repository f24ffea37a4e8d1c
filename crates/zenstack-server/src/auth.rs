use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::Json;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::{error_response, ApiError};
use crate::state::AppState;

/// HS256 token claims: who, what role, and the 24 h validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub role: String,
    pub iat: u64,
    pub exp: u64,
}

pub fn create_token(
    secret: &str,
    user_id: &str,
    role: &str,
    expire_secs: u64,
) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp() as u64;
    let claims = Claims {
        user_id: user_id.to_string(),
        role: role.to_string(),
        iat: now,
        exp: now + expire_secs,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn validate_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Bearer-token middleware for everything under `/v1` except login.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> axum::response::Response {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match auth_header {
        None => {
            return error_response(StatusCode::UNAUTHORIZED, "authorization header is required");
        }
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => token.trim(),
            _ => {
                return error_response(
                    StatusCode::UNAUTHORIZED,
                    "authorization header must be in the format 'Bearer <token>'",
                );
            }
        },
    };

    match validate_token(&state.jwt_secret, token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => error_response(StatusCode::UNAUTHORIZED, "invalid or expired token"),
    }
}

/// Role gate for `/v1/admin/**`. Must run after `jwt_auth_middleware`.
pub async fn require_admin_middleware(
    req: Request<Body>,
    next: Next,
) -> axum::response::Response {
    let role = req
        .extensions()
        .get::<Claims>()
        .map(|c| c.role.clone())
        .unwrap_or_default();
    if !role.eq_ignore_ascii_case("admin") {
        return error_response(StatusCode::FORBIDDEN, "insufficient permissions");
    }
    next.run(req).await
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: String,
}

/// 用户登录并获取 JWT。
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = LoginResponse),
        (status = 400, description = "请求参数错误", body = ApiError),
        (status = 401, description = "用户名或密码错误", body = ApiError),
        (status = 403, description = "账号待审批或已禁用", body = ApiError)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> impl IntoResponse {
    if body.username.is_empty() || body.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "username and password are required");
    }

    let user = match state.store.get_user_by_username(&body.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return error_response(StatusCode::UNAUTHORIZED, "invalid username or password");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to query user");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };

    if !bcrypt::verify(&body.password, &user.password_hash).unwrap_or(false) {
        return error_response(StatusCode::UNAUTHORIZED, "invalid username or password");
    }

    match user.status.to_ascii_lowercase().as_str() {
        "pending" => {
            return error_response(StatusCode::FORBIDDEN, "Account pending approval");
        }
        "disabled" => {
            return error_response(StatusCode::FORBIDDEN, "Account disabled");
        }
        _ => {}
    }

    match create_token(
        &state.jwt_secret,
        &user.id,
        &user.role,
        state.token_expire_secs,
    ) {
        Ok(token) => (
            StatusCode::OK,
            Json(LoginResponse {
                token,
                username: user.username,
                role: user.role,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create token");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to generate token")
        }
    }
}
