use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use zenstack_storage::{MessageTemplateUpdate, NotificationConfigUpdate, TelegramConfigUpdate};

use crate::api::{error_response, error_response_with_details, storage_error_response, ApiError};
use crate::state::AppState;

// ---- webhook configs ----

#[derive(Deserialize, ToSchema)]
pub struct CreateConfigRequest {
    pub platform: String,
    pub endpoint: String,
    pub secret: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// 列出通知渠道配置。
#[utoipa::path(
    get,
    path = "/v1/admin/notifications/configs",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "通知渠道配置列表"),
        (status = 401, description = "未认证", body = ApiError),
        (status = 403, description = "需要管理员权限", body = ApiError)
    )
)]
pub async fn list_configs(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_notification_configs().await {
        Ok(configs) => (
            StatusCode::OK,
            Json(serde_json::json!({ "configs": configs })),
        )
            .into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// 创建通知渠道配置。
#[utoipa::path(
    post,
    path = "/v1/admin/notifications/configs",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    request_body = CreateConfigRequest,
    responses(
        (status = 201, description = "已创建"),
        (status = 400, description = "请求参数错误", body = ApiError),
        (status = 401, description = "未认证", body = ApiError)
    )
)]
pub async fn create_config(
    State(state): State<AppState>,
    Json(body): Json<CreateConfigRequest>,
) -> impl IntoResponse {
    if body.platform.is_empty() || body.endpoint.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "platform and endpoint are required");
    }
    match state
        .store
        .insert_notification_config(
            &body.platform,
            &body.endpoint,
            body.secret.as_deref(),
            body.active,
        )
        .await
    {
        Ok(config) => (StatusCode::CREATED, Json(config)).into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// 更新通知渠道配置。
#[utoipa::path(
    put,
    path = "/v1/admin/notifications/configs/{id}",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "配置 ID")),
    responses(
        (status = 200, description = "已更新"),
        (status = 404, description = "配置不存在", body = ApiError)
    )
)]
pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<NotificationConfigUpdate>,
) -> impl IntoResponse {
    match state.store.update_notification_config(&id, &update).await {
        Ok(Some(config)) => (StatusCode::OK, Json(config)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "notification config not found"),
        Err(e) => storage_error_response(e),
    }
}

/// 删除通知渠道配置。
#[utoipa::path(
    delete,
    path = "/v1/admin/notifications/configs/{id}",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "配置 ID")),
    responses(
        (status = 200, description = "已删除"),
        (status = 404, description = "配置不存在", body = ApiError)
    )
)]
pub async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_notification_config(&id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "config deleted"})),
        )
            .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "notification config not found"),
        Err(e) => storage_error_response(e),
    }
}

// ---- message templates ----

#[derive(Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub event_name: String,
    #[serde(default)]
    pub title_template: String,
    #[serde(default)]
    pub body_template: String,
    #[serde(default)]
    pub text_template: String,
}

/// 列出消息模板。
#[utoipa::path(
    get,
    path = "/v1/admin/notifications/templates",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "消息模板列表"),
        (status = 401, description = "未认证", body = ApiError)
    )
)]
pub async fn list_templates(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_message_templates().await {
        Ok(templates) => (
            StatusCode::OK,
            Json(serde_json::json!({ "templates": templates })),
        )
            .into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// 创建消息模板。每个事件只允许一个模板。
#[utoipa::path(
    post,
    path = "/v1/admin/notifications/templates",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "已创建"),
        (status = 400, description = "请求参数错误", body = ApiError),
        (status = 409, description = "该事件已有模板", body = ApiError)
    )
)]
pub async fn create_template(
    State(state): State<AppState>,
    Json(body): Json<CreateTemplateRequest>,
) -> impl IntoResponse {
    if body.event_name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "event_name is required");
    }
    match state
        .store
        .insert_message_template(
            &body.event_name,
            &body.title_template,
            &body.body_template,
            &body.text_template,
        )
        .await
    {
        Ok(template) => (StatusCode::CREATED, Json(template)).into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// 更新消息模板。
#[utoipa::path(
    put,
    path = "/v1/admin/notifications/templates/{id}",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "模板 ID")),
    responses(
        (status = 200, description = "已更新"),
        (status = 404, description = "模板不存在", body = ApiError)
    )
)]
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<MessageTemplateUpdate>,
) -> impl IntoResponse {
    match state.store.update_message_template(&id, &update).await {
        Ok(Some(template)) => (StatusCode::OK, Json(template)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "message template not found"),
        Err(e) => storage_error_response(e),
    }
}

/// 删除消息模板。
#[utoipa::path(
    delete,
    path = "/v1/admin/notifications/templates/{id}",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "模板 ID")),
    responses(
        (status = 200, description = "已删除"),
        (status = 404, description = "模板不存在", body = ApiError)
    )
)]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_message_template(&id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "template deleted"})),
        )
            .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "message template not found"),
        Err(e) => storage_error_response(e),
    }
}

// ---- telegram configs ----

#[derive(Deserialize, ToSchema)]
pub struct CreateTelegramRequest {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// 列出 Telegram 通知配置。
#[utoipa::path(
    get,
    path = "/v1/admin/notifications/telegram",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Telegram 配置列表"),
        (status = 401, description = "未认证", body = ApiError)
    )
)]
pub async fn list_telegram_configs(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_telegram_configs().await {
        Ok(configs) => (
            StatusCode::OK,
            Json(serde_json::json!({ "configs": configs })),
        )
            .into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// 创建 Telegram 通知配置。
#[utoipa::path(
    post,
    path = "/v1/admin/notifications/telegram",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    request_body = CreateTelegramRequest,
    responses(
        (status = 201, description = "已创建"),
        (status = 400, description = "请求参数错误", body = ApiError)
    )
)]
pub async fn create_telegram_config(
    State(state): State<AppState>,
    Json(body): Json<CreateTelegramRequest>,
) -> impl IntoResponse {
    if body.bot_token.is_empty() || body.chat_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "bot_token and chat_id are required");
    }
    match state
        .store
        .insert_telegram_config(&body.bot_token, &body.chat_id, body.active)
        .await
    {
        Ok(config) => (StatusCode::CREATED, Json(config)).into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// 更新 Telegram 通知配置。
#[utoipa::path(
    put,
    path = "/v1/admin/notifications/telegram/{id}",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "配置 ID")),
    responses(
        (status = 200, description = "已更新"),
        (status = 404, description = "配置不存在", body = ApiError)
    )
)]
pub async fn update_telegram_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<TelegramConfigUpdate>,
) -> impl IntoResponse {
    match state.store.update_telegram_config(&id, &update).await {
        Ok(Some(config)) => (StatusCode::OK, Json(config)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "telegram config not found"),
        Err(e) => storage_error_response(e),
    }
}

/// 删除 Telegram 通知配置。
#[utoipa::path(
    delete,
    path = "/v1/admin/notifications/telegram/{id}",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "配置 ID")),
    responses(
        (status = 200, description = "已删除"),
        (status = 404, description = "配置不存在", body = ApiError)
    )
)]
pub async fn delete_telegram_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_telegram_config(&id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "telegram config deleted"})),
        )
            .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "telegram config not found"),
        Err(e) => storage_error_response(e),
    }
}

/// 发送固定测试消息验证 Telegram 配置。
#[utoipa::path(
    post,
    path = "/v1/admin/notifications/telegram/{id}/test",
    tag = "Notifications",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "配置 ID")),
    responses(
        (status = 200, description = "测试消息已发送"),
        (status = 404, description = "配置不存在", body = ApiError),
        (status = 502, description = "Telegram 接口调用失败", body = ApiError)
    )
)]
pub async fn test_telegram_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let config = match state.store.get_telegram_config_by_id(&id).await {
        Ok(Some(config)) => config,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "telegram config not found"),
        Err(e) => return storage_error_response(e),
    };

    match state
        .notifier
        .send_telegram_test(&config.bot_token, &config.chat_id)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "test message sent"})),
        )
            .into_response(),
        Err(e) => error_response_with_details(
            StatusCode::BAD_GATEWAY,
            "failed to send test message",
            &e.to_string(),
        ),
    }
}
