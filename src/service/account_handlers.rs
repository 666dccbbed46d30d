use crate::mapper::ApiError;
use crate::service::dto::{
    AccountResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    ResetPasswordRequest, UpdateAccountRequest,
};
use crate::service::middleware::AuthenticatedAccount;
use crate::service::AppState;
use account_domain::Account;
use axum::extract::{FromRequest, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use tracing::debug;

/// JSON body extractor whose rejections use the API error shape
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account = state.account_service.register(request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            message: "Register successful!".to_string(),
            account,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let tokens = state.account_service.login(request.into()).await?;
    Ok(Json(tokens.into()))
}

pub async fn get_account(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Path(account_id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    debug!(caller = %caller.0, account_id = %account_id, "get account");
    let account = state.account_service.get_account(&account_id).await?;
    Ok(Json(account))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Path(account_id): Path<String>,
    AppJson(request): AppJson<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    debug!(caller = %caller.0, account_id = %account_id, "update account");
    let account = state
        .account_service
        .update_account(&account_id, request.into())
        .await?;

    Ok(Json(AccountResponse {
        message: "Update successful!".to_string(),
        account,
    }))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Path(account_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!(caller = %caller.0, account_id = %account_id, "delete account");
    state.account_service.delete_account(&account_id).await?;
    Ok(Json(MessageResponse::new("Delete successful!")))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    Path(account_id): Path<String>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!(caller = %caller.0, account_id = %account_id, "reset password");
    state
        .account_service
        .reset_password(&account_id, &request.password)
        .await?;
    Ok(Json(MessageResponse::new("Reset password successful!")))
}
