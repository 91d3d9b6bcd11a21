// src/handlers/auth.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, rbac::AdminOnly},
    models::auth::{
        CreateUserPayload, LoginPayload, LoginResponse, UpdatePasswordPayload, UpdateUserPayload,
        User, UsersResponse,
    },
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login efetuado", body = LoginResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 401, description = "Usuário ou senha inválidos")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginPayload>, AppError>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    let (user, token) = app_state.auth_service
        .login_user(payload.username.trim(), &payload.password)
        .await?;

    Ok(Json(LoginResponse { user, token }))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário autenticado", body = User),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    let user = app_state.auth_service.current_user(claims.sub).await?;
    Ok(Json(user))
}

// =============================================================================
//  USUÁRIOS
// =============================================================================

// GET /api/auth/users
#[utoipa::path(
    get,
    path = "/api/auth/users",
    tag = "Users",
    responses(
        (status = 200, description = "Lista de usuários ordenada por nome", body = UsersResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
) -> Result<Json<UsersResponse>, AppError> {
    let users = app_state.auth_service.list_users().await?;
    Ok(Json(UsersResponse { users }))
}

// POST /api/auth/users
#[utoipa::path(
    post,
    path = "/api/auth/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas administradores"),
        (status = 409, description = "Email ou username já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _admin: AdminOnly,
    WithRejection(Json(payload), _): WithRejection<Json<CreateUserPayload>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let user = app_state.auth_service.create_user(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

// PUT /api/auth/users/{id}
#[utoipa::path(
    put,
    path = "/api/auth/users/{id}",
    tag = "Users",
    request_body = UpdateUserPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 400, description = "Nenhum campo para atualizar ou dados inválidos"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Email ou username já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    _admin: AdminOnly,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUserPayload>, AppError>,
) -> Result<Json<User>, AppError> {
    let payload = payload.normalized();
    if payload.is_empty() {
        return Err(AppError::NoFieldsToUpdate);
    }
    payload.validate()?;

    let user = app_state.auth_service.update_user(id, payload).await?;
    Ok(Json(user))
}

// PUT /api/auth/users/{id}/password
#[utoipa::path(
    put,
    path = "/api/auth/users/{id}/password",
    tag = "Users",
    request_body = UpdatePasswordPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Senha alterada"),
        (status = 400, description = "Senha muito curta"),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_password(
    State(app_state): State<AppState>,
    _admin: AdminOnly,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdatePasswordPayload>, AppError>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    app_state.auth_service.update_password(id, &payload.password).await?;
    Ok(StatusCode::NO_CONTENT)
}
