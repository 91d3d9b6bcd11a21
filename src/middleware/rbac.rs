// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::UserRole,
};

/// 1. O Trait que define qual papel a rota exige
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> UserRole;
}

/// 2. O Extractor (Guardião). O papel vem do token, sem consulta ao banco.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        let required = T::role();
        if user.0.role != required {
            tracing::warn!("Usuário '{}' tentou acessar rota restrita", user.0.username);
            return Err(AppError::Forbidden(format!(
                "This action requires the '{}' role",
                required.as_str()
            )));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS
// ---

pub struct AdminRole;
impl RoleDef for AdminRole {
    fn role() -> UserRole { UserRole::Admin }
}

pub type AdminOnly = RequireRole<AdminRole>;
