// src/db/user_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{unique_violation, PartialUpdate},
        error::AppError,
    },
    models::auth::{UpdateUserPayload, User, UserRole},
};

const USER_COLUMNS: &str =
    "id, email, username, name, role, password_hash, created_at, updated_at";

// Violação de UNIQUE em email ou username vira AlreadyExists
fn map_user_write_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e) {
        Some(constraint) => {
            tracing::warn!("Violação de unicidade em users ({})", constraint);
            AppError::UserAlreadyExists
        }
        None => e.into(),
    }
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu username (login)
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // Cria um novo usuário. A constraint UNIQUE garante que nada é gravado
    // quando email ou username já existem.
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        name: &str,
        role: UserRole,
        password_hash: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, name, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(username)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_write_error)
    }

    /// UPDATE parcial: só email, username, name e role podem ser alterados aqui.
    pub async fn update_user(&self, id: Uuid, input: UpdateUserPayload) -> Result<User, AppError> {
        let mut update = PartialUpdate::new("users");
        update
            .set_non_empty("email", input.email)
            .set_non_empty("username", input.username)
            .set_non_empty("name", input.name)
            .set("role", input.role);

        tracing::debug!("UPDATE users {} com {} campo(s)", id, update.field_count());
        let mut query = update.finish()?;
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(USER_COLUMNS);

        query
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_write_error)?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}
