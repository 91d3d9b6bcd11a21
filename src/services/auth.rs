// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AdminBootstrap,
    db::UserRepository,
    models::auth::{Claims, CreateUserPayload, UpdateUserPayload, User, UserRole},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self { user_repo, jwt_secret, token_ttl, bcrypt_cost }
    }

    // =========================================================================
    //  LOGIN E TOKENS
    // =========================================================================

    pub async fn login_user(&self, username: &str, password: &str) -> Result<(User, String), AppError> {
        // Usuário inexistente e senha errada têm a mesma resposta
        let user = self.user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash).await? {
            tracing::info!("Tentativa de login com senha inválida para '{}'", username);
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        Ok((user, token))
    }

    /// Valida assinatura e expiração. Não consulta o banco.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }

    pub fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    // =========================================================================
    //  USUÁRIOS
    // =========================================================================

    pub async fn current_user(&self, id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_users().await
    }

    pub async fn create_user(&self, input: CreateUserPayload) -> Result<User, AppError> {
        let password_hash = self.hash_password(&input.password).await?;

        let user = self.user_repo
            .create_user(
                input.email.trim(),
                input.username.trim(),
                input.name.trim(),
                input.role,
                &password_hash,
            )
            .await?;

        tracing::info!("👤 Usuário '{}' criado ({:?})", user.username, user.role);
        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUserPayload) -> Result<User, AppError> {
        self.user_repo.update_user(id, input).await
    }

    pub async fn update_password(&self, id: Uuid, password: &str) -> Result<(), AppError> {
        let password_hash = self.hash_password(password).await?;
        self.user_repo.update_password(id, &password_hash).await
    }

    /// Cria o primeiro administrador quando a tabela de usuários está vazia.
    pub async fn ensure_bootstrap_admin(&self, admin: &AdminBootstrap) -> Result<(), AppError> {
        if self.user_repo.count_users().await? > 0 {
            return Ok(());
        }

        let password_hash = self.hash_password(&admin.password).await?;
        self.user_repo
            .create_user(&admin.email, &admin.username, &admin.name, UserRole::Admin, &password_hash)
            .await?;

        tracing::info!("🔑 Administrador inicial '{}' criado.", admin.username);
        Ok(())
    }

    // =========================================================================
    //  SENHAS (bcrypt em thread separada)
    // =========================================================================

    async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password_clone = password.to_owned();
        let password_hash_clone = password_hash.to_owned();

        // Executa a verificação em um thread separado
        let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
        Ok(is_valid)
    }
}
