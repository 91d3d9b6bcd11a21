// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Sales,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Sales => "sales",
        }
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    #[schema(example = "ana@empresa.com")]
    pub email: String,
    #[schema(example = "ana")]
    pub username: String,
    #[schema(example = "Ana Souza")]
    pub name: String,
    pub role: UserRole,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "admin")]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserPayload {
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "joao@empresa.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "joao")]
    pub username: String,
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "João Lima")]
    pub name: String,
    pub role: UserRole,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

impl CreateUserPayload {
    // Apara antes de validar: "   " não passa como username ou nome.
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            name: self.name.trim().to_string(),
            ..self
        }
    }
}

// Todos os campos são opcionais; strings vazias contam como ausentes.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub role: Option<UserRole>,
}

impl UpdateUserPayload {
    // O formulário manda "" nos campos que não foram tocados.
    pub fn normalized(self) -> Self {
        let keep = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            email: keep(self.email),
            username: keep(self.username),
            name: keep(self.name),
            role: self.role,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.name.is_none() && self.role.is_none()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePasswordPayload {
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // Subject (ID do usuário)
    pub username: String,
    pub role: UserRole,
    pub exp: usize,       // Expiration time (quando o token expira)
    pub iat: usize,       // Issued At (quando o token foi criado)
}
