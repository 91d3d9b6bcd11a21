//! Banco PostgreSQL real para os testes de repositório e serviço.
//!
//! Com `TEST_DATABASE_URL` definido, usa esse servidor. Sem ele, sobe um
//! cluster embutido (pg-embed-setup-unpriv) compartilhado pelo processo.
//! Cada contexto recebe um banco novo com as migrações aplicadas, então os
//! testes não enxergam dados uns dos outros.
//!
//! Se o cluster não puder ser criado (sem rede para baixar os binários, por
//! exemplo), o teste imprime `SKIP-TEST-CLUSTER` e retorna. Com
//! `REQUIRE_TEST_CLUSTER=1` a falha vira pânico, para o CI não mascarar.

use std::{str::FromStr, sync::Once};

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, Executor, PgConnection, PgPool,
};
use tokio::runtime::Runtime;
use uuid::Uuid;

use crate::config::{AppState, Config};

pub struct TestContext {
    pub runtime: Runtime,
    pub pool: PgPool,
    pub state: AppState,
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        database_max_connections: 5,
        bind_addr: "127.0.0.1:0".to_string(),
        jwt_secret: "db-test-secret".to_string(),
        jwt_ttl_hours: 1,
        bcrypt_cost: 4,
        cors_allowed_origin: None,
        admin: None,
    }
}

fn should_require_test_cluster() -> bool {
    std::env::var("REQUIRE_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_require_test_cluster() {
        panic!("Test cluster setup failed: {reason}. Unset REQUIRE_TEST_CLUSTER to skip.");
    }
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}

static STABLE_PASSWORD: Once = Once::new();

/// O diretório de dados do cluster sobrevive entre execuções; sem senha fixa
/// o `initdb` antigo não aceita a senha aleatória da execução seguinte.
fn ensure_stable_password() {
    STABLE_PASSWORD.call_once(|| {
        if std::env::var_os("PG_PASSWORD").is_none() {
            // SAFETY: roda uma única vez, antes de o cluster ler o ambiente.
            unsafe {
                std::env::set_var("PG_PASSWORD", "crm_embedded_test");
            }
        }
    });
}

fn server_url() -> Result<String, String> {
    if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
        return Ok(url);
    }
    ensure_stable_password();
    let cluster = pg_embedded_setup_unpriv::test_support::shared_cluster_handle()
        .map_err(|err| format!("embedded cluster: {err:?}"))?;
    Ok(cluster.connection().database_url("postgres"))
}

async fn fresh_database(server_url: &str) -> Result<PgPool, String> {
    let name = format!("crm_test_{}", Uuid::new_v4().simple());

    let mut admin = PgConnection::connect(server_url)
        .await
        .map_err(|err| format!("connect: {err}"))?;
    let create = format!(r#"CREATE DATABASE "{name}""#);
    admin
        .execute(create.as_str())
        .await
        .map_err(|err| format!("create database: {err}"))?;
    let _ = admin.close().await;

    let options = PgConnectOptions::from_str(server_url)
        .map_err(|err| format!("database url: {err}"))?
        .database(&name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|err| format!("connect to {name}: {err}"))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|err| format!("migrations: {err}"))?;

    Ok(pool)
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let url = server_url()?;
    let pool = runtime.block_on(fresh_database(&url))?;
    let state = AppState::from_pool(pool.clone(), &test_config());

    Ok(TestContext { runtime, pool, state })
}

/// Contexto com banco migrado, ou `None` quando o teste deve ser pulado.
pub fn test_context() -> Option<TestContext> {
    match setup_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}
