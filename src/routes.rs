// src/routes.rs

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{AppState, Config},
    docs::ApiDoc,
    handlers,
    middleware::auth::auth_guard,
};

pub fn build_router(app_state: AppState, config: &Config) -> anyhow::Result<Router> {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/health", get(handlers::reports::health));

    // Tudo abaixo exige Bearer token válido
    let protected_routes = Router::new()
        // --- Auth / Usuários ---
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/auth/users"
               ,get(handlers::auth::list_users)
               .post(handlers::auth::create_user)
        )
        .route("/auth/users/{id}", put(handlers::auth::update_user))
        .route("/auth/users/{id}/password", put(handlers::auth::update_password))
        // --- Clientes ---
        .route("/customers"
               ,post(handlers::crm::create_customer)
               .get(handlers::crm::list_customers)
        )
        .route("/customers/{id}"
               ,get(handlers::crm::get_customer)
               .put(handlers::crm::update_customer)
               .delete(handlers::crm::delete_customer)
        )
        // --- Históricos ---
        .route("/customers/{id}/contact-history", get(handlers::history::list_contacts))
        .route("/customers/{id}/purchase-history", get(handlers::history::list_purchases))
        .route("/customers/{id}/payment-history", get(handlers::history::list_payments))
        .route("/contact-history", post(handlers::history::create_contact))
        .route("/purchase-history", post(handlers::history::create_purchase))
        .route("/payment-history", post(handlers::history::create_payment))
        // --- Relatórios ---
        .route("/reports", get(handlers::reports::get_reports))
        .route("/export/customers", get(handlers::reports::export_customers))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.cors_allowed_origin.as_deref())?)
        .with_state(app_state);

    Ok(app)
}

fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let Some(origin) = allowed_origin else {
        return Ok(CorsLayer::permissive());
    };

    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("CORS_ALLOWED_ORIGIN inválido: '{}'", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

#[cfg(test)]
mod tests;
