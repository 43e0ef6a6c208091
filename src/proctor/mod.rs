//! HTTP surface: router construction and serving.

use anyhow::{Context, Result};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, patch, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use url::Url;

use crate::auth::service::AuthService;

pub mod handlers;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Deployment knobs for the `token` cookie.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub domain: Option<String>,
}

impl CookieSettings {
    /// Scope the cookie to the frontend host only when running behind HTTPS;
    /// local development keeps host-only cookies.
    #[must_use]
    pub fn from_origin(frontend_origin: &str, secure: bool) -> Self {
        let domain = if secure {
            Url::parse(frontend_origin)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
        } else {
            None
        };

        Self { secure, domain }
    }
}

/// Build the application router with all routes and layers attached.
pub fn router(
    service: Arc<AuthService>,
    cookies: Arc<CookieSettings>,
    frontend_origin: &str,
) -> Result<Router> {
    let origin = frontend_origin
        .parse::<HeaderValue>()
        .context("invalid frontend origin")?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/pending", get(handlers::auth::pending))
        .route("/auth/approve/:id", patch(handlers::auth::approve))
        .route("/auth/reject/:id", patch(handlers::auth::reject))
        .route("/auth/check-approval", get(handlers::auth::check_approval))
        .route("/auth/refresh-token", post(handlers::auth::refresh_token))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/user/create", post(handlers::register::register))
        .route("/user/all", get(handlers::users::list))
        .layer(Extension(service))
        .layer(Extension(cookies))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

/// Bind and serve until shutdown.
pub async fn new(
    port: u16,
    service: Arc<AuthService>,
    cookies: CookieSettings,
    frontend_origin: &str,
) -> Result<()> {
    let app = router(service, Arc::new(cookies), frontend_origin)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_settings_scope_domain_only_when_secure() {
        let secure = CookieSettings::from_origin("https://exam.example.com", true);
        assert!(secure.secure);
        assert_eq!(secure.domain.as_deref(), Some("exam.example.com"));

        let local = CookieSettings::from_origin("http://localhost:3000", false);
        assert!(!local.secure);
        assert_eq!(local.domain, None);
    }
}
