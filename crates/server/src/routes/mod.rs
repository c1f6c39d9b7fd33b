//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness
//! GET  /health/ready                            - Readiness (database)
//!
//! # Auth (strict rate limit)
//! POST /api/auth/register                       - Create owner account
//! POST /api/auth/login                          - Start session
//! POST /api/auth/logout                         - End session
//! GET  /api/auth/me                             - Current owner and store
//!
//! # Public storefront
//! GET  /api/stores/{slug}                       - Store, appearance, active catalog
//! GET  /api/stores/{slug}/availability          - Open slots (?service_id=&date=)
//! POST /api/stores/{slug}/bookings              - Book a slot
//! POST /api/stores/{slug}/orders                - Place an order
//! GET  /api/appearance/{slug}                   - Appearance document
//!
//! # Owner store
//! POST /api/stores                              - Open the owner's store
//! GET  /api/stores/mine                         - Owner's store
//! PUT  /api/stores/mine                         - Partial update
//! GET  /api/stores/mine/special-days            - Schedule overrides
//! PUT  /api/stores/mine/special-days/{date}     - Set override
//! DELETE /api/stores/mine/special-days/{date}   - Remove override
//! PUT  /api/appearance                          - Replace appearance
//!
//! # Owner catalog
//! GET|POST /api/products, PUT|DELETE /api/products/{id}
//! GET|POST /api/services, PUT|DELETE /api/services/{id}
//!
//! # Bookings and orders (owner session, or ?token= for the customer)
//! GET  /api/bookings                            - List (?status=&date=)
//! GET  /api/bookings/{id}                       - Detail
//! PUT  /api/bookings/{id}/status                - Owner status change
//! POST /api/bookings/{id}/cancel                - Cancel
//! GET  /api/orders ... same shape as bookings
//!
//! # Chat
//! GET  /api/messages/unread                     - Owner's unread threads
//! GET  /api/messages/{kind}/{id}                - Thread (?after=&token=)
//! POST /api/messages/{kind}/{id}                - Post (?token=)
//! POST /api/messages/{kind}/{id}/read           - Mark read (?token=)
//!
//! # Insights
//! GET  /api/analytics                           - Dashboard numbers
//! POST /api/chatbot                             - Premium assistant
//! ```

pub mod analytics;
pub mod appearance;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod chatbot;
pub mod health;
pub mod messages;
pub mod orders;
pub mod stores;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the store routes router, public and owner.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(stores::create))
        .route("/mine", get(stores::show_mine).put(stores::update_mine))
        .route("/mine/special-days", get(stores::list_special_days))
        .route(
            "/mine/special-days/{date}",
            put(stores::put_special_day).delete(stores::delete_special_day),
        )
        .route("/{slug}", get(stores::show_public))
        .route("/{slug}/availability", get(stores::availability))
        .route("/{slug}/bookings", post(bookings::create))
        .route("/{slug}/orders", post(orders::create))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            put(catalog::update_product).delete(catalog::delete_product),
        )
        .route(
            "/services",
            get(catalog::list_services).post(catalog::create_service),
        )
        .route(
            "/services/{id}",
            put(catalog::update_service).delete(catalog::delete_service),
        )
}

/// Create the booking routes router.
pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(bookings::list))
        .route("/{id}", get(bookings::show))
        .route("/{id}/status", put(bookings::update_status))
        .route("/{id}/cancel", post(bookings::cancel))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the chat routes router.
pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/unread", get(messages::unread))
        .route("/{kind}/{id}", get(messages::list).post(messages::post))
        .route("/{kind}/{id}/read", post(messages::mark_read))
}

/// Every `/api` route except auth.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/stores", store_routes())
        .route("/appearance", put(appearance::update))
        .route("/appearance/{slug}", get(appearance::show))
        .merge(catalog_routes())
        .nest("/bookings", booking_routes())
        .nest("/orders", order_routes())
        .nest("/messages", message_routes())
        .route("/analytics", get(analytics::show))
        .route("/chatbot", post(chatbot::ask))
}

/// Create all routes, with rate limits applied per group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter()))
        .nest("/api", api_routes().layer(api_rate_limiter()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::{LogFormat, VitrinexConfig};
    use crate::state::AppState;

    /// App over a pool that never connects; only paths that fail before
    /// touching the database are exercised here.
    fn test_app() -> axum::Router {
        let config = VitrinexConfig {
            database_url: SecretString::from("postgres://localhost/vitrinex_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("k7#Qm2!vRz9$Lp4@Wx8&Ty1*Bn6^Hc3%"),
            frontend_origins: vec!["http://localhost:5173".to_string()],
            openai: None,
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Text,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/vitrinex_test")
            .unwrap();
        crate::app(AppState::new(config, pool).unwrap())
    }

    async fn send(method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7");
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_owned())
            }
            None => Body::empty(),
        };
        let response = test_app()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_has_request_id_and_headers() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["cache-control"], "no-store");
    }

    #[tokio::test]
    async fn test_me_requires_session() {
        let (status, body) = send(Method::GET, "/api/auth/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["errors"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_json_is_json_400() {
        let (status, body) = send(Method::POST, "/api/auth/login", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_routes_require_session() {
        for (method, uri) in [
            (Method::GET, "/api/stores/mine"),
            (Method::GET, "/api/products"),
            (Method::GET, "/api/bookings"),
            (Method::GET, "/api/analytics"),
            (Method::GET, "/api/messages/unread"),
        ] {
            let (status, _) = send(method, uri, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_record_access_needs_token_or_session() {
        let (status, _) = send(Method::GET, "/api/bookings/7", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(Method::POST, "/api/orders/7/cancel", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_path_and_query_are_400() {
        let (status, body) = send(Method::GET, "/api/bookings/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"].is_array());

        let (status, _) = send(Method::GET, "/api/orders/1?token=not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(Method::GET, "/api/messages/invoice/1?token=x", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_message_kind_is_400() {
        let token = "3f2b8c1e-9d4a-4c6b-8e7f-1a2b3c4d5e6f";
        let (status, body) = send(
            Method::GET,
            &format!("/api/messages/invoice/1?token={token}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0], "invalid message parent: invoice");
    }

    #[tokio::test]
    async fn test_booking_body_rejects_unknown_fields() {
        let (status, _) = send(
            Method::POST,
            "/api/stores/barberia-sol/bookings",
            Some(r#"{"service_id": 1, "date": "2026-11-02", "slot": "10:00",
                    "customer_name": "Ana", "customer_email": "ana@example.com",
                    "price": "0"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = send(Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
