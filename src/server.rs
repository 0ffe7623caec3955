use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{self, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::error;

use crate::api::ApiError;
use crate::catalog::Catalog;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(crate::api::health))
        .route("/categories", get(crate::api::list_categories))
        .route("/videos", get(crate::api::list_videos))
        .route("/videos/:id", get(crate::api::get_video));

    let mut router = api_routes.fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        // Unknown paths get the client's index.html so its own routes resolve.
        let index = PathBuf::from(appdir).join("index.html");
        router = router.fallback_service(ServeDir::new(appdir).fallback(ServeFile::new(index)));
    }

    wrap_router(router.with_state(state))
}

/// Shared middleware stack. The access log sits outside the panic handler
/// so requests that panic are still logged with their 500.
fn wrap_router(router: Router) -> Router {
    let router = router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Rewriting the path must happen before routing, so it wraps the whole
    // router instead of being one of its layers.
    Router::new()
        .fallback_service(router)
        .layer(axum::middleware::from_fn(crate::middleware::normalize_path))
}

async fn fallback_handler(req: Request) -> Response {
    // Handle OPTIONS requests for CORS preflight
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    ApiError::NotFound.into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    error!("Handler panicked: {}", message);
    ApiError::Internal.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::Value;
    use tower::ServiceExt;

    const CATEGORIES: &str = r#"{"categories": ["Action", "Drama", "Comedy"]}"#;
    const TITLES: &str = r#"{"titles": [
        {"id": "movie:1", "type": "movie", "title": "Alpha", "categories": ["Action"],
         "date": "2001-02-03", "rating": 7.5, "runtime": 101},
        {"id": "movie:2", "type": "movie", "title": "Bravo", "categories": ["Action", "Drama"]},
        {"id": "movie:3", "type": "movie", "title": "Charlie", "categories": ["Drama"]}
    ]}"#;

    fn app() -> Router {
        app_with_config(Config::default())
    }

    fn app_with_config(config: Config) -> Router {
        let catalog = Catalog::from_json(CATEGORIES, TITLES, false).unwrap();
        build_router(AppState::new(config, catalog))
    }

    async fn get_raw(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let (status, bytes) = get_raw(app(), uri).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn result_ids(body: &Value) -> Vec<String> {
        body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"ok": true, "service": "api"}));
    }

    #[tokio::test]
    async fn test_categories_in_load_order() {
        let (status, body) = get_json("/categories").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["Action", "Drama", "Comedy"]));
    }

    #[tokio::test]
    async fn test_videos_default_page() {
        let (status, body) = get_json("/videos").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 20);
        assert_eq!(body["totalPages"], 1);
        assert_eq!(result_ids(&body), ["movie:1", "movie:2", "movie:3"]);
    }

    #[tokio::test]
    async fn test_videos_filtered() {
        let (_, body) = get_json("/videos?category=Action&type=movie&q=BR").await;
        assert_eq!(result_ids(&body), ["movie:2"]);
        assert_eq!(body["total"], 1);

        let (_, body) = get_json("/videos?category=Comedy").await;
        assert_eq!(body["total"], 0);
        assert_eq!(body["totalPages"], 0);
        assert_eq!(body["results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_videos_encoded_category() {
        let (_, body) = get_json("/videos?category=Dr%61ma&q=").await;
        assert_eq!(result_ids(&body), ["movie:2", "movie:3"]);
    }

    #[tokio::test]
    async fn test_videos_normalizes_paging() {
        let (status, body) = get_json("/videos?page=0&limit=-5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 20);

        let (_, body) = get_json("/videos?limit=500&page=abc").await;
        assert_eq!(body["limit"], 100);
        assert_eq!(body["page"], 1);

        let (_, body) = get_json("/videos?limit=2&page=2").await;
        assert_eq!(result_ids(&body), ["movie:3"]);
        assert_eq!(body["totalPages"], 2);

        let (status, body) = get_json("/videos?limit=2&page=9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_videos_repeated_param_is_ignored() {
        let (_, body) = get_json("/videos?category=Action&category=Drama").await;
        assert_eq!(body["total"], 3);
    }

    #[tokio::test]
    async fn test_get_video() {
        let (status, body) = get_json("/videos/movie:1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Alpha");
        assert_eq!(body["type"], "movie");
        assert_eq!(body["runtime"], 101);
        assert_eq!(body["posterUrl"], Value::Null);

        let (status, body) = get_json("/videos/movie%3A2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "movie:2");
    }

    #[tokio::test]
    async fn test_get_video_not_found() {
        let (status, body) = get_json("/videos/movie:999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"error": "Not Found"}));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = get_json("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_path_normalization() {
        let (status, body) = get_json("/videos/?limit=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["limit"], 1);
        assert_eq!(result_ids(&body), ["movie:1"]);

        let (status, body) = get_json("/videos//movie:3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Charlie");
    }

    #[test]
    fn test_panic_response() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_panicking_handler_returns_server_error() {
        async fn explode() -> &'static str {
            panic!("handler exploded")
        }
        let app = wrap_router(Router::new().route("/explode", get(explode)));

        let (status, bytes) = get_raw(app, "/explode").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Server Error"}));
    }

    #[tokio::test]
    async fn test_capitalized_params_are_ignored() {
        let (_, body) = get_json("/videos?Category=Drama&Q=bra&Limit=1").await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["limit"], 20);
        assert_eq!(result_ids(&body), ["movie:1", "movie:2", "movie:3"]);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = axum::http::Request::builder()
            .method("OPTIONS")
            .uri("/videos?q=alpha")
            .header("Origin", "http://localhost:5173")
            .header("Access-Control-Request-Method", "GET")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        assert!(response
            .headers()
            .contains_key("access-control-allow-methods"));
    }

    #[tokio::test]
    async fn test_bare_options_request() {
        let request = axum::http::Request::builder()
            .method("OPTIONS")
            .uri("/anything")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serves_client_from_appdir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>movie browser</html>").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "console.log(1);").unwrap();

        let config = Config {
            appdir: Some(dir.path().to_string_lossy().to_string()),
            ..Config::default()
        };
        let app = app_with_config(config);

        let (status, bytes) = get_raw(app.clone(), "/assets/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"console.log(1);");

        for client_route in ["/", "/search", "/video/movie:1"] {
            let (status, bytes) = get_raw(app.clone(), client_route).await;
            assert_eq!(status, StatusCode::OK, "route {}", client_route);
            assert_eq!(bytes, b"<html>movie browser</html>", "route {}", client_route);
        }

        let (status, bytes) = get_raw(app, "/videos/movie:2").await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["title"], "Bravo");
    }
}
