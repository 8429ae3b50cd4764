use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod api;
pub mod imaging;
pub mod startup_checks;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub text: TextConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    /// `"*"` allows any origin, method and header.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Applies to multipart uploads and JSON bodies alike.
    pub max_upload_bytes: usize,
    pub max_coordinate: u32,
    pub max_thickness: u32,
    pub max_font_scale: f32,
    pub max_text_length: usize,
    pub max_polygon_points: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 25 * 1024 * 1024,
            max_coordinate: 32768,
            max_thickness: 255,
            max_font_scale: 50.0,
            max_text_length: 1024,
            max_polygon_points: 4096,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextConfig {
    #[serde(default)]
    pub fonts: Vec<FontConfig>,
}

/// Maps a `font_face` number to an outline font file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FontConfig {
    pub face: u32,
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            app: AppConfig {
                name: "PixelPlus".to_string(),
                log_level: "info".to_string(),
            },
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            text: TextConfig::default(),
        }
    }
}

use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue, routing::post};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub fonts: Arc<imaging::FontBook>,
    pub config: Config,
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

pub async fn create_app(config: Config) -> Router {
    let fonts = imaging::FontBook::load(&config.text).await;
    if fonts.is_empty() {
        tracing::info!("No outline fonts configured, text uses the built-in bitmap font");
    } else {
        tracing::info!("Loaded {} outline font(s)", fonts.len());
    }

    create_app_with_fonts(config, fonts)
}

/// Build the router around an already loaded font book.
pub fn create_app_with_fonts(config: Config, fonts: imaging::FontBook) -> Router {
    let body_limit = config.limits.max_upload_bytes;
    let cors = cors_layer(&config.cors);

    let app_state = AppState {
        fonts: Arc::new(fonts),
        config,
    };

    Router::new()
        .route("/", axum::routing::get(api::welcome_handler))
        .route("/grayscale/", post(api::filters::grayscale_handler))
        .route("/grayscale", post(api::filters::grayscale_handler))
        .route("/rgb/", post(api::filters::rgb_handler))
        .route("/rgb", post(api::filters::rgb_handler))
        .route("/hsv/", post(api::filters::hsv_handler))
        .route("/hsv", post(api::filters::hsv_handler))
        .route("/drawing/line", post(api::drawing::line_handler))
        .route("/drawing/rectangle", post(api::drawing::rectangle_handler))
        .route("/drawing/circle", post(api::drawing::circle_handler))
        .route("/drawing/polygon", post(api::drawing::polygon_handler))
        .route("/drawing/text", post(api::drawing::text_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &axum::http::Request<_>| {
                            let method = request.method();
                            let uri = request.uri();
                            let matched_path = request
                                .extensions()
                                .get::<axum::extract::MatchedPath>()
                                .map(|matched_path| matched_path.as_str());

                            tracing::info_span!(
                                "http_request",
                                method = %method,
                                uri = %uri,
                                matched_path,
                            )
                        })
                        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                            let method = request.method();
                            let uri = request.uri();
                            let headers = request.headers();
                            let user_agent = headers
                                .get("user-agent")
                                .and_then(|h| h.to_str().ok())
                                .unwrap_or("-");
                            let origin = headers
                                .get("origin")
                                .and_then(|h| h.to_str().ok())
                                .unwrap_or("-");

                            tracing::info!(
                                target: "access_log",
                                method = %method,
                                path = %uri.path(),
                                query = ?uri.query(),
                                user_agent = %user_agent,
                                origin = %origin,
                                "request"
                            );
                        })
                        .on_response(
                            |response: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             _span: &tracing::Span| {
                                let status = response.status();
                                let size = response
                                    .headers()
                                    .get("content-length")
                                    .and_then(|h| h.to_str().ok())
                                    .unwrap_or("-");

                                tracing::info!(
                                    target: "access_log",
                                    status = %status,
                                    size = %size,
                                    latency_ms = %latency.as_millis(),
                                    "response"
                                );
                            },
                        ),
                )
                .layer(cors),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}
