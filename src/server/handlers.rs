// HTTP request handlers
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::error::CardioidError;
use crate::generators::{Format, Generator};
use crate::orbit::generate;
use crate::server::state::AppState;

/// Failure modes of a request, mapped onto HTTP responses.
#[derive(Debug)]
pub enum Rejection {
    /// The path segment is not `<int>,<int>`.
    NotFound,
    /// Parameters parsed but are out of range; send the client to a default view.
    Redirect(String),
    /// Parameters out of range on a machine-readable route.
    Invalid(CardioidError),
    Internal(String),
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            Rejection::Redirect(to) => Redirect::to(&to).into_response(),
            Rejection::Invalid(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e.to_string()
                })),
            )
                .into_response(),
            Rejection::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": message
                })),
            )
                .into_response(),
        }
    }
}

/// Parse a `<mod>,<mult>` path segment. Only plain decimal digits are accepted.
pub fn parse_pair(segment: &str) -> Option<(u64, u64)> {
    let (modulus, multiplier) = segment.split_once(',')?;
    let number = |s: &str| {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u64>().ok()
    };
    Some((number(modulus)?, number(multiplier)?))
}

fn check_limits(state: &AppState, modulus: u64) -> Result<(), CardioidError> {
    state.config.limits.check(modulus)
}

/// Resolve the path segment, or redirect to `<prefix><default mod>,<default mult>`.
fn resolve(state: &AppState, segment: &str, prefix: &str) -> Result<(u64, u64), Rejection> {
    let (modulus, multiplier) = parse_pair(segment).ok_or(Rejection::NotFound)?;
    if let Err(e) = check_limits(state, modulus) {
        warn!("Rejected {}: {}", segment, e);
        let defaults = &state.config.defaults;
        return Err(Rejection::Redirect(format!(
            "{}{},{}",
            prefix, defaults.modulus, defaults.multiplier
        )));
    }
    Ok((modulus, multiplier))
}

/// Strong validator over everything that shapes the rendered bytes.
pub fn etag(state: &AppState, format: Format, modulus: u64, multiplier: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format.as_str().as_bytes());
    hasher.update(state.canvas.fingerprint().as_bytes());
    hasher.update(modulus.to_le_bytes());
    hasher.update(multiplier.to_le_bytes());
    format!("\"{:x}\"", hasher.finalize())
}

/// `If-None-Match` uses weak comparison: `W/` prefixes are ignored and `*` matches any tag.
pub fn if_none_match(header_value: &str, tag: &str) -> bool {
    header_value.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == tag
    })
}

/// Welcome text
pub async fn home() -> &'static str {
    "Welcome to the cardioid generator!"
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Cardioid server is running")
}

/// HTML page showing the rendered graph for `<mod>,<mult>`
pub async fn viewer(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Html<String>, Rejection> {
    let (modulus, multiplier) = resolve(&state, &segment, "/")?;
    Ok(Html(viewer_page(&state, modulus, multiplier)))
}

fn viewer_page(state: &AppState, modulus: u64, multiplier: u64) -> String {
    let prev = multiplier.saturating_sub(1);
    let next = multiplier.saturating_add(1);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Cardioid: x &rarr; {mult}x mod {modulus}</title>
</head>
<body>
  <h1>x &rarr; {mult}x mod {modulus}</h1>
  <img src="/graph/{modulus},{mult}" width="{width}" height="{height}" alt="Functional graph of multiplication by {mult} modulo {modulus}">
  <p>
    <a href="/{modulus},{prev}">&larr; {prev}</a> |
    <a href="/svg/{modulus},{mult}">SVG</a> |
    <a href="/api/{modulus},{mult}">JSON</a> |
    <a href="/{modulus},{next}">{next} &rarr;</a>
  </p>
</body>
</html>
"#,
        mult = multiplier,
        modulus = modulus,
        width = state.canvas.width,
        height = state.canvas.height,
        prev = prev,
        next = next,
    )
}

/// PNG rendering of `<mod>,<mult>`
pub async fn png_graph(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Rejection> {
    let (modulus, multiplier) = resolve(&state, &segment, "/graph/")?;
    render(state, Format::Png, modulus, multiplier, &headers).await
}

/// SVG rendering of `<mod>,<mult>`
pub async fn svg_graph(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Rejection> {
    let (modulus, multiplier) = resolve(&state, &segment, "/svg/")?;
    render(state, Format::Svg, modulus, multiplier, &headers).await
}

async fn render(
    state: AppState,
    format: Format,
    modulus: u64,
    multiplier: u64,
    headers: &HeaderMap,
) -> Result<Response, Rejection> {
    let tag = etag(&state, format, modulus, multiplier);
    let cached = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| if_none_match(v, &tag));
    if cached {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, tag)]).into_response());
    }

    let generator = format.generator(state.canvas.clone());
    let mime = generator.mime_type();

    // Rendering is CPU-bound; keep it off the async workers.
    let bytes = tokio::task::spawn_blocking(move || {
        let diagram = generate(modulus, multiplier)?;
        generator.generate(&diagram)
    })
    .await
    .map_err(|e| {
        error!("Render task failed: {:?}", e);
        Rejection::Internal(format!("Render task failed: {}", e))
    })?
    .map_err(|e| {
        error!("Failed to render {},{}: {}", modulus, multiplier, e);
        Rejection::Internal(e.to_string())
    })?;

    info!(
        "Rendered {} for mod={} mult={} ({} bytes)",
        format.as_str(),
        modulus,
        multiplier,
        bytes.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::ETAG, tag),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        bytes,
    )
        .into_response())
}

/// JSON document of the diagram for `<mod>,<mult>`
pub async fn diagram_json(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Response, Rejection> {
    let (modulus, multiplier) = parse_pair(&segment).ok_or(Rejection::NotFound)?;
    check_limits(&state, modulus).map_err(Rejection::Invalid)?;

    let diagram = generate(modulus, multiplier).map_err(Rejection::Invalid)?;
    Ok(Json(diagram).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardioidConfig;
    use axum::body::to_bytes;
    use axum::http::HeaderValue;

    fn state() -> AppState {
        let mut config = CardioidConfig::default();
        config.render.width = 120;
        config.render.height = 120;
        config.limits.max_modulus = 500;
        AppState::new(config).unwrap()
    }

    async fn body(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[test]
    fn parses_integer_pairs_only() {
        assert_eq!(parse_pair("9,2"), Some((9, 2)));
        assert_eq!(parse_pair("0,0"), Some((0, 0)));
        assert_eq!(parse_pair("9"), None);
        assert_eq!(parse_pair("9,-2"), None);
        assert_eq!(parse_pair("+9,2"), None);
        assert_eq!(parse_pair("9,2.5"), None);
        assert_eq!(parse_pair(",2"), None);
        assert_eq!(parse_pair("9,2,3"), None);
    }

    #[test]
    fn etag_depends_on_every_input() {
        let state = state();
        let base = etag(&state, Format::Png, 9, 2);
        assert_eq!(base, etag(&state, Format::Png, 9, 2));
        assert_ne!(base, etag(&state, Format::Svg, 9, 2));
        assert_ne!(base, etag(&state, Format::Png, 9, 3));
        assert_ne!(base, etag(&state, Format::Png, 10, 2));
    }

    #[test]
    fn if_none_match_accepts_weak_and_wildcard() {
        let tag = "\"abc\"";
        assert!(if_none_match("\"abc\"", tag));
        assert!(if_none_match("W/\"abc\"", tag));
        assert!(if_none_match("\"x\", W/\"abc\"", tag));
        assert!(if_none_match("*", tag));
        assert!(!if_none_match("\"abd\"", tag));
        assert!(!if_none_match("abc", tag));
    }

    #[tokio::test]
    async fn wildcard_if_none_match_returns_not_modified() {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("*"));

        let response = png_graph(State(state()), Path("9,2".to_string()), headers)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn png_route_serves_png() {
        let response = png_graph(State(state()), Path("9,2".to_string()), HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert!(response.headers().contains_key(header::ETAG));

        let bytes = body(response).await;
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn matching_etag_returns_not_modified() {
        let state = state();
        let mut headers = HeaderMap::new();
        let tag = etag(&state, Format::Svg, 7, 3);
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_str(&tag).unwrap());

        let response = svg_graph(State(state), Path("7,3".to_string()), headers)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn zero_modulus_redirects_to_default_view() {
        let rejection = png_graph(State(state()), Path("0,5".to_string()), HeaderMap::new())
            .await
            .unwrap_err();
        match rejection {
            Rejection::Redirect(to) => assert_eq!(to, "/graph/200,2"),
            other => panic!("unexpected rejection: {:?}", other),
        }
    }

    #[tokio::test]
    async fn oversized_modulus_redirects_viewer() {
        let response = viewer(State(state()), Path("501,2".to_string()))
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/200,2");
    }

    #[tokio::test]
    async fn malformed_segment_is_not_found() {
        let response = viewer(State(state()), Path("abc".to_string()))
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn viewer_embeds_graph_route() {
        let Html(page) = viewer(State(state()), Path("9,2".to_string())).await.unwrap();
        assert!(page.contains(r#"src="/graph/9,2""#));
        assert!(page.contains(r#"href="/9,1""#));
        assert!(page.contains(r#"href="/9,3""#));
    }

    #[tokio::test]
    async fn api_returns_diagram_json() {
        let response = diagram_json(State(state()), Path("7,3".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(value["graph"]["edges"].as_array().unwrap().len(), 6);
        assert_eq!(value["positions"].as_array().unwrap().len(), 7);
        assert_eq!(value["colors"]["fallback"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn api_rejects_zero_modulus() {
        let response = diagram_json(State(state()), Path("0,3".to_string()))
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
