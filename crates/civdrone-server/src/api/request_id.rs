//! Per-request correlation ids for the civdrone API.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation id for one API call, stored in the request extensions.
///
/// Handlers that call the reasoning service run inside the request span, so
/// advisor fallbacks logged from core carry the same id as the access log.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Reuse the caller's `x-request-id` or mint one, and run the request inside
/// an `http` span carrying it. The id is echoed on the response.
pub async fn ensure_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "http",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path()
    );
    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn echo_router() -> Router {
        Router::new()
            .route(
                "/id",
                get(|Extension(id): Extension<RequestId>| async move { id.to_string() }),
            )
            .layer(middleware::from_fn(ensure_request_id))
    }

    #[tokio::test]
    async fn handlers_see_the_same_id_as_the_response_header() {
        let res = echo_router()
            .oneshot(HttpRequest::builder().uri("/id").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let header = res.headers()[&REQUEST_ID_HEADER].to_str().unwrap().to_string();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(header.as_bytes(), &body[..]);
        assert!(uuid::Uuid::parse_str(&header).is_ok());
    }

    #[tokio::test]
    async fn blank_incoming_id_is_replaced() {
        let res = echo_router()
            .oneshot(
                HttpRequest::builder()
                    .uri("/id")
                    .header("x-request-id", "   ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let header = res.headers()[&REQUEST_ID_HEADER].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(header).is_ok());
    }
}
