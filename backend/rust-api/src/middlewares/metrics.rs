use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency for every HTTP request.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Replaces dynamic path segments with `{id}` so label cardinality stays
/// bounded. Session ids are UUIDs; quiz and user ids are 24-hex ObjectIds.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_uuid_like(segment) || is_object_id_like(segment) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<&str>>()
        .join("/")
}

fn is_uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

fn is_object_id_like(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/api/v1/sessions/550e8400-e29b-41d4-a716-446655440000"),
            "/api/v1/sessions/{id}"
        );
        assert_eq!(
            normalize_path("/api/v1/quizzes/665f2f9e8b3e4c1d2a0f9b7c"),
            "/api/v1/quizzes/{id}"
        );
        assert_eq!(
            normalize_path("/api/v1/sessions/550e8400-e29b-41d4-a716-446655440000/answers"),
            "/api/v1/sessions/{id}/answers"
        );
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_is_object_id_like() {
        assert!(is_object_id_like("665f2f9e8b3e4c1d2a0f9b7c"));
        assert!(!is_object_id_like("not-an-id"));
        assert!(!is_object_id_like("665f2f9e"));
    }
}
