//! Request extractors with JSON error bodies.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

/// `Json` extractor whose rejection uses the API error body instead of
/// axum's plain-text one.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(BodyRejection))]
pub struct ApiJson<T>(pub T);

/// A request body that could not be read as the expected JSON.
#[derive(Debug)]
pub struct BodyRejection(JsonRejection);

impl From<JsonRejection> for BodyRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejection)
    }
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        let message = match &self.0 {
            JsonRejection::MissingJsonContentType(_) => {
                "Request body must be sent as application/json."
            }
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON.",
            JsonRejection::JsonDataError(_) => "Request body is missing or has invalid fields.",
            _ => "Request body could not be read.",
        };
        debug!(error = %self.0.body_text(), "Rejected request body");

        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_body",
                "message": message,
                "details": [self.0.body_text()],
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, routing::post, Router};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Named {
        name: String,
    }

    async fn echo(ApiJson(body): ApiJson<Named>) -> String {
        body.name
    }

    async fn call(content_type: Option<&str>, body: &'static str) -> (StatusCode, serde_json::Value) {
        let mut request = Request::post("/");
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let resp = Router::new()
            .route("/", post(echo))
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let (status, _) = call(Some("application/json"), r#"{"name":"Ada"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejections_use_json_body() {
        let cases = [
            (Some("application/json"), "{not json", "Request body is not valid JSON."),
            (
                Some("application/json"),
                r#"{"other":1}"#,
                "Request body is missing or has invalid fields.",
            ),
            (
                None,
                r#"{"name":"Ada"}"#,
                "Request body must be sent as application/json.",
            ),
        ];

        for (content_type, body, message) in cases {
            let (status, json) = call(content_type, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "invalid_body");
            assert_eq!(json["message"], message);
            assert!(json["details"][0].is_string());
        }
    }
}
