//! JSON request body extraction with structured rejections.

use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use fulfillment_core::error::DomainError;

use crate::error::ApiError;

/// Drop-in for `axum::Json` on request bodies. A body that is missing, not
/// JSON, or does not match `T` is answered with 400 `validation_error`
/// instead of axum's plain-text rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Domain(DomainError::Validation(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use serde::Deserialize;
    use serde_json::Value;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Item {
        product_id: uuid::Uuid,
    }

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Item, ApiError> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(value) = content_type {
            builder = builder.header("content-type", value);
        }
        let request = builder.body(Body::from(body)).unwrap();
        ApiJson::<Item>::from_request(request, &())
            .await
            .map(|ApiJson(item)| item)
    }

    async fn rejection_json(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_valid_body_is_extracted() {
        let item = extract(
            Some("application/json"),
            r#"{"product_id":"6f1c1e4e-8b5a-4c5e-9a57-0f4f9a6d2b11"}"#,
        )
        .await
        .unwrap();

        assert_eq!(
            item.product_id.to_string(),
            "6f1c1e4e-8b5a-4c5e-9a57-0f4f9a6d2b11"
        );
    }

    #[tokio::test]
    async fn test_unparsable_field_is_a_validation_error() {
        let err = extract(Some("application/json"), r#"{"product_id":"nope"}"#)
            .await
            .unwrap_err();

        let (status, json) = rejection_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert!(json["message"].as_str().unwrap().contains("product_id"));
    }

    #[tokio::test]
    async fn test_syntax_error_is_a_validation_error() {
        let err = extract(Some("application/json"), "{").await.unwrap_err();

        let (status, json) = rejection_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_a_validation_error() {
        let err = extract(None, "{}").await.unwrap_err();

        let (status, json) = rejection_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }
}
