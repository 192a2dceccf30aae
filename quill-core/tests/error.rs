use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use quill_core::{ApiError, HttpError};

async fn error_parts(err: impl IntoResponse) -> (StatusCode, serde_json::Value) {
    let resp = err.into_response();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

#[tokio::test]
async fn http_error_not_found_status() {
    let (status, body) = error_parts(HttpError::NotFound("resource missing".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "resource missing");
}

#[tokio::test]
async fn http_error_bad_request_status() {
    let (status, body) = error_parts(HttpError::BadRequest("invalid input".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid input");
}

#[tokio::test]
async fn http_error_internal_status() {
    let (status, body) = error_parts(HttpError::Internal("server broke".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "server broke");
}

#[tokio::test]
async fn http_error_validation_uses_api_error_shape() {
    let (status, body) = error_parts(HttpError::validation("email", "Missing argument: email")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "value:invalid");
    assert_eq!(body["data"], "email");
    assert_eq!(body["message"], "Missing argument: email");
}

#[tokio::test]
async fn http_error_custom_status_and_body() {
    let (status, body) = error_parts(HttpError::Custom {
        status: StatusCode::CONFLICT,
        body: serde_json::json!({"reason": "taken"}),
    })
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["reason"], "taken");
}

#[tokio::test]
async fn api_error_statuses_follow_code() {
    let (status, body) = error_parts(ApiError::value_not_found("blog", "no such blog")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "value:notfound");
    assert_eq!(body["data"], "blog");

    let (status, body) = error_parts(ApiError::permission_forbidden("admin only")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"], "permission");

    let (status, body) =
        error_parts(HttpError::from(ApiError::new("register:failed", "email", "taken"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "register:failed");
    assert_eq!(body["message"], "taken");
}

#[test]
fn display_forms() {
    assert_eq!(
        HttpError::NotFound("x".into()).to_string(),
        "Not Found: x"
    );
    assert_eq!(
        ApiError::value_invalid("name", "empty").to_string(),
        "value:invalid (name): empty"
    );
}
