// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room detection endpoint.

use crate::error::ApiError;
use crate::services::{download_image, run_detection};
use crate::types::{DetectRoomsRequest, DetectRoomsResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Duration;

/// POST /detect-rooms - Download a blueprint and detect its rooms.
pub async fn detect_rooms(
    State(state): State<AppState>,
    payload: Result<Json<DetectRoomsRequest>, JsonRejection>,
) -> Result<Json<DetectRoomsResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e.body_text())))?;

    let url = request
        .url()
        .ok_or_else(|| ApiError::Validation("blueprintUrl is required".into()))?;

    let config = request.options.apply(state.config.pipeline_defaults());
    config
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    tracing::info!(url, ocr = config.ocr_enabled, "Processing blueprint");

    let image_bytes = download_image(
        &state.http,
        url,
        Duration::from_secs(state.config.download_timeout_secs),
        state.config.max_image_bytes(),
    )
    .await?;

    let recognizer = state.recognizer.clone().filter(|_| config.ocr_enabled);
    let output = run_detection(image_bytes, config, recognizer).await?;

    tracing::info!(
        rooms = output.rooms.len(),
        time_ms = output.stats.total_time_ms,
        "Detected rooms"
    );

    Ok(Json(DetectRoomsResponse::from(output)))
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::routes::router;
    use crate::AppState;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        routing::get,
        Router,
    };
    use image::{GrayImage, ImageFormat, Luma};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = Config {
            ocr_enabled: false,
            ..Config::default()
        };
        router(AppState::new(config).unwrap())
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::post("/detect-rooms")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Four-room plan on a 600x600 page, encoded as PNG
    fn plan_png() -> Vec<u8> {
        let mut img = GrayImage::from_pixel(600, 600, Luma([255]));
        let walls = [
            (100, 100, 504, 104),
            (100, 300, 504, 304),
            (100, 500, 504, 504),
            (100, 100, 104, 504),
            (300, 100, 304, 504),
            (500, 100, 504, 504),
        ];
        for (x0, y0, x1, y1) in walls {
            for y in y0..y1 {
                for x in x0..x1 {
                    img.put_pixel(x, y, Luma([0]));
                }
            }
        }
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png).unwrap();
        png.into_inner()
    }

    /// Serve a plan image from a local server and return its base URL
    async fn serve_plan() -> String {
        let png = plan_png();
        let app = Router::new().route(
            "/plan.png",
            get(move || async move { ([(header::CONTENT_TYPE, "image/png")], png) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = call(test_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "healthy", "service": "blueprint-vision"}));
    }

    #[tokio::test]
    async fn test_info_lists_endpoints() {
        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, body) = call(test_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_url_is_bad_request() {
        let (status, body) = call(test_app(), post_json(json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "blueprintUrl is required"}));
    }

    #[tokio::test]
    async fn test_blank_url_is_bad_request() {
        let (status, body) = call(test_app(), post_json(json!({"blueprintUrl": ""}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "blueprintUrl is required");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let request = Request::post("/detect-rooms")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = call(test_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let padding = "x".repeat(128 * 1024);
        let request = post_json(json!({"blueprintUrl": "http://127.0.0.1:9/plan.png", "pad": padding}));
        let (status, body) = call(test_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_cors_headers_on_responses() {
        let request = Request::get("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_invalid_options_are_bad_request() {
        let request = post_json(json!({
            "blueprintUrl": "http://127.0.0.1:9/plan.png",
            "options": {"merge_threshold": 1.5}
        }));
        let (status, _) = call(test_app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_failure_is_server_error() {
        let base = serve_plan().await;
        let request = post_json(json!({"blueprintUrl": format!("{}/missing.png", base)}));
        let (status, body) = call(test_app(), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to detect rooms from blueprint");
        assert!(body["error"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_detects_rooms() {
        let base = serve_plan().await;
        let request = post_json(json!({"blueprintUrl": format!("{}/plan.png", base)}));
        let (status, body) = call(test_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 4);
        let rooms = body["rooms"].as_array().unwrap();
        assert_eq!(rooms.len(), 4);
        assert_eq!(rooms[0]["id"], "room_001");
        assert_eq!(rooms[0]["bounding_box"].as_array().unwrap().len(), 4);
        assert_eq!(body["stats"]["image_width"], 600);
    }

    #[tokio::test]
    async fn test_max_rooms_option() {
        let base = serve_plan().await;
        let request = post_json(json!({
            "blueprintUrl": format!("{}/plan.png", base),
            "options": {"max_rooms": 2}
        }));
        let (status, body) = call(test_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
    }
}
