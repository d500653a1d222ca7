use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tidysheet::http::create_router;
use tidysheet::{http::AppState, ServiceConfig};
use tower::ServiceExt;

const BOUNDARY: &str = "tidysheet-test-boundary";

const MESSY_CSV: &str = " name ,score\nAda,1\nAda ,1\n,\nGrace,2\n";

struct Part<'a> {
    name: &'a str,
    file_name: Option<&'a str>,
    data: &'a [u8],
}

fn file_part<'a>(file_name: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name: "file",
        file_name: Some(file_name),
        data,
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn clean_request(uri: &str, parts: &[Part<'_>], session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(session) = session {
        builder = builder.header("x-session-id", session);
    }
    builder
        .body(Body::from(multipart_body(parts)))
        .expect("request")
}

fn router() -> Router {
    create_router(AppState::new(ServiceConfig::default()))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

fn header_str<'a>(response: &'a axum::response::Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn cleans_a_csv_upload() {
    let request = clean_request(
        "/clean",
        &[file_part("scores.csv", MESSY_CSV.as_bytes())],
        None,
    );
    let response = router().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "content-type"), "text/csv; charset=utf-8");
    assert_eq!(
        header_str(&response, "content-disposition"),
        "attachment; filename=\"cleaned.csv\""
    );
    assert_eq!(header_str(&response, "x-row-count"), "2");
    assert_eq!(header_str(&response, "x-column-count"), "2");
    assert!(!header_str(&response, "x-request-id").is_empty());
    assert!(response.headers().get("x-usage-count").is_none());

    let body = String::from_utf8(body_bytes(response).await).expect("utf8");
    assert_eq!(body, "Name,Score\nAda,1\nGrace,2\n");
}

#[tokio::test]
async fn csv_upload_can_be_returned_as_xlsx() {
    let request = clean_request(
        "/clean?format=xlsx",
        &[file_part("scores.csv", MESSY_CSV.as_bytes())],
        None,
    );
    let response = router().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, "content-type"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        header_str(&response, "content-disposition"),
        "attachment; filename=\"cleaned.xlsx\""
    );
    assert!(body_bytes(response).await.starts_with(b"PK"));
}

#[tokio::test]
async fn unknown_output_format_is_a_bad_request() {
    let request = clean_request(
        "/clean?format=pdf",
        &[file_part("scores.csv", MESSY_CSV.as_bytes())],
        None,
    );
    let response = router().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let request = clean_request("/clean", &[file_part("report.pdf", b"%PDF-1.4")], None);
    let response = router().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNSUPPORTED_FORMAT");
    assert!(body["message"].as_str().unwrap_or_default().contains(".xlsx"));
}

#[tokio::test]
async fn malformed_workbook_is_a_decode_error() {
    let request = clean_request(
        "/clean",
        &[file_part("broken.xlsx", b"definitely not a zip archive")],
        None,
    );
    let response = router().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "DECODE_ERROR");
}

#[tokio::test]
async fn request_without_a_file_part_is_rejected() {
    let parts = [Part {
        name: "note",
        file_name: None,
        data: b"hello",
    }];
    let response = router()
        .oneshot(clean_request("/clean", &parts, None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(body["message"], "missing file part");
}

#[tokio::test]
async fn more_than_one_file_is_rejected() {
    let parts = [
        file_part("a.csv", b"x\n1\n"),
        file_part("b.csv", b"y\n2\n"),
    ];
    let response = router()
        .oneshot(clean_request("/clean", &parts, None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let config = ServiceConfig {
        max_upload_mb: 0.001,
        ..ServiceConfig::default()
    };
    let router = create_router(AppState::new(config));

    let mut csv = String::from("value\n");
    for i in 0..1000 {
        csv.push_str(&format!("{i}\n"));
    }
    let request = clean_request("/clean", &[file_part("big.csv", csv.as_bytes())], None);
    let response = router.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn health_and_home_respond() {
    let app = router();

    let health = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await["status"], "ok");

    let home = app
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(home.status(), StatusCode::OK);
    let body = body_json(home).await;
    assert_eq!(body["clean_endpoint"], "/clean");
    assert_eq!(
        body["supported_extensions"],
        serde_json::json!([".csv", ".xlsx", ".xls"])
    );
}

#[tokio::test]
async fn successful_runs_are_counted_per_session() {
    let config = ServiceConfig {
        free_limit_per_day: 2,
        payment_url: "https://pay.example/unlock".to_string(),
        ..ServiceConfig::default()
    };
    let app = create_router(AppState::new(config));

    for expected in ["1", "2"] {
        let request = clean_request(
            "/clean",
            &[file_part("scores.csv", MESSY_CSV.as_bytes())],
            Some("browser-1"),
        );
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, "x-usage-count"), expected);
    }

    // failures are not counted
    let rejected = clean_request("/clean", &[file_part("x.pdf", b"pdf")], Some("browser-1"));
    let response = app.clone().oneshot(rejected).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let usage = Request::get("/usage")
        .header("x-session-id", "browser-1")
        .body(Body::empty())
        .expect("request");
    let status = body_json(app.clone().oneshot(usage).await.expect("response")).await;
    assert_eq!(status["used"], 2);
    assert_eq!(status["remaining"], 0);
    assert_eq!(status["exhausted"], true);
    assert_eq!(status["unlock_url"], "https://pay.example/unlock");

    let anonymous = Request::get("/usage").body(Body::empty()).expect("request");
    let status = body_json(app.oneshot(anonymous).await.expect("response")).await;
    assert_eq!(status["used"], 0);
    assert_eq!(status["limit"], 2);
    assert!(status.get("unlock_url").is_none());
}
