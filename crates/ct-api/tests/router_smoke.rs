use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

fn app(dir: &TempDir) -> Router {
    ct_api::create_router(ct_api::test_state(dir.path()))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn candidate(name: &str, email: &str, average: f64, college: &str, skills: &[&str]) -> Value {
    json!({
        "full_name": name,
        "email": email,
        "college": college,
        "degree": "Computer Science",
        "academic_average": average,
        "skills": skills,
        "work_experience": "-",
    })
}

#[tokio::test]
async fn livez_is_healthy() {
    let dir = TempDir::new().unwrap();
    let response = send(&app(&dir), get("/livez")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn create_list_and_fetch_candidates() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let created = send(
        &app,
        post_json(
            "/candidates/",
            candidate(
                "Carlos Ruiz",
                "carlos@example.com",
                9.5,
                "Harvard University",
                &["AWS"],
            ),
        ),
    )
    .await;
    assert_eq!(created.status(), StatusCode::OK);
    let created = json_body(created).await;
    assert_eq!(created["message"], "success");
    assert_eq!(created["id"], 0);
    assert_eq!(created["candidate"]["full_name"], "Carlos Ruiz");

    send(
        &app,
        post_json(
            "/candidates",
            candidate("Maria Perez", "maria@example.com", 6.3, "UNAM", &["Java"]),
        ),
    )
    .await;

    let listing = send(&app, get("/candidates/?college=harvard")).await;
    assert_eq!(listing.status(), StatusCode::OK);
    let listing = json_body(listing).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["page"], 1);
    assert_eq!(listing["per_page"], 10);
    assert_eq!(listing["total_pages"], 1);
    assert_eq!(listing["candidates"][0]["id"], 0);
    assert_eq!(listing["candidates"][0]["score"], 0.8);

    let unscored = json_body(send(&app, get("/candidates?with_score=false")).await).await;
    assert_eq!(unscored["total"], 2);
    assert!(unscored["candidates"][1].get("score").is_none());

    let fetched = send(&app, get("/candidates/1")).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched = json_body(fetched).await;
    assert_eq!(fetched["candidate"]["full_name"], "Maria Perez");
    assert_eq!(fetched["candidate"]["skills"], json!(["Java"]));

    let missing = send(&app, get("/candidates/2")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(missing).await["code"], "candidate_not_found");
}

#[tokio::test]
async fn rejects_invalid_candidates_and_queries() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let low_average = send(
        &app,
        post_json(
            "/candidates/",
            candidate("Ana", "ana@example.com", 2.0, "UBA", &[]),
        ),
    )
    .await;
    assert_eq!(low_average.status(), StatusCode::BAD_REQUEST);

    let bad_email = send(
        &app,
        post_json("/candidates/", candidate("Ana", "not-an-email", 8.0, "UBA", &[])),
    )
    .await;
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);

    for uri in [
        "/candidates/?page=0",
        "/candidates/?per_page=101",
        "/candidates/?min_score=1.5",
        "/candidates/?with_score=false&min_score=0.2",
    ] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }

    let listing = json_body(send(&app, get("/candidates/")).await).await;
    assert_eq!(listing["total"], 0);
    assert_eq!(listing["total_pages"], 0);
}

#[tokio::test]
async fn pages_past_the_end_are_empty() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let created = send(
        &app,
        post_json(
            "/candidates/",
            candidate("Luis", "luis@example.com", 5.0, "UNAM", &["SQL"]),
        ),
    )
    .await;
    assert_eq!(created.status(), StatusCode::OK);

    let response = send(&app, get("/candidates/?page=10001")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let listing = json_body(response).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["page"], 10001);
    assert_eq!(listing["total_pages"], 1);
    assert_eq!(listing["candidates"], json!([]));
}

#[tokio::test]
async fn blank_skill_is_rejected_and_padded_email_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let blank_skill = send(
        &app,
        post_json(
            "/candidates/",
            candidate("Ana", "ana@example.com", 8.0, "UBA", &["Rust", " "]),
        ),
    )
    .await;
    assert_eq!(blank_skill.status(), StatusCode::BAD_REQUEST);

    let padded = send(
        &app,
        post_json(
            "/candidates/",
            candidate("Ana", "  ana@example.com ", 8.0, "UBA", &["Rust"]),
        ),
    )
    .await;
    assert_eq!(padded.status(), StatusCode::OK);

    let fetched = json_body(send(&app, get("/candidates/0")).await).await;
    assert_eq!(fetched["candidate"]["email"], "ana@example.com");
}

#[tokio::test]
async fn report_is_served_as_pdf_attachment() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    send(
        &app,
        post_json(
            "/candidates/",
            candidate("Ana Gomez", "ana@example.com", 9.1, "MIT", &["Python"]),
        ),
    )
    .await;

    let response = send(&app, get("/reports/?k=5")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
    assert!(
        response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("report.pdf")
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(dir.path().join("reports").join("report.pdf").exists());
}

#[tokio::test]
async fn clear_empties_the_store() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    send(
        &app,
        post_json(
            "/candidates/",
            candidate("Ana", "ana@example.com", 8.0, "UBA", &[]),
        ),
    )
    .await;

    let cleared = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/candidates/")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);

    let listing = json_body(send(&app, get("/candidates/")).await).await;
    assert_eq!(listing["total"], 0);
}
