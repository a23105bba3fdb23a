use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::{Service, ServiceExt};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get(uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

async fn call(app: &mut Router, request: Request<String>) -> axum::response::Response {
    ServiceExt::<Request<String>>::ready(app)
        .await
        .unwrap()
        .call(request)
        .await
        .unwrap()
}

/// Register and sign in a user, returning the session token.
async fn signed_in(app: &mut Router, username: &str) -> String {
    let email = format!("{username}@example.com");
    let signup = format!(r#"{{"username":"{username}","email":"{email}","password":"pw"}}"#);
    let resp = call(app, json_request("POST", "/api/auth/signup", None, &signup)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let signin = format!(r#"{{"email":"{email}","password":"pw"}}"#);
    let resp = call(app, json_request("POST", "/api/auth/signin", None, &signin)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["sessionToken"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn signup_returns_201_with_user() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            None,
            r#"{"username":"ada","email":"ada@example.com","password":"pw"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "ada");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn signup_duplicate_email_returns_409() {
    let mut app = app();
    signed_in(&mut app, "ada").await;

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            r#"{"username":"imposter","email":"ada@example.com","password":"x"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn signup_missing_fields_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/api/auth/signup", None, r#"{"email":"a@b.com"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn signin_wrong_password_returns_401() {
    let mut app = app();
    signed_in(&mut app, "ada").await;

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/api/auth/signin",
            None,
            r#"{"email":"ada@example.com","password":"wrong"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn verify_without_token_returns_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/auth/verify")
                .header(http::header::AUTHORIZATION, "")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn signout_invalidates_token() {
    let mut app = app();
    let token = signed_in(&mut app, "ada").await;

    let resp = call(&mut app, get("/api/auth/verify", &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "ada@example.com");

    let resp = call(&mut app, json_request("POST", "/api/auth/signout", Some(token.as_str()), "")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&mut app, get("/api/auth/verify", &token)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- scores ---

#[tokio::test]
async fn scores_keep_best_and_rank_descending() {
    let mut app = app();
    let ada = signed_in(&mut app, "ada").await;
    let bob = signed_in(&mut app, "bob").await;

    for (token, score) in [(&ada, 300), (&bob, 500), (&ada, 200)] {
        let body = format!(r#"{{"gameType":"snake","score":{score}}}"#);
        let resp = call(&mut app, json_request("POST", "/api/score/update", Some(token.as_str()), &body)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = call(&mut app, get("/api/leaderboard/snake", &ada)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let rows = body["leaderboard"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["username"], "bob");
    assert_eq!(rows[0]["rank"], 1);
    assert_eq!(rows[1]["username"], "ada");
    assert_eq!(rows[1]["score"], 300);

    let resp = call(&mut app, get("/api/score/rank/snake", &ada)).await;
    let body = body_json(resp).await;
    assert_eq!(body["rank"], 2);
    assert_eq!(body["score"], 300);
}

#[tokio::test]
async fn rank_without_score_returns_404() {
    let mut app = app();
    let token = signed_in(&mut app, "ada").await;

    let resp = call(&mut app, get("/api/score/rank/tetris", &token)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- checkpoints ---

#[tokio::test]
async fn checkpoint_lifecycle() {
    let mut app = app();
    let token = signed_in(&mut app, "ada").await;

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/api/checkpoint/save",
            Some(token.as_str()),
            r#"{"gameType":"snake","gameState":{"len":3},"checkpointName":"first"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first_id = body_json(resp).await["checkpointId"].as_str().unwrap().to_string();

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/api/checkpoint/save",
            Some(token.as_str()),
            r#"{"gameType":"snake","gameState":{"len":9}}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // load by id
    let resp = call(&mut app, get(&format!("/api/checkpoint/load/snake?checkpointId={first_id}"), &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["checkpoint"]["gameState"]["len"], 3);

    // load latest
    let resp = call(&mut app, get("/api/checkpoint/load/snake", &token)).await;
    let body = body_json(resp).await;
    assert_eq!(body["checkpoint"]["gameState"]["len"], 9);
    assert_eq!(body["checkpoint"]["checkpointName"], "Autosave");

    // list omits state
    let resp = call(&mut app, get("/api/checkpoint/list/snake", &token)).await;
    let body = body_json(resp).await;
    let list = body["checkpoints"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list[0].get("gameState").is_none());

    // delete
    let resp = call(
        &mut app,
        json_request("DELETE", &format!("/api/checkpoint/{first_id}"), Some(token.as_str()), ""),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(
        &mut app,
        json_request("DELETE", &format!("/api/checkpoint/{first_id}"), Some(token.as_str()), ""),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn saving_same_name_overwrites() {
    let mut app = app();
    let token = signed_in(&mut app, "ada").await;

    let mut ids = Vec::new();
    for len in [1, 2] {
        let body = format!(r#"{{"gameType":"snake","gameState":{{"len":{len}}},"checkpointName":"slot"}}"#);
        let resp = call(&mut app, json_request("POST", "/api/checkpoint/save", Some(token.as_str()), &body)).await;
        ids.push(body_json(resp).await["checkpointId"].as_str().unwrap().to_string());
    }
    assert_eq!(ids[0], ids[1]);

    let resp = call(&mut app, get("/api/checkpoint/list/snake", &token)).await;
    let body = body_json(resp).await;
    assert_eq!(body["checkpoints"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn checkpoints_are_private_to_owner() {
    let mut app = app();
    let ada = signed_in(&mut app, "ada").await;
    let bob = signed_in(&mut app, "bob").await;

    let resp = call(
        &mut app,
        json_request(
            "POST",
            "/api/checkpoint/save",
            Some(ada.as_str()),
            r#"{"gameType":"snake","gameState":{}}"#,
        ),
    )
    .await;
    let id = body_json(resp).await["checkpointId"].as_str().unwrap().to_string();

    let resp = call(&mut app, get(&format!("/api/checkpoint/load/snake?checkpointId={id}"), &bob)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = call(&mut app, json_request("DELETE", &format!("/api/checkpoint/{id}"), Some(bob.as_str()), "")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
