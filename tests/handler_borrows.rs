mod common;

use axum::http::StatusCode;
use common::{TestApp, admin_login, bearer, register_and_login, seed_book, spawn_app, stock_of};
use serde_json::{Value, json};

async fn borrow(app: &TestApp, token: &str, book_id: impl serde::Serialize) -> axum_test::TestResponse {
    app.server
        .post("/api/borrow")
        .add_header("Authorization", bearer(token))
        .json(&json!({ "book_id": book_id }))
        .await
}

async fn return_borrow(app: &TestApp, token: &str, borrow_id: i64) -> axum_test::TestResponse {
    app.server
        .post("/api/return")
        .add_header("Authorization", bearer(token))
        .json(&json!({ "borrow_id": borrow_id }))
        .await
}

async fn penalty_points(app: &TestApp, token: &str, user_id: i64) -> i64 {
    let body: Value = app
        .server
        .get(&format!("/api/users/{user_id}/penalties"))
        .add_header("Authorization", bearer(token))
        .await
        .json();
    body["penalty_points"].as_i64().unwrap()
}

#[tokio::test]
async fn test_borrow_sets_due_date_and_takes_a_copy() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 2).await;
    let (user_id, token) = register_and_login(&app, "jane").await;

    let response = borrow(&app, &token, book_id).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["book_id"], book_id);
    assert_eq!(body["due_date"], "2024-05-15");
    assert_eq!(body["return_date"], Value::Null);
    assert_eq!(stock_of(&app, book_id).await, (2, 1));
}

#[tokio::test]
async fn test_book_id_as_numeric_string() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 1).await;
    let (_, token) = register_and_login(&app, "jane").await;

    borrow(&app, &token, book_id.to_string())
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_missing_or_malformed_book_id() {
    let app = spawn_app();
    let (_, token) = register_and_login(&app, "jane").await;

    let missing = app
        .server
        .post("/api/borrow")
        .add_header("Authorization", bearer(&token))
        .json(&json!({}))
        .await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = missing.json();
    assert_eq!(body["error"]["code"], "validation_error");

    borrow(&app, &token, "seven")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_borrow_unknown_book() {
    let app = spawn_app();
    let (_, token) = register_and_login(&app, "jane").await;

    borrow(&app, &token, 9999).await.assert_status_not_found();
}

#[tokio::test]
async fn test_no_copies_available() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 1).await;
    let (_, jane) = register_and_login(&app, "jane").await;
    let (_, john) = register_and_login(&app, "john").await;

    borrow(&app, &jane, book_id)
        .await
        .assert_status(StatusCode::CREATED);

    let response = borrow(&app, &john, book_id).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "no_copies_available");
    assert_eq!(stock_of(&app, book_id).await, (1, 0));
}

#[tokio::test]
async fn test_fourth_active_borrow_exceeds_limit() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 10).await;
    let (_, token) = register_and_login(&app, "jane").await;

    for _ in 0..3 {
        borrow(&app, &token, book_id)
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = borrow(&app, &token, book_id).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "borrow_limit_exceeded");
    assert_eq!(stock_of(&app, book_id).await, (10, 7));
}

#[tokio::test]
async fn test_returning_frees_a_slot() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 10).await;
    let (_, token) = register_and_login(&app, "jane").await;

    let mut first_id = 0;
    for i in 0..3 {
        let body: Value = borrow(&app, &token, book_id).await.json();
        if i == 0 {
            first_id = body["id"].as_i64().unwrap();
        }
    }

    return_borrow(&app, &token, first_id).await.assert_status_ok();
    borrow(&app, &token, book_id)
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_list_shows_only_own_active_borrows() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 5).await;
    let (_, jane) = register_and_login(&app, "jane").await;
    let (_, john) = register_and_login(&app, "john").await;

    let kept: Value = borrow(&app, &jane, book_id).await.json();
    let returned: Value = borrow(&app, &jane, book_id).await.json();
    borrow(&app, &john, book_id).await;
    return_borrow(&app, &jane, returned["id"].as_i64().unwrap())
        .await
        .assert_status_ok();

    let listed: Vec<Value> = app
        .server
        .get("/api/borrow")
        .add_header("Authorization", bearer(&jane))
        .await
        .json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], kept["id"]);
}

#[tokio::test]
async fn test_on_time_return() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 1).await;
    let (user_id, token) = register_and_login(&app, "jane").await;

    let borrowed: Value = borrow(&app, &token, book_id).await.json();
    app.clock.advance_days(14);

    let response = return_borrow(&app, &token, borrowed["id"].as_i64().unwrap()).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Book returned successfully");
    assert_eq!(body["return_date"], "2024-05-15");
    assert_eq!(body["days_late"], 0);
    assert_eq!(penalty_points(&app, &token, user_id).await, 0);
    assert_eq!(stock_of(&app, book_id).await, (1, 1));
}

#[tokio::test]
async fn test_late_return_adds_penalty_points() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 1).await;
    let (user_id, token) = register_and_login(&app, "jane").await;

    let borrowed: Value = borrow(&app, &token, book_id).await.json();
    app.clock.advance_days(19);

    let body: Value = return_borrow(&app, &token, borrowed["id"].as_i64().unwrap())
        .await
        .json();
    assert_eq!(body["days_late"], 5);
    assert_eq!(penalty_points(&app, &token, user_id).await, 5);
}

#[tokio::test]
async fn test_double_return_is_not_found_and_changes_nothing() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 1).await;
    let (user_id, token) = register_and_login(&app, "jane").await;

    let borrowed: Value = borrow(&app, &token, book_id).await.json();
    let borrow_id = borrowed["id"].as_i64().unwrap();
    app.clock.advance_days(16);

    return_borrow(&app, &token, borrow_id).await.assert_status_ok();
    return_borrow(&app, &token, borrow_id)
        .await
        .assert_status_not_found();

    assert_eq!(stock_of(&app, book_id).await, (1, 1));
    assert_eq!(penalty_points(&app, &token, user_id).await, 2);
}

#[tokio::test]
async fn test_cannot_return_someone_elses_borrow() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 1).await;
    let (_, jane) = register_and_login(&app, "jane").await;
    let (_, john) = register_and_login(&app, "john").await;

    let borrowed: Value = borrow(&app, &jane, book_id).await.json();

    return_borrow(&app, &john, borrowed["id"].as_i64().unwrap())
        .await
        .assert_status_not_found();
    assert_eq!(stock_of(&app, book_id).await, (1, 0));
}

#[tokio::test]
async fn test_return_with_string_borrow_id() {
    let app = spawn_app();
    let (_, admin) = admin_login(&app).await;
    let book_id = seed_book(&app, &admin, 1).await;
    let (_, token) = register_and_login(&app, "jane").await;

    let borrowed: Value = borrow(&app, &token, book_id).await.json();

    app.server
        .post("/api/return")
        .add_header("Authorization", bearer(&token))
        .json(&json!({ "borrow_id": borrowed["id"].as_i64().unwrap().to_string() }))
        .await
        .assert_status_ok();
}
