#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, Days, Local, TimeZone, Utc};
use library_lending::domain::entities::Caller;
use library_lending::infrastructure::memory::MemoryStore;
use library_lending::routes::api_router;
use library_lending::state::{AppState, Repositories};
use mockable::Clock;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const PASSWORD_PEPPER: &str = "test-password-pepper";
pub const PASSWORD: &str = "correct horse battery";

/// Clock that tests move forward by hand.
pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    pub fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    pub fn advance_days(&self, days: u64) {
        let mut now = self.0.lock().unwrap();
        *now = now.checked_add_days(Days::new(days)).unwrap();
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub clock: Arc<TestClock>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(false)
}

/// In-memory app whose clock starts at 2024-05-01 09:00 UTC.
pub fn spawn_app_with(strict_borrow_limit: bool) -> TestApp {
    let clock = TestClock::starting_at(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
    let state = AppState::new(
        Repositories::memory(MemoryStore::new()),
        SIGNING_SECRET.to_string(),
        PASSWORD_PEPPER.to_string(),
        strict_borrow_limit,
        clock.clone(),
    );
    let server = TestServer::new(api_router(state.clone())).unwrap();

    TestApp {
        server,
        state,
        clock,
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Registers `username` over HTTP and logs in. Returns `(user_id, token)`.
pub async fn register_and_login(app: &TestApp, username: &str) -> (i64, String) {
    app.server
        .post("/api/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    login(app, username).await
}

pub async fn login(app: &TestApp, username: &str) -> (i64, String) {
    let body: Value = app
        .server
        .post("/api/login")
        .json(&json!({ "username": username, "password": PASSWORD }))
        .await
        .json();

    (
        body["user_id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Creates an administrator directly through the service and logs in.
pub async fn admin_login(app: &TestApp) -> (i64, String) {
    app.state
        .user_service
        .create_account("librarian", "librarian@example.com", PASSWORD, true)
        .await
        .unwrap();

    login(app, "librarian").await
}

/// Creates an author, a category and a book with `total` copies.
/// Returns the book id.
pub async fn seed_book(app: &TestApp, admin_token: &str, total: i32) -> i64 {
    let author: Value = app
        .server
        .post("/api/authors")
        .add_header("Authorization", bearer(admin_token))
        .json(&json!({ "name": "Ursula K. Le Guin" }))
        .await
        .json();

    let category: Value = app
        .server
        .post("/api/categories")
        .add_header("Authorization", bearer(admin_token))
        .json(&json!({ "name": "Fantasy" }))
        .await
        .json();

    let book: Value = app
        .server
        .post("/api/books")
        .add_header("Authorization", bearer(admin_token))
        .json(&json!({
            "title": "A Wizard of Earthsea",
            "author_id": author["id"],
            "category_id": category["id"],
            "total_copies": total,
        }))
        .await
        .json();

    book["id"].as_i64().unwrap()
}

/// Reads `(total_copies, available_copies)` through the catalog service.
pub async fn stock_of(app: &TestApp, book_id: i64) -> (i32, i32) {
    let book = app
        .state
        .catalog_service
        .get_book(&Caller::admin(0), book_id)
        .await
        .unwrap();
    (book.total_copies, book.available_copies)
}
