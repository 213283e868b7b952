use std::collections::HashMap;

use chrono::{Duration as ChronoDuration, Utc};
use hcm_api::config::ApiConfig;
use hcm_auth::{Role, SessionClaims};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const ADMIN_EMAIL: &str = "root@example.com";
const ADMIN_PASSWORD: &str = "root-password";
const ADMIN_USERNAME: &str = "System_Administrator";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod, in-memory store), bound to an ephemeral port.
        let vars: HashMap<&str, &str> = HashMap::from([
            ("JWT_SECRET", jwt_secret),
            ("HCM_BOOTSTRAP_ADMIN_EMAIL", ADMIN_EMAIL),
            ("HCM_BOOTSTRAP_ADMIN_PASSWORD", ADMIN_PASSWORD),
        ]);
        let config = ApiConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("valid test config");

        let app = hcm_api::app::build_app(config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, username: &str, role: Role) -> String {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: username.to_string(),
        role,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn login(
    client: &reqwest::Client,
    srv: &TestServer,
    username: &str,
    password: &str,
) -> String {
    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK, "login failed for {username}");
    let body: Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

fn employee_body(first: &str, last: &str, department: &str, role: &str) -> Value {
    json!({
        "first_name": first,
        "last_name": last,
        "email": format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        "job_title": "Staff",
        "salary": 55000,
        "department": department,
        "role": role,
        "password": "secret",
    })
}

async fn create(client: &reqwest::Client, srv: &TestServer, token: &str, body: Value) -> Value {
    let res = client
        .post(srv.url("/employees"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap();
    if res.status() != StatusCode::CREATED {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        panic!("expected 201 Created, got {status} body={body}");
    }
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let forged = mint_jwt("some-other-secret", ADMIN_USERNAME, Role::HrAdmin);
    let res = client
        .get(srv.url("/employees"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_password_and_issues_session_otherwise() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": ADMIN_USERNAME, "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let token = login(&client, &srv, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], ADMIN_USERNAME);
    assert_eq!(body["role"], "HRAdmin");
    assert!(body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p == "employees.delete"));
}

#[tokio::test]
async fn manager_scope_is_enforced_end_to_end() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    create(&client, &srv, &admin, employee_body("Mia", "Young", "Ops", "Manager")).await;
    create(&client, &srv, &admin, employee_body("Ben", "Baker", "Ops", "Manager")).await;
    create(&client, &srv, &admin, employee_body("Al", "Adams", "Ops", "Employee")).await;
    create(&client, &srv, &admin, employee_body("Cat", "Cole", "Sales", "Employee")).await;

    let manager = login(&client, &srv, "Mia_Young", "secret").await;

    let res = client
        .get(srv.url("/employees"))
        .bearer_auth(&manager)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Vec<Value> = res.json().await.unwrap();
    let names: Vec<_> = listed
        .iter()
        .map(|e| e["last_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Baker", "Young", "Adams"]);

    // Managers may not hire managers or staff for other departments.
    for body in [
        employee_body("Max", "Roe", "Ops", "Manager"),
        employee_body("Sam", "Poe", "Sales", "Employee"),
    ] {
        let res = client
            .post(srv.url("/employees"))
            .bearer_auth(&manager)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    let hired = create(
        &client,
        &srv,
        &manager,
        employee_body("Sam", "Poe", "Ops", "Employee"),
    )
    .await;
    assert_eq!(hired["role"], "Employee");
    assert_eq!(hired["version"], 1);
}

#[tokio::test]
async fn employee_sees_only_own_record() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let me = create(&client, &srv, &admin, employee_body("Ann", "Lee", "Ops", "Employee")).await;
    let other = create(&client, &srv, &admin, employee_body("Bob", "Ray", "Ops", "Employee")).await;
    let token = login(&client, &srv, "Ann_Lee", "secret").await;

    let res = client
        .get(srv.url("/employees"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let listed: Vec<Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], me["id"]);

    let res = client
        .get(srv.url(&format!("/employees/{}", other["id"].as_str().unwrap())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(srv.url(&format!("/employees/{}", other["id"].as_str().unwrap())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_caller_gets_caller_not_found() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let token = mint_jwt(jwt_secret, "Ghost_User", Role::Manager);
    let res = client
        .get(srv.url("/employees"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "caller_not_found");
}

#[tokio::test]
async fn editing_own_role_returns_a_fresh_session() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let res = client
        .get(srv.url("/employees"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let listed: Vec<Value> = res.json().await.unwrap();
    let mut me = listed
        .into_iter()
        .find(|e| e["email"] == ADMIN_EMAIL)
        .expect("bootstrap admin listed");
    let id = me["id"].as_str().unwrap().to_string();
    me["role"] = json!("Manager");

    let res = client
        .put(srv.url(&format!("/employees/{id}")))
        .bearer_auth(&admin)
        .json(&me)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["employee"]["role"], "Manager");
    assert_eq!(body["employee"]["version"], 2);
    assert_eq!(body["user"]["role"], "Manager");
    assert!(body["user"].get("credential").is_none());
    assert_eq!(body["session"]["role"], "Manager");

    let refreshed = body["session"]["token"].as_str().unwrap();
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(refreshed)
        .send()
        .await
        .unwrap();
    let whoami: Value = res.json().await.unwrap();
    assert_eq!(whoami["role"], "Manager");
}

#[tokio::test]
async fn delete_twice_is_not_found_and_bad_input_is_rejected() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let mut negative = employee_body("Neg", "Pay", "Ops", "Employee");
    negative["salary"] = json!(-1);
    let res = client
        .post(srv.url("/employees"))
        .bearer_auth(&admin)
        .json(&negative)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url("/employees/not-a-uuid"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let target = create(
        &client,
        &srv,
        &admin,
        employee_body("Bob", "Ray", "Ops", "Employee"),
    )
    .await;
    let url = srv.url(&format!("/employees/{}", target["id"].as_str().unwrap()));

    let res = client.delete(&url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.delete(&url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The paired user went with the employee.
    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "username": "Bob_Ray", "password": "secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
