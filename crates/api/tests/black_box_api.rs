use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = warden_api::app::build_app("test-secret".to_string()).expect("failed to build app");
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
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(client: &reqwest::Client, base_url: &str, email: &str, password: &str) -> String {
    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK, "login as {email} failed");
    let body: serde_json::Value = res.json().await.unwrap();
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/auth/me", "/role/index", "/user/index", "/log-activity"] {
        let res = client
            .get(format!("{}{}", srv.base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn login_rejects_unknown_email_and_wrong_password() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "nobody@nowhere.com", "password": "string" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "s@s.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn seeded_super_admin_sees_self_and_full_catalog() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv.base_url, "s@s.com", "string").await;

    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["email"], "s@s.com");
    assert_eq!(body["data"]["role"], "Super Admin");

    // Bypass holders materialize the whole permission catalog.
    let res = client
        .get(format!("{}/auth/permission", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["role"], "Super Admin");
    assert_eq!(body["permissions"].as_array().unwrap().len(), 15);
}

#[tokio::test]
async fn bypass_user_manages_catalog_and_mutations_hit_the_log() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv.base_url, "s@s.com", "string").await;

    let res = client
        .post(format!("{}/role/store", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Auditor", "permissions": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/role/index", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["name"] == "Auditor"));

    let res = client
        .get(format!("{}/log-activity?limit=50", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["event"] == "create role"));
}

#[tokio::test]
async fn admin_role_is_refused_bypass_gated_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv.base_url, "r@r.com", "string").await;

    let res = client
        .post(format!("{}/role/store", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Intruder", "permissions": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/log-activity", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // But the Admin role gate on user management passes.
    let res = client
        .get(format!("{}/user/index", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_verify_login_flow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({
            "name": "Joni",
            "email": "j@j.com",
            "password": "secret1",
            "password_confirmation": "secret1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let verification = body["verification"].clone();

    // Unverified login: 403, but a usable token comes back.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "j@j.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    let unverified_token = body["access_token"].as_str().unwrap().to_string();

    // The token authenticates but verified-gated routes refuse it.
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&unverified_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Resend works without verification.
    let res = client
        .post(format!("{}/email/resend", srv.base_url))
        .bearer_auth(&unverified_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Follow the link from the register response.
    let res = client
        .get(format!(
            "{}/email/verify/{}/{}?expires={}",
            srv.base_url,
            verification["user_id"].as_str().unwrap(),
            verification["signature"].as_str().unwrap(),
            verification["expires"],
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let token = login(&client, &srv.base_url, "j@j.com", "secret1").await;
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn tampered_verification_link_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({
            "name": "Tina",
            "email": "t@t.com",
            "password": "secret1",
            "password_confirmation": "secret1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let verification = &body["verification"];

    // Stretched expiry invalidates the signature.
    let res = client
        .get(format!(
            "{}/email/verify/{}/{}?expires={}",
            srv.base_url,
            verification["user_id"].as_str().unwrap(),
            verification["signature"].as_str().unwrap(),
            verification["expires"].as_i64().unwrap() + 3600,
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_routes_serve_any_verified_user() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({
            "name": "Sari",
            "email": "v@v.com",
            "password": "secret1",
            "password_confirmation": "secret1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let verification = &body["verification"];

    let res = client
        .get(format!(
            "{}/email/verify/{}/{}?expires={}",
            srv.base_url,
            verification["user_id"].as_str().unwrap(),
            verification["signature"].as_str().unwrap(),
            verification["expires"],
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let token = login(&client, &srv.base_url, "v@v.com", "secret1").await;

    // A role-less verified user reaches the whole profile group.
    let res = client
        .get(format!("{}/profile", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["email"], "v@v.com");
    assert!(body["data"]["role"].is_null());

    let res = client
        .put(format!("{}/profile/update-profile", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Sari", "email": "v@v.com", "city": "Dumai" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["data"]["city"], "Dumai");

    let res = client
        .get(format!("{}/log-activity/user-activity", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["event"] == "update profile"));
}

#[tokio::test]
async fn password_change_requires_the_current_password() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv.base_url, "p@p.com", "string").await;

    let res = client
        .post(format!("{}/profile/update-password", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "current_password": "wrong-password",
            "new_password": "newsecret1",
            "new_password_confirmation": "newsecret1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .post(format!("{}/profile/update-password", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "current_password": "string",
            "new_password": "newsecret1",
            "new_password_confirmation": "newsecret1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Old password is gone, the new one works.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "p@p.com", "password": "string" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let token = login(&client, &srv.base_url, "p@p.com", "newsecret1").await;

    // Self-service deactivation revokes the session.
    let res = client
        .post(format!("{}/profile/deactivate", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "password": "newsecret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/profile", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_every_session() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv.base_url, "s@s.com", "string").await;
    let second = login(&client, &srv.base_url, "s@s.com", "string").await;

    let res = client
        .post(format!("{}/auth/logout", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    for stale in [&token, &second] {
        let res = client
            .get(format!("{}/auth/me", srv.base_url))
            .bearer_auth(stale)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn user_update_shows_up_in_own_activity() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv.base_url, "s@s.com", "string").await;

    let res = client
        .get(format!("{}/user/index", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let target_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == "p@p.com")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = client
        .put(format!("{}/user/update/{}", srv.base_url, target_id))
        .bearer_auth(&token)
        .json(&json!({ "city": "Jakarta" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/log-activity/user-activity", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let update = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["event"] == "update user")
        .expect("update user entry missing");
    assert_eq!(update["diff"]["attributes"]["city"], "Jakarta");
}
