#[tokio::main]
async fn main() {
    warden_observability::init();

    let app_key = std::env::var("APP_KEY").unwrap_or_else(|_| {
        tracing::warn!("APP_KEY not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let app = warden_api::app::build_app(app_key).expect("failed to build application");

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
