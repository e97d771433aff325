use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let app = match (std::env::var("ADMIN_NAME"), std::env::var("ADMIN_PASSWORD")) {
        (Ok(name), Ok(password)) => {
            tracing::info!(%name, "seeding administrator");
            mock_server::app_with_admin(&name, &password)
        }
        _ => mock_server::app(),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    mock_server::run(listener, app).await
}
