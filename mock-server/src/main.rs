use mock_server::MerchantCredentials;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let defaults = MerchantCredentials::default();
    let credentials = MerchantCredentials {
        merchant_id: std::env::var("PWINTY_MERCHANT_ID").unwrap_or(defaults.merchant_id),
        api_key: std::env::var("PWINTY_API_KEY").unwrap_or(defaults.api_key),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, merchant_id = %credentials.merchant_id, "mock Pwinty API listening");
    mock_server::run_with_credentials(listener, credentials).await
}
