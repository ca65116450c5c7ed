use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tschwaa_server::core::{AppState, Config};
use tschwaa_server::notifications::{NotificationSender, WhatsAppSender};
use tschwaa_server::repositories::Gateway;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging: RUST_LOG ha la precedenza
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tschwaa_server=debug")),
        )
        .init();

    // Inizializza la configurazione
    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    config.print_info();

    // Database + migrazioni
    let gateway = Gateway::from_config(&config).await?;

    let sender: Arc<dyn NotificationSender> = Arc::new(WhatsAppSender::new(
        config.whatsapp.clone(),
        config.join_link_base_url.clone(),
    ));
    let state = Arc::new(AppState::new(gateway, sender, &config));

    // Crea il router
    let app = tschwaa_server::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    info!("Server listening on http://{}", addr);

    // Crea il listener TCP
    let listener = TcpListener::bind(addr).await?;

    // Avvia il server
    axum::serve(listener, app).await?;

    Ok(())
}
