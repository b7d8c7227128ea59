use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatecheck::api::{ApiServer, ApiServerConfig, AppState};
use gatecheck::bulk::{LogMailer, Mailer, SmtpMailer};
use gatecheck::config::AppConfig;
use ticket_render::{FontLibrary, FsAssetSource, TicketRenderer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatecheck=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env_or_default();

    let fonts = match FontLibrary::load_dir(&config.fonts_dir) {
        Ok(fonts) => fonts,
        Err(e) => {
            tracing::warn!(
                dir = %config.fonts_dir.display(),
                error = %e,
                "Font directory unavailable, text overlays will fail until fonts are added"
            );
            FontLibrary::empty()
        }
    };
    let renderer = Arc::new(TicketRenderer::new(
        fonts,
        Arc::new(FsAssetSource::new(&config.data_dir)),
    ));

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "SMTP delivery enabled");
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            tracing::info!("SMTP not configured, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = AppState::new(config, renderer, mailer);
    let server = ApiServer::with_state(ApiServerConfig::from_env_or_default(), state);

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, shutting down");
            cancel_token.cancel();
        }
    });

    server.run().await?;

    Ok(())
}
