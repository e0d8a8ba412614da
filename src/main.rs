use std::sync::Arc;

use anyhow::Context;

use placement_pitcher::config::{MailboxConfig, ServerConfig, SmtpConfig};
use placement_pitcher::mailbox::{ImapConnector, MailboxPoller};
use placement_pitcher::outbound::{OutreachService, SmtpMailer};
use placement_pitcher::replies::ReplyTracker;
use placement_pitcher::routes::{AppState, app_routes};
use placement_pitcher::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let server = ServerConfig::from_env().context("Invalid server configuration")?;
    let mailbox = MailboxConfig::from_env()
        .context("Mailbox credentials missing; set SMTP_EMAIL and SMTP_PASSWORD")?;
    let smtp = SmtpConfig::from_env().context("Invalid SMTP configuration")?;

    eprintln!("📬 Placement Pitcher v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mailbox: {} via {}:{}", mailbox.username, mailbox.host, mailbox.port);
    eprintln!("   Database: {}", server.db_path.display());
    eprintln!("   API: http://0.0.0.0:{}/api", server.port);

    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&server.db_path)
            .await
            .context("Failed to open database")?,
    );

    let poller = MailboxPoller::new(mailbox, Box::new(ImapConnector))
        .with_html_policy(server.html_body);
    let tracker = Arc::new(ReplyTracker::new(poller, Arc::clone(&db), server.poll_limit));

    let mailer = SmtpMailer::new(&smtp).context("Failed to configure SMTP transport")?;
    let outreach = Arc::new(OutreachService::new(Arc::clone(&db), Arc::new(mailer)));

    let app = app_routes(AppState {
        db,
        tracker,
        outreach,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", server.port))
        .await
        .with_context(|| format!("Failed to bind port {}", server.port))?;
    tracing::info!(port = server.port, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
