use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logging_api::auth::AuthService;
use logging_api::notification::reporter::ErrorReporter;
use logging_api::store::postgres::PgStore;
use logging_api::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let otel_enabled = init_tracing()?;

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Migrate) => {
            let db = PgStore::connect(&cfg.database).await?;
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        Some(cli::Commands::Token { command }) => {
            let db = PgStore::connect(&cfg.database).await?;
            let state = AppState::new(db, ErrorReporter::disabled());
            handle_token_command(command, &state.auth).await
        }
        None => run_server(cfg, None).await,
    };

    if otel_enabled {
        opentelemetry::global::shutdown_tracer_provider();
    }
    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Install the subscriber. OTLP export is added when
/// OTEL_EXPORTER_OTLP_ENDPOINT is set; returns whether it was.
fn init_tracing() -> anyhow::Result<bool> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "logging-api"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };
    let enabled = telemetry_layer.is_some();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "logging_api=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();

    Ok(enabled)
}

async fn run_server(cfg: config::Config, port: Option<u16>) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let reporter = ErrorReporter::from_config(&cfg.telemetry)?;
    let state = Arc::new(AppState::new(db, reporter.clone()));
    let app = api::router(state);

    let host: IpAddr = cfg
        .host
        .parse()
        .with_context(|| format!("invalid LOGGING_API_HOST: {}", cfg.host))?;
    let addr = SocketAddr::new(host, port.unwrap_or(cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Logging API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Flushing error reports...");
    reporter.shutdown(cfg.telemetry.flush_timeout).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

async fn handle_token_command(cmd: cli::TokenCommands, auth: &AuthService) -> anyhow::Result<()> {
    match cmd {
        cli::TokenCommands::Create { name, admin, bot_id } => {
            let token = auth.create_token(bot_id, &name, admin).await?;
            println!(
                "Token created:\n  ID:    {}\n  Admin: {}\n  Use:   Authorization: Bearer {}",
                token.id, token.is_admin, token.id
            );
        }
        cli::TokenCommands::List => {
            let tokens = auth.list_tokens().await?;
            if tokens.is_empty() {
                println!("No tokens found.");
            } else {
                println!(
                    "{:<38} {:<24} {:<8} {:<8} {:<38}",
                    "ID", "NAME", "ACTIVE", "ADMIN", "BOT"
                );
                for t in tokens {
                    let bot = t.bot_id.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<38} {:<24} {:<8} {:<8} {:<38}",
                        t.id, t.name, t.is_active, t.is_admin, bot
                    );
                }
            }
        }
        cli::TokenCommands::Deactivate { token_id } => {
            auth.deactivate_token(token_id).await?;
            println!("Token {} deactivated.", token_id);
        }
        cli::TokenCommands::Delete { token_id } => {
            auth.delete_token(token_id).await?;
            println!("Token {} deleted.", token_id);
        }
    }
    Ok(())
}
