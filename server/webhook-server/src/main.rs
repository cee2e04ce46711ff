use clap::Parser;
use colored::*;
use config_engine::load_app_config;
use logger_redacted::LoggerConfig;
use std::{env, net::SocketAddr};
use tracing::{info, Level};
use tracing_subscriber::{
    field::RecordFields,
    fmt::{self, time::ChronoUtc, FormatFields},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use error_common::{log_error, Result, WebhookError};
use webhook_server::{create_app, TrackerServer};

/// CarePortals latest-state tracker HTTP server
#[derive(Parser, Debug)]
#[command(name = "webhook-server")]
#[command(about = "Webhook intake and latest-state tracking for CarePortals and Embeddables")]
struct Args {
    /// Server bind address (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Configuration file path
    #[arg(short, long, default_value = "tracker.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = load_app_config(&args.config)
        .map_err(|e| WebhookError::ConfigError(e.to_string()))?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(args.verbose, &config.logging);

    info!("📮 {}", format!("Starting {}", config.server.name).bright_cyan());
    info!("📋 Version: {}", env!("CARGO_PKG_VERSION").bright_white());
    info!("🗂️  Config file: {}", args.config.bright_white());

    let host = config.server.host.clone();
    let port = config.server.port;

    let (server, hook_worker) = match TrackerServer::from_config(config).await {
        Ok(started) => started,
        Err(e) => {
            log_error("storage initialization", &e).await;
            return Err(e);
        }
    };
    info!("💾 Storage backend: {}", server.backend.bright_yellow());

    let app = create_app(server);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| WebhookError::ConfigError(format!("Invalid bind address {}:{}: {}", host, port, e)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| WebhookError::NetworkError(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("🚀 {}", format!("Tracker running on http://{}", addr).bright_green());
    info!("📋 {}", format!("Health check available at: http://{}/health", addr).bright_blue());
    info!("🪝 {}", format!("Webhooks available at: http://{}/webhooks", addr).bright_blue());
    info!("🗃️  {}", format!("Table views available at: http://{}/tables", addr).bright_blue());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| WebhookError::ServerError(format!("HTTP server error: {}", e)))?;

    // the router (and with it the last hook sender) is gone; let queued hooks drain
    if let Err(e) = hook_worker.await {
        tracing::warn!(error = %e, "Hook worker ended abnormally");
    }

    info!("👋 {}", "Tracker stopped".bright_cyan());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_tracing(verbose: bool, logging: &LoggerConfig) {
    let level = if verbose {
        Level::DEBUG.to_string()
    } else {
        logging.log_level.clone()
    };

    // Check if we're in development or production
    let is_development =
        env::var("TRACKER_ENV").unwrap_or_else(|_| "development".to_string()) == "development";
    let use_colors = env::var("NO_COLOR").is_err() && atty::is(atty::Stream::Stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "webhook_server={level},tracking_engine={level},database_layer={level},tower_http=info,sqlx=warn",
            level = level
        )
        .into()
    });

    if is_development && use_colors && !logging.json_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .event_format(ColoredFormatter)
                    .fmt_fields(ColoredFieldFormatter),
            )
            .init();

        print_startup_banner();
    } else {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .init();
    }
}

fn print_startup_banner() {
    println!("{}", "╔══════════════════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║                  📮 CAREPORTALS STATE TRACKER                 ║".bright_cyan());
    println!("{}", "║         Orders · Subscriptions · Page Progress · Logs        ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

// Custom colored formatter for development
struct ColoredFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ColoredFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        write!(
            writer,
            "{} ",
            chrono::Utc::now().format("%H:%M:%S%.3f").to_string().bright_black()
        )?;

        let level_str = match *metadata.level() {
            Level::TRACE => "TRACE".bright_purple(),
            Level::DEBUG => "DEBUG".bright_blue(),
            Level::INFO => " INFO".bright_green(),
            Level::WARN => " WARN".bright_yellow(),
            Level::ERROR => "ERROR".bright_red(),
        };
        write!(writer, "[{}] ", level_str)?;

        if let Some(target) = metadata.target().split("::").last() {
            write!(writer, "{:<15} ", target.bright_cyan())?;
        }

        ctx.format_fields(writer.by_ref(), event)?;

        // file and line for debug/trace
        if metadata.level() >= &Level::DEBUG {
            if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
                let file_short = file.rsplit('/').next().unwrap_or(file);
                write!(writer, " {}", format!("({}:{})", file_short, line).bright_black())?;
            }
        }

        writeln!(writer)
    }
}

// Custom field formatter for colored output
struct ColoredFieldFormatter;

impl<'a> tracing_subscriber::fmt::FormatFields<'a> for ColoredFieldFormatter {
    fn format_fields<R: RecordFields>(
        &self,
        writer: tracing_subscriber::fmt::format::Writer<'a>,
        fields: R,
    ) -> std::fmt::Result {
        let mut visitor = ColoredFieldVisitor {
            writer,
            is_first: true,
            result: Ok(()),
        };
        fields.record(&mut visitor);
        visitor.result
    }
}

struct ColoredFieldVisitor<'a> {
    writer: tracing_subscriber::fmt::format::Writer<'a>,
    is_first: bool,
    result: std::fmt::Result,
}

impl ColoredFieldVisitor<'_> {
    fn write_field(&mut self, name: &str, value: &str) {
        if self.result.is_err() {
            return;
        }
        self.result = if name == "message" {
            write!(self.writer, "{}", value.white().bold())
        } else {
            write!(
                self.writer,
                "{}{}={}",
                if self.is_first { "" } else { " " },
                name.bright_yellow(),
                value.bright_white()
            )
        };
        self.is_first = false;
    }
}

impl tracing::field::Visit for ColoredFieldVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let text = format!("{:?}", value);
        self.write_field(field.name(), &text);
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.write_field(field.name(), value);
    }
}
