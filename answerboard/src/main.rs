//! Answerboard Main Entry Point
//!
//! Serves the question and answer HTTP API and runs the notification
//! dispatcher in the background.

use answerboard::{Config, Dependencies, ServerError, server};
use dotenv::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging.
///
/// `LOG_FORMAT=json` switches the console output to one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("answerboard=info,answerboard_ledger=info"));

    let json_output = wants_json(env::var("LOG_FORMAT").ok().as_deref());
    let json_layer = json_output.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
    });
    let pretty_layer =
        (!json_output).then(|| tracing_subscriber::fmt::layer().with_target(true).pretty());

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    info!(
        service_name = "answerboard",
        service_version = env!("CARGO_PKG_VERSION"),
        format = if json_output { "json" } else { "pretty" },
        "Tracing initialized"
    );
}

fn wants_json(log_format: Option<&str>) -> bool {
    log_format.is_some_and(|format| format.trim().eq_ignore_ascii_case("json"))
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting answerboard");

    let config = Config::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    let deps = match Dependencies::new(&config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let dispatcher = deps.dispatcher.spawn();
    let app = server::create_app(deps.state);

    let result = server::run_server(app, config.socket_addr()).await;

    // The router owned the last emitters, so the dispatcher drains and exits.
    if let Err(e) = dispatcher.await {
        warn!(error = %e, "Notification dispatcher ended abnormally");
    }

    match result {
        Ok(()) => {
            info!("Answerboard stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Server failed");
            Err(e)
        }
    }
}
