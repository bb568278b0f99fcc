//! Reel JSON API Server

use std::{process, sync::Arc};

use salvo::{
    affix_state::inject,
    oapi::{
        OpenApi,
        security::{Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    trailing_slash::remove_slash,
};
use tracing::{error, info, warn};

use reel_app::{clock::SystemClock, context::AppContext, domain::mailer::LogMailer};

use crate::{
    config::ServerConfig,
    observability::Observability,
    state::{ServiceInfo, State},
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admission;
mod auth;
mod config;
mod errors;
mod extensions;
mod healthcheck;
mod lifecycle;
mod movies;
mod observability;
mod router;
mod shutdown;
mod state;
#[cfg(test)]
mod test_helpers;
mod tokens;
mod users;

/// Reel JSON API Server entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = ServerConfig::load().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        exit_with_failure();
    });

    let observability = Observability::init(&config).unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "subscriber failed to install, eprintln is the only sink left"
        )]
        {
            eprintln!("Observability error: {e}");
        }

        exit_with_failure();
    });

    let settings = match config.context_settings() {
        Ok(settings) => settings,
        Err(source) => {
            error!("invalid limiter configuration: {source}");

            exit_with_failure();
        }
    };

    let app = match AppContext::connect(&settings, Arc::new(SystemClock), Arc::new(LogMailer)).await
    {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            exit_with_failure();
        }
    };

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let service_info = ServiceInfo::new(
        config
            .observability
            .otel_deployment_environment
            .clone(),
    );

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(observability::request_logging)
        .hoop(remove_slash())
        .hoop(inject(State::from_app_context(app.clone(), service_info)))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(router::app_router());

    let doc = OpenApi::new("Reel API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();
    let grace = config.server.shutdown_grace();

    // Listen for shutdown signal
    tokio::spawn({
        let lifecycle = app.lifecycle.clone();

        async move {
            if let Err(error) = shutdown::listen(handle, lifecycle, grace).await {
                error!("failed to listen for shutdown signal: {error}");
            }
        }
    });

    // Start serving requests
    server.serve(router).await;

    if !app.shutdown(grace).await {
        warn!("shutdown grace period elapsed with work still outstanding");
    }

    info!("server stopped");

    observability.shutdown();
}

#[expect(clippy::exit, reason = "startup failures end the process with a non-zero code")]
fn exit_with_failure() -> ! {
    process::exit(1)
}
