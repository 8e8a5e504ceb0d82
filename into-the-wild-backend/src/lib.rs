//! HTTP surface of the registration service. Everything that decides
//! anything lives in the workflow crate; handlers here only translate
//! between requests and workflow calls.

pub mod error;
pub mod extract;
pub mod proof_store;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use into_the_wild_config::Config;
use into_the_wild_database::{get_database_connection, DatabaseError, PgStore};
use into_the_wild_registration::notify::{LogSink, NotificationTemplates, Notifier};
use into_the_wild_registration::{RegistrationService, TentService};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::proof_store::FsProofStore;

#[derive(Clone)]
pub struct AppState {
    pub registrations: RegistrationService,
    pub tents: TentService,
}

#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/treks/:trek_id", get(routes::treks::show))
        .route("/treks/:trek_id/availability", get(routes::treks::availability))
        .route(
            "/treks/:trek_id/registrations",
            post(routes::registrations::create),
        )
        .route(
            "/registrations/:registration_id",
            get(routes::registrations::show),
        )
        .route(
            "/registrations/:registration_id/payment-proof",
            post(routes::registrations::upload_payment_proof),
        )
        .route(
            "/registrations/:registration_id/cancel",
            post(routes::registrations::cancel),
        )
        .route("/treks/:trek_id/tent-requests", post(routes::tents::create))
        .route("/tent-requests/:request_id/approve", post(routes::tents::approve))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new()),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

pub async fn run_server(config: Config) -> Result<(), ServeError> {
    info!("starting up server...");

    let pool = get_database_connection(&config.database_url)?;
    let store = Arc::new(PgStore::new(pool));
    let proofs = Arc::new(FsProofStore::new(
        config.proofs.root.clone(),
        &config.proofs.public_base_url,
    ));
    let notifier = Notifier::new(
        NotificationTemplates::default(),
        config.notifications.channels.clone(),
        Arc::new(LogSink),
    );

    let state = AppState {
        registrations: RegistrationService::new(store.clone(), proofs, notifier.clone()),
        tents: TentService::new(store.clone(), store, notifier),
    };
    let app = build_router(state);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("listening on {}", config.listen_addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
