pub mod utils;

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use common::directory::DocumentWatch;
use common::session::{SessionEvent, SessionState};

use crate::http_server;
use crate::state::AuthConfig;
use crate::{ServiceConfig, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait before retrying a failed subscription open.
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Handle for gracefully shutting down the app service.
pub struct ShutdownHandle {
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Block until the service shuts down (via signal or explicit shutdown).
    pub async fn wait(self) {
        shutdown_and_join(self.graceful_waiter, self.handles).await;
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Initialize logging, panic handler, and build info reporting.
/// Returns guards that must be kept alive for the duration of the program.
fn init_logging(
    service_config: &ServiceConfig,
) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    // Stdout layer
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    // File layer (if log_dir is set)
    if let Some(log_dir) = &service_config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, "docshelf.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(service_config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Create service state from config, exiting on error.
fn create_state(service_config: &ServiceConfig) -> ServiceState {
    match ServiceState::from_config(service_config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("error creating server state: {}", e);
            std::process::exit(3);
        }
    }
}

/// Wait for shutdown and join all handles with timeout.
async fn shutdown_and_join(
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    let _ = graceful_waiter.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}

/// Establish the startup identity: the configured custom token if present,
/// otherwise reuse-or-anonymous. Failure leaves the app in its degraded,
/// identity-less mode; every identity-gated operation stays refused.
async fn resolve_session(state: &ServiceState, custom_token: Option<&str>) {
    let result = match custom_token {
        Some(token) => state.session().sign_in_with_token(token).await,
        None => state.session().resolve().await,
    };

    match result {
        Ok(session) => {
            if let Err(e) = state.refresh_directory(Some(&session.access_token)) {
                tracing::error!("failed to refresh directory backend: {}", e);
            }
            tracing::info!(user_id = %session.user_id, "session resolved");
        }
        Err(e) => {
            tracing::error!("session establishment failed: {}", e);
        }
    }
}

/// Keep the visible-document snapshot in sync with the directory feed.
///
/// Opens the subscription once an identity exists, republishes the visible
/// set on every feed delivery, and re-subscribes whenever the identity
/// changes. Exactly one subscription is active at a time; losing the
/// identity closes it and clears the snapshot.
async fn run_directory_sync(state: ServiceState, mut shutdown_rx: watch::Receiver<()>) {
    let session = state.session().clone();
    let mut events = session.events();
    let mut doc_watch: Option<DocumentWatch> = None;

    loop {
        if doc_watch.is_none() {
            if let Some(identity) = session.identity() {
                match state.directory().subscribe(&identity).await {
                    Ok(w) => {
                        state.publish_documents(w.current());
                        doc_watch = Some(w);
                    }
                    Err(e) => {
                        tracing::error!("failed to open directory subscription: {}", e);
                        tokio::time::sleep(RESUBSCRIBE_DELAY).await;
                        continue;
                    }
                }
            }
        }

        // Resolve the next wakeup first so the borrow on the open
        // subscription ends before it may need to be replaced
        enum Step {
            Shutdown,
            FeedChanged,
            FeedClosed,
            Event(Result<SessionEvent, tokio::sync::broadcast::error::RecvError>),
        }

        let step = match &mut doc_watch {
            Some(w) => {
                tokio::select! {
                    _ = shutdown_rx.changed() => Step::Shutdown,
                    event = events.recv() => Step::Event(event),
                    changed = w.changed() => match changed {
                        Ok(()) => Step::FeedChanged,
                        Err(_) => Step::FeedClosed,
                    },
                }
            }
            None => {
                tokio::select! {
                    _ = shutdown_rx.changed() => Step::Shutdown,
                    event = events.recv() => Step::Event(event),
                }
            }
        };

        match step {
            Step::Shutdown => break,
            Step::FeedChanged => {
                if let Some(w) = &doc_watch {
                    state.publish_documents(w.current());
                }
            }
            Step::FeedClosed => {
                doc_watch = None;
            }
            Step::Event(Ok(SessionEvent::SignedIn(identity))) => {
                tracing::info!(user_id = %identity, "identity changed, re-subscribing");
                let access_token = match session.state() {
                    SessionState::Ready(s) => Some(s.access_token),
                    _ => None,
                };
                if let Err(e) = state.refresh_directory(access_token.as_deref()) {
                    tracing::error!("failed to refresh directory backend: {}", e);
                }
                doc_watch = None;
            }
            Step::Event(Ok(SessionEvent::SignedOut)) | Step::Event(Ok(SessionEvent::Unavailable(_))) => {
                doc_watch = None;
                state.publish_documents(Vec::new());
            }
            Step::Event(Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped))) => {
                tracing::warn!(skipped, "session event stream lagged");
            }
            Step::Event(Err(tokio::sync::broadcast::error::RecvError::Closed)) => break,
        }
    }
}

/// Create state and spawn background tasks, returning the state handle.
///
/// The returned `ShutdownHandle` must be kept alive; dropping it does not
/// stop the service.
pub async fn start_service(service_config: &ServiceConfig) -> (ServiceState, ShutdownHandle) {
    let (graceful_waiter, shutdown_tx, shutdown_rx) = utils::graceful_shutdown_blocker();
    let state = create_state(service_config);

    let mut handles = Vec::new();

    // Resolve the startup identity, then keep the document snapshot synced
    let custom_token = match &service_config.auth {
        AuthConfig::Rest { custom_token, .. } => custom_token.clone(),
        _ => None,
    };
    let sync_state = state.clone();
    let sync_rx = shutdown_rx.clone();
    let sync_handle = tokio::spawn(async move {
        resolve_session(&sync_state, custom_token.as_deref()).await;
        run_directory_sync(sync_state, sync_rx).await;
    });
    handles.push(sync_handle);

    // Spawn the app server (UI + API)
    let app_port = service_config.app_port;
    let app_addr = SocketAddr::from_str(&format!("0.0.0.0:{}", app_port))
        .expect("Failed to parse app listen address");
    let app_state = state.clone();
    let app_config = http_server::Config::new(app_addr, service_config.log_level);
    let app_rx = shutdown_rx.clone();
    let app_handle = tokio::spawn(async move {
        if let Err(e) = http_server::run_app(app_config, app_state, app_rx).await {
            tracing::error!("App server error: {}", e);
        }
    });
    handles.push(app_handle);

    tracing::info!("Running: app server on port {}", app_port);

    let handle = ShutdownHandle {
        graceful_waiter,
        handles,
        shutdown_tx,
    };

    (state.clone(), handle)
}

/// Spawns the app service: session resolution + directory sync + app server.
/// Blocks until shutdown signal is received. Use for CLI binary usage.
pub async fn spawn_service(service_config: &ServiceConfig) {
    let _guards = init_logging(service_config);
    let (_, handle) = start_service(service_config).await;
    handle.wait().await;
}
