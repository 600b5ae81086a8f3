//! The embeddable server façade
//!
//! `MimicServer` owns port selection, the serve task lifecycle, and the
//! fault-injection control surface. It is the only writer of the failure
//! state; request workers only ever read snapshots of it.

use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;

use application::{FailureState, InterceptingHandler, ports::DataEnginePort};
use domain::requests::{DeleteTableInput, DeleteTableOutput, ListTablesInput, ListTablesOutput};
use domain::{ErrorCondition, ErrorSpec, OperationKind, ServiceErrorKind};
use infrastructure::{BootstrapError, BundledBootstrap, MemoryEngine, StorageBootstrap};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::client::{WireClient, WireError};
use crate::routes;
use crate::state::AppState;

/// Errors from the façade lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No ephemeral port could be allocated
    #[error("no free port available: {0}")]
    PortAllocation(std::io::Error),

    /// The storage bootstrap exhausted its search
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// The service socket could not be bound
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// `start()` was called while the server was already serving
    #[error("server already started")]
    AlreadyStarted,

    /// `start()` was called on a stopped instance; stopped is terminal
    #[error("server instance has been stopped")]
    Terminated,

    /// The serve task did not shut down cleanly
    #[error("shutdown failed: {0}")]
    Shutdown(String),

    /// `reset()` could not wipe the data through the wire protocol
    #[error("reset failed: {0}")]
    Reset(#[from] WireError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Started,
    Stopped,
}

struct RunningServer {
    shutdown: watch::Sender<()>,
    task: JoinHandle<()>,
}

/// Embeddable local server with a programmable failure mode.
pub struct MimicServer {
    port: u16,
    failure: Arc<FailureState>,
    handler: Arc<InterceptingHandler>,
    bootstrap: Arc<dyn StorageBootstrap>,
    lifecycle: Lifecycle,
    running: Option<RunningServer>,
}

impl MimicServer {
    /// Server on a free ephemeral port. The port is probed by binding a
    /// scratch socket and releasing it immediately; the race against other
    /// processes grabbing it before `start()` is accepted as benign.
    pub fn new() -> Result<Self, ServerError> {
        Ok(Self::with_port(find_free_port()?))
    }

    /// Server on a caller-chosen port.
    pub fn with_port(port: u16) -> Self {
        let failure = Arc::new(FailureState::new());
        let engine: Arc<dyn DataEnginePort> = Arc::new(MemoryEngine::new());
        let handler = Arc::new(InterceptingHandler::new(engine, Arc::clone(&failure)));
        Self {
            port,
            failure,
            handler,
            bootstrap: Arc::new(BundledBootstrap::new()),
            lifecycle: Lifecycle::Created,
            running: None,
        }
    }

    /// Substitute the storage bootstrap strategy run by `start()`.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: Arc<dyn StorageBootstrap>) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// The port this server serves (or will serve) on.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Base address clients must target.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Run the storage bootstrap, bind the socket, and begin serving.
    /// Both failures are fatal and surfaced to the caller.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        match self.lifecycle {
            Lifecycle::Started => return Err(ServerError::AlreadyStarted),
            Lifecycle::Stopped => return Err(ServerError::Terminated),
            Lifecycle::Created => {},
        }
        self.bootstrap.ensure_ready()?;

        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        info!(port = self.port, "starting server");

        let app = routes::create_router(AppState {
            handler: Arc::clone(&self.handler),
        });
        let (shutdown, mut rx) = watch::channel(());
        let task = tokio::spawn(async move {
            let shutdown_signal = async move {
                let _ = rx.changed().await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal)
                .await
            {
                error!("serve loop failed: {e}");
            }
        });

        self.running = Some(RunningServer { shutdown, task });
        self.lifecycle = Lifecycle::Started;
        Ok(())
    }

    /// Unbind and release all resources. Safe to call repeatedly; calling it
    /// on an already-stopped server only logs.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        self.lifecycle = Lifecycle::Stopped;
        let Some(running) = self.running.take() else {
            debug!("server already stopped");
            return Ok(());
        };
        info!(port = self.port, "stopping server");
        let _ = running.shutdown.send(());
        running
            .task
            .await
            .map_err(|e| ServerError::Shutdown(e.to_string()))
    }

    /// Force every matching request to fail with the given status code.
    /// The returned handle refines the failure; each refinement call is
    /// immediately effective on its own.
    pub fn fails_with_status(&self, status_code: u16) -> InjectedFailure {
        InjectedFailure::install(Arc::clone(&self.failure), ErrorSpec::new(status_code))
    }

    /// Force every matching request to fail with a predefined catalog entry.
    pub fn fails_with(&self, kind: ServiceErrorKind) -> InjectedFailure {
        InjectedFailure::install(Arc::clone(&self.failure), kind.spec())
    }

    /// The server behaves normally again.
    pub fn clear_failure(&self) {
        self.failure.clear();
    }

    /// Back to the post-construction state: failure cleared, and every table
    /// deleted through the wire protocol itself, so the clean state is
    /// client-observable rather than an internal flag.
    pub async fn reset(&self) -> Result<(), ServerError> {
        self.clear_failure();
        let client = WireClient::new(self.endpoint());
        let tables: ListTablesOutput = client
            .call(OperationKind::ListTables, &ListTablesInput::default())
            .await?;
        for table_name in tables.table_names {
            let _: DeleteTableOutput = client
                .call(OperationKind::DeleteTable, &DeleteTableInput { table_name })
                .await?;
        }
        Ok(())
    }
}

impl Drop for MimicServer {
    // Safety net when the caller never stopped the server: signal the serve
    // task so the port is released; the OS reclaims everything at process
    // exit regardless.
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            debug!(port = self.port, "releasing server resources at drop");
            let _ = running.shutdown.send(());
        }
    }
}

impl std::fmt::Debug for MimicServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MimicServer")
            .field("port", &self.port)
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}

/// Handle over the active failure. Every `with_*` call derives a new spec
/// and installs it immediately — intermediate links in a chain are each
/// independently effective, not just the final one.
#[derive(Debug)]
pub struct InjectedFailure {
    state: Arc<FailureState>,
    spec: ErrorSpec,
}

impl InjectedFailure {
    fn install(state: Arc<FailureState>, spec: ErrorSpec) -> Self {
        state.force(spec.clone());
        Self { state, spec }
    }

    /// Refine the failure with an error code.
    #[must_use]
    pub fn with_error_code(self, error_code: impl Into<String>) -> Self {
        let spec = self.spec.with_error_code(error_code);
        Self::install(self.state, spec)
    }

    /// Refine the failure with an error message.
    #[must_use]
    pub fn with_error_message(self, error_message: impl Into<String>) -> Self {
        let spec = self.spec.with_error_message(error_message);
        Self::install(self.state, spec)
    }

    /// Scope the failure to requests matching a condition.
    #[must_use]
    pub fn with_condition(self, condition: ErrorCondition) -> Self {
        let spec = self.spec.with_condition(condition);
        Self::install(self.state, spec)
    }
}

fn find_free_port() -> Result<u16, ServerError> {
    let listener =
        StdTcpListener::bind(("127.0.0.1", 0)).map_err(ServerError::PortAllocation)?;
    let port = listener
        .local_addr()
        .map_err(ServerError::PortAllocation)?
        .port();
    drop(listener);
    Ok(port)
}
