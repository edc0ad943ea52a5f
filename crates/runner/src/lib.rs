//! A concurrent application runner that manages long-running processes with graceful shutdown.
//!
//! This runner orchestrates app processes and cleanup functions, providing:
//! - Concurrent execution of multiple processes sharing one cancellation token
//! - Shutdown as soon as any process exits, or on SIGTERM/SIGINT
//! - Closers that run on every exit path, in registration order, under a timeout
//!
//! # Example
//!
//! ```no_run
//! use ais_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = Runner::new()
//!         .with_app_process(|ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => {
//!                         tracing::info!("Process stopping gracefully");
//!                         break;
//!                     }
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("Process working...");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("Cleaning up resources");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5))
//!         .run()
//!         .await;
//!
//!     std::process::exit(if result.is_ok() { 0 } else { 1 });
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// Type alias for an app process function.
/// Takes a cancellation token and returns a future that resolves to Result<(), anyhow::Error>
pub type AppProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>
        + Send,
>;

/// Type alias for a closer function.
/// Returns a future that resolves to Result<(), anyhow::Error>
pub type Closer =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>> + Send>;

/// A concurrent application runner that manages long-running processes with graceful shutdown.
///
/// The `Runner` orchestrates app processes and cleanup functions:
/// - App processes run concurrently until the first one exits (for any reason)
///   or a shutdown signal is received; the others are then cancelled
/// - Closers execute afterward, regardless of process outcome
/// - The first process error is returned from [`Runner::run`]
pub struct Runner {
    app_processes: Vec<(String, AppProcess)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    process_shutdown_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Creates a new Runner with default configuration.
    ///
    /// Default settings:
    /// - Closer timeout: 10 seconds
    /// - Process shutdown timeout: 5 seconds
    /// - No app processes or closers
    pub fn new() -> Self {
        Self {
            app_processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            process_shutdown_timeout: Duration::from_secs(5),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds an app process to the runner.
    ///
    /// App processes run concurrently. When any process returns (successfully
    /// or not), all processes are cancelled and closers are executed.
    pub fn with_app_process<F, Fut>(self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        let name = format!("process_{}", self.app_processes.len());
        self.with_named_process(name, Box::new(|token| Box::pin(process(token))))
    }

    /// Adds an already boxed app process under a name used in logs.
    pub fn with_named_process(mut self, name: impl Into<String>, process: AppProcess) -> Self {
        self.app_processes.push((name.into(), process));
        self
    }

    /// Adds a closer to the runner.
    ///
    /// Closers are executed after all app processes have stopped,
    /// regardless of whether they stopped due to error or cancellation.
    /// They run one after another in the order they were added, and a
    /// failing closer does not prevent the next one from running.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    /// Sets the timeout for executing all closers.
    ///
    /// Default is 10 seconds.
    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Sets how long cancelled processes get to return before they are aborted.
    ///
    /// Default is 5 seconds.
    pub fn with_process_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.process_shutdown_timeout = timeout;
        self
    }

    /// Sets a custom cancellation token.
    ///
    /// This allows external control over process cancellation.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs all app processes and waits for completion or shutdown signal.
    ///
    /// This method:
    /// 1. Spawns all app processes concurrently
    /// 2. Monitors for SIGTERM/SIGINT signals
    /// 3. Cancels all processes when a signal is received or any process returns
    /// 4. Waits for the remaining processes, aborting them after the shutdown timeout
    /// 5. Executes all closers with the configured timeout
    /// 6. Returns the first process error, if any
    pub async fn run(self) -> anyhow::Result<()> {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();

        for (name, process) in self.app_processes {
            let process_token = token.clone();
            join_set.spawn(async move { (name, process(process_token).await) });
        }

        let signal_handlers = spawn_signal_handlers(token.clone());

        let mut first_error = None;

        // Wait for the first process to finish, then cancel the rest
        tokio::select! {
            _ = token.cancelled() => {}
            Some(joined) = join_set.join_next() => {
                record_process_exit(joined, &mut first_error);
                token.cancel();
            }
        }

        let remaining = async {
            while let Some(joined) = join_set.join_next().await {
                record_process_exit(joined, &mut first_error);
            }
        };
        if tokio::time::timeout(self.process_shutdown_timeout, remaining)
            .await
            .is_err()
        {
            tracing::warn!(
                "App processes did not stop within {:?}, aborting",
                self.process_shutdown_timeout
            );
        }
        join_set.shutdown().await;

        for handler in signal_handlers {
            handler.abort();
        }

        if !self.closers.is_empty() {
            tracing::info!("Running closers with timeout of {:?}", self.closer_timeout);

            match tokio::time::timeout(self.closer_timeout, run_closers(self.closers)).await {
                Ok(()) => tracing::info!("All closers completed"),
                Err(_) => tracing::error!("Closers timed out after {:?}", self.closer_timeout),
            }
        }

        match first_error {
            Some(err) => {
                tracing::error!("Application exiting with error: {:#}", err);
                Err(err)
            }
            None => {
                tracing::info!("Application exiting normally");
                Ok(())
            }
        }
    }
}

fn record_process_exit(
    joined: Result<(String, anyhow::Result<()>), tokio::task::JoinError>,
    first_error: &mut Option<anyhow::Error>,
) {
    match joined {
        Ok((name, Ok(()))) => {
            tracing::info!(process = %name, "App process completed");
        }
        Ok((name, Err(err))) => {
            tracing::error!(process = %name, "App process error: {:#}", err);
            if first_error.is_none() {
                *first_error = Some(err.context(format!("process {} failed", name)));
            }
        }
        Err(err) if err.is_cancelled() => {
            tracing::debug!("App process aborted");
        }
        Err(err) => {
            tracing::error!("App process panicked: {}", err);
            if first_error.is_none() {
                *first_error = Some(anyhow::anyhow!("app process panicked: {}", err));
            }
        }
    }
}

fn spawn_signal_handlers(token: CancellationToken) -> Vec<JoinHandle<()>> {
    let mut handlers = Vec::new();

    let ctrl_c_token = token.clone();
    handlers.push(tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => {
                tracing::error!("Error setting up signal handler: {}", err);
            }
        }
    }));

    // Also handle SIGTERM on Unix systems
    #[cfg(unix)]
    handlers.push(tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
                token.cancel();
            }
            Err(err) => {
                tracing::error!("Error setting up SIGTERM handler: {}", err);
            }
        }
    }));

    handlers
}

/// Runs all closers sequentially in registration order.
async fn run_closers(closers: Vec<Closer>) {
    for closer in closers {
        match closer().await {
            Ok(()) => tracing::debug!("Closer completed successfully"),
            Err(err) => tracing::error!("Closer error: {:#}", err),
        }
    }
}
