pub mod builders;
pub mod fake_worker;

use std::sync::{Arc, Mutex, Once};

use testpool::engine::Orchestrator;
use testpool::event::{EventKind, RelayedEvent};
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Observer that keeps every relayed event for later assertions.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<RelayedEvent>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register this recorder as an observer of `orchestrator`.
    pub fn attach(&self, orchestrator: &Orchestrator) {
        let events = Arc::clone(&self.events);
        orchestrator.on_event(move |event| {
            events.lock().unwrap().push(event.clone());
        });
    }

    pub fn events(&self) -> Vec<RelayedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind()).collect()
    }

    pub fn of_kind(&self, kind: EventKind) -> Vec<RelayedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    pub fn for_file(&self, file: &str) -> Vec<RelayedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.file == file)
            .collect()
    }
}
