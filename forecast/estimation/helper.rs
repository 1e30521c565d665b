use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord, FileEventPublisher};
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use tokio::runtime::Runtime;

use crate::config::TelemetrySettings;

/// Telemetry builder for the estimation engine.
pub struct EstimationTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    logger: Option<Arc<JsonLogger>>,
    min_level: LogLevel,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl EstimationTelemetryBuilder {
    /// Creates a new builder scoped to a module label.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            logger: None,
            min_level: LogLevel::Debug,
            event_publisher: None,
        }
    }

    /// Logs to a JSON-lines file.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Logs through an existing logger (e.g. an in-memory one). Wins over `log_path`.
    #[must_use]
    pub fn logger(mut self, logger: Arc<JsonLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Drops file-log records below `level`.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Applies file locations and level from configuration.
    ///
    /// # Errors
    ///
    /// Fails when the event log directory cannot be created.
    pub fn settings(mut self, settings: &TelemetrySettings) -> Result<Self> {
        if let Some(path) = &settings.log_path {
            self.log_path = Some(path.clone());
        }
        if let Some(path) = &settings.event_log {
            self.event_publisher = Some(Arc::new(FileEventPublisher::new(path)?));
        }
        self.min_level = settings.min_level;
        Ok(self)
    }

    /// Builds telemetry.
    ///
    /// # Errors
    ///
    /// Fails when the log file cannot be opened.
    pub fn build(self) -> Result<EstimationTelemetry> {
        let logger = match (self.logger, self.log_path) {
            (Some(logger), _) => Some(logger),
            (None, Some(path)) => Some(Arc::new(
                JsonLogger::new(path)?.with_min_level(self.min_level),
            )),
            (None, None) => None,
        };
        Ok(EstimationTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                logger,
                event: self.event_publisher.map(EventHandle::new),
            }),
        })
    }
}

/// Telemetry handle shared across engine components.
#[derive(Clone)]
pub struct EstimationTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for EstimationTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstimationTelemetry")
            .field("module", &self.inner.module)
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<Arc<JsonLogger>>,
    event: Option<EventHandle>,
}

struct EventHandle {
    publisher: Arc<dyn EventPublisher>,
}

impl EventHandle {
    const fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    fn publish(&self, record: EventRecord) -> Result<()> {
        if tokio::runtime::Handle::try_current().is_ok() {
            let publisher = Arc::clone(&self.publisher);
            tokio::spawn(async move {
                let _ = publisher.publish(record).await;
            });
            Ok(())
        } else {
            Runtime::new()?.block_on(self.publisher.publish(record))
        }
    }
}

impl EstimationTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> EstimationTelemetryBuilder {
        EstimationTelemetryBuilder::new(module)
    }

    /// Module label.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.inner.module
    }

    /// Logs a dotted message key with structured metadata.
    ///
    /// # Errors
    ///
    /// Propagates sink write failures.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            logger.log(&record)?;
        }
        Ok(())
    }

    /// Emits an event.
    ///
    /// # Errors
    ///
    /// Fails when no runtime can be started or the publisher rejects the record.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(handle) = &self.inner.event {
            handle.publish(EventRecord::new(&self.inner.module, event_type, payload))?;
        }
        Ok(())
    }
}

/// Generates a random seed.
#[must_use]
pub fn random_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Returns a reproducible RNG.
#[must_use]
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}
