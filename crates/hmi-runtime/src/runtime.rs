//! The middleware process: hub, dashboard session and background tasks.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hmi_hub::{DistributionHub, HubConnection, LocalConnection, SubscriberSession};
use hmi_types::CandidateEnvelope;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::RuntimeConfig;
use crate::producer::SimulatedProducer;

/// Owns the hub and everything running against it.
pub struct MiddlewareRuntime {
    config: RuntimeConfig,
    hub: Arc<DistributionHub>,
    session: Arc<SubscriberSession>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl MiddlewareRuntime {
    /// Build the hub with the default schema and an unconnected dashboard session.
    ///
    /// The dashboard follows every type id, so categories a later schema file
    /// adds reach it without rebuilding the session.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let hub = Arc::new(
            DistributionHub::with_default_schema().context("Built-in schema rejected")?,
        );
        let connection: Arc<dyn HubConnection> = Arc::new(LocalConnection::new(Arc::clone(&hub)));
        let session = Arc::new(SubscriberSession::new(connection, hub.schema(), Vec::new()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            hub,
            session,
            tasks: Vec::new(),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Apply the schema file, register the session and start background tasks.
    pub async fn start(&mut self) -> Result<()> {
        info!("===========================================");
        info!("  HMI Middleware Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        if let Some(path) = self.config.schema_file.clone() {
            self.load_schema_file(&path).await;
        }

        self.session
            .connect()
            .context("Failed to register dashboard session")?;

        if self.config.inject_diagnostic {
            match self.session.inject(CandidateEnvelope::diagnostic()) {
                Ok(envelope) => info!(
                    sequence_id = envelope.sequence_id(),
                    type_id = envelope.type_id(),
                    "Diagnostic envelope injected"
                ),
                Err(e) => error!(error = %e, "Diagnostic injection failed"),
            }
        }

        let producer = SimulatedProducer::new();
        self.tasks.push(tokio::spawn(producer.run(
            Arc::clone(&self.hub),
            self.config.producer_interval,
            self.shutdown_rx.clone(),
        )));

        self.tasks.push(tokio::spawn(log_view_periodically(
            Arc::clone(&self.session),
            self.config.view_log_interval(),
            self.shutdown_rx.clone(),
        )));

        info!(
            generation = self.hub.schema().generation_number(),
            subscribers = self.hub.subscriber_count(),
            "Middleware started"
        );
        Ok(())
    }

    /// A missing or rejected file is logged; the defaults keep serving.
    async fn load_schema_file(&self, path: &Path) {
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read schema file, keeping defaults");
                return;
            }
        };

        match self.hub.reload_schema(&source) {
            Ok(generation) => info!(path = %path.display(), generation, "Schema file applied"),
            Err(e) => warn!(path = %path.display(), error = %e, "Schema file rejected, keeping defaults"),
        }
    }

    /// Stop background tasks and unregister the session.
    pub async fn shutdown(mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!(error = %e, "Failed to send shutdown signal");
        }

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!(error = %e, "Background task ended abnormally");
            }
        }

        self.session.disconnect();
        info!(
            envelopes = self.hub.envelopes_published(),
            deliveries = self.session.deliveries(),
            "Shutdown complete"
        );
    }

    #[must_use]
    pub fn hub(&self) -> Arc<DistributionHub> {
        Arc::clone(&self.hub)
    }

    #[must_use]
    pub fn session(&self) -> Arc<SubscriberSession> {
        Arc::clone(&self.session)
    }
}

async fn log_view_periodically(
    session: Arc<SubscriberSession>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => log_view(&session),
            _ = shutdown.changed() => break,
        }
    }
}

fn log_view(session: &SubscriberSession) {
    for (type_id, envelope) in session.view() {
        let rendered = session.render(type_id);
        info!(
            type_id,
            sequence_id = envelope.sequence_id(),
            view = ?rendered,
            "Dashboard view"
        );
    }
}
