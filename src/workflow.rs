//! The download-persist-expire workflow
//!
//! [`TicketDownloader`] ties the pieces together: the executor resolves and
//! downloads a reference, the ticket store publishes the result, and the
//! expiration scheduler removes the file once the retention window passes.

use crate::config::Config;
use crate::engine::{ExtractionEngine, engine_for};
use crate::error::{Error, Result};
use crate::executor::DownloadExecutor;
use crate::expiration::{self, ExpirationScheduler};
use crate::search::{SearchProvider, provider_for};
use crate::tickets::{self, SqliteTicketStore, TicketStore};
use crate::types::{DownloadOutcome, DownloadResult, Event, TicketId, TicketRecord, TicketStatus};
use crate::utils::prepare_media_root;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Buffer size of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Resolves references to audio files and publishes them under tickets
///
/// Cloning is cheap; every clone drives the same executor, store and
/// expiration scheduler.
///
/// # Examples
///
/// ```no_run
/// use ticket_dl::{Config, TicketDownloader, TicketId};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = TicketDownloader::new(Config::default()).await?;
///
///     if let Some(result) = downloader.run("lofi beats", TicketId::new("t1")).await? {
///         println!("{} ({})", result.path.display(), result.size);
///     }
///
///     downloader.shutdown().await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct TicketDownloader {
    config: Arc<Config>,
    executor: Arc<DownloadExecutor>,
    store: Arc<dyn TicketStore>,
    expiration: ExpirationScheduler,
    event_tx: broadcast::Sender<Event>,
    accepting_new: Arc<AtomicBool>,
    tasks: TaskTracker,
}

impl TicketDownloader {
    /// Build a downloader from configuration
    ///
    /// Discovers the engine executable, picks the matching search provider and
    /// opens the SQLite ticket store at `persistence.database_path`.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let engine = engine_for(&config.engine);
        let search = provider_for(&config, engine.kind())?;
        let store = SqliteTicketStore::new(
            &config.persistence.database_path,
            config.persistence.ticket_ttl,
        )
        .await?;

        Self::with_components(config, engine, search, Arc::new(store)).await
    }

    /// Build a downloader around caller-supplied components
    pub async fn with_components(
        mut config: Config,
        engine: Arc<dyn ExtractionEngine>,
        search: Arc<dyn SearchProvider>,
        store: Arc<dyn TicketStore>,
    ) -> Result<Self> {
        config.validate()?;
        config.download.media_root = prepare_media_root(config.media_root()).await?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let executor = DownloadExecutor::new(
            engine,
            search,
            config.download.media_root.clone(),
            config.download.clone(),
            config.fallback.max_search_retries,
        )
        .with_events(event_tx.clone());
        let expiration = ExpirationScheduler::with_events(event_tx.clone());

        tracing::info!(
            media_root = %config.download.media_root.display(),
            engine = executor.engine().name(),
            search = executor.search().name(),
            store = store.name(),
            retention_secs = config.expiration.retention.as_secs(),
            "Ticket downloader initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            executor: Arc::new(executor),
            store,
            expiration,
            event_tx,
            accepting_new: Arc::new(AtomicBool::new(true)),
            tasks: TaskTracker::new(),
        })
    }

    /// Download `reference` and publish the result under `ticket`
    ///
    /// Returns the downloaded file, or `None` when the reference could not be
    /// resolved (no search match, fallback exhausted). On success the ticket
    /// holds `{path, name}` and the file is scheduled for deletion after
    /// `expiration.retention`.
    ///
    /// # Errors
    ///
    /// [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has begun;
    /// otherwise only failures unrelated to the reference itself (engine
    /// missing, search transport, ticket store).
    pub async fn run(
        &self,
        reference: &str,
        ticket: impl Into<TicketId>,
    ) -> Result<Option<DownloadResult>> {
        // Taken before the check so shutdown either rejects or waits for us
        let _in_flight = self.tasks.token();
        self.ensure_accepting()?;
        let ticket = ticket.into();
        self.emit_event(Event::Submitted {
            ticket: ticket.clone(),
            reference: reference.to_string(),
        });
        self.execute(reference, &ticket).await
    }

    /// Start the workflow in the background and return immediately
    ///
    /// A `pending` record is written before this returns (when status records
    /// are enabled), so a caller polling [`ticket`](Self::ticket) never sees an
    /// unknown ticket for a submitted download.
    pub async fn submit(
        &self,
        reference: &str,
        ticket: impl Into<TicketId>,
    ) -> Result<JoinHandle<Result<Option<DownloadResult>>>> {
        let _in_flight = self.tasks.token();
        self.ensure_accepting()?;
        let ticket = ticket.into();

        if self.config.tickets.record_status {
            self.write_record(&ticket, &TicketRecord::pending()).await?;
        }
        self.emit_event(Event::Submitted {
            ticket: ticket.clone(),
            reference: reference.to_string(),
        });

        let this = self.clone();
        let reference = reference.to_string();
        Ok(self
            .tasks
            .spawn(async move { this.execute(&reference, &ticket).await }))
    }

    /// Current record for `ticket`, if any
    pub async fn ticket(&self, ticket: &TicketId) -> Result<Option<TicketRecord>> {
        self.store.get(ticket).await
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    ///
    /// The media root in the returned config is already absolute.
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Scheduler holding the pending file deletions
    pub fn expiration(&self) -> &ExpirationScheduler {
        &self.expiration
    }

    /// Gracefully shut down the downloader
    ///
    /// Stops accepting work, waits for running workflows to finish, settles
    /// pending expirations per `expiration.on_shutdown` and closes the store.
    /// In-flight downloads are never cancelled.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new downloads");

        self.tasks.close();
        self.tasks.wait().await;
        tracing::info!("Running downloads finished");

        self.expiration
            .shutdown(self.config.expiration.on_shutdown)
            .await;

        self.emit_event(Event::Shutdown);
        self.store.close().await;

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    async fn execute(&self, reference: &str, ticket: &TicketId) -> Result<Option<DownloadResult>> {
        let outcome = match self.executor.download_for(reference, Some(ticket)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(ticket = %ticket, reference, error = %e, "Download failed");
                if let Err(record_err) = self.record_failure(ticket, &e.to_string()).await {
                    tracing::warn!(ticket = %ticket, error = %record_err, "Failed to record ticket failure");
                }
                return Err(e);
            }
        };

        match outcome {
            DownloadOutcome::Completed { result, source } => {
                self.emit_event(Event::Downloaded {
                    ticket: ticket.clone(),
                    source,
                    result: result.clone(),
                });

                if let Err(e) = tickets::persist(self.store.as_ref(), ticket, &result).await {
                    tracing::error!(
                        ticket = %ticket,
                        path = %result.path.display(),
                        error = %e,
                        "Failed to publish ticket, discarding download"
                    );
                    expiration::remove(&result.path).await;
                    if let Err(record_err) = self.record_failure(ticket, &e.to_string()).await {
                        tracing::warn!(ticket = %ticket, error = %record_err, "Failed to record ticket failure");
                    }
                    return Err(e);
                }
                self.emit_event(Event::TicketWritten {
                    ticket: ticket.clone(),
                    status: TicketStatus::Ready,
                });

                self.expiration
                    .schedule(result.path.clone(), self.config.expiration.retention);

                tracing::info!(
                    ticket = %ticket,
                    path = %result.path.display(),
                    name = %result.name,
                    "Ticket ready"
                );
                Ok(Some(result))
            }
            other => {
                let reason = other
                    .failure_reason()
                    .unwrap_or_else(|| "download did not complete".to_string());
                tracing::info!(ticket = %ticket, reference, reason = %reason, "Download gave up");
                self.record_failure(ticket, &reason).await?;
                Ok(None)
            }
        }
    }

    /// Write a `failed` record (if enabled) and report the failure
    async fn record_failure(&self, ticket: &TicketId, reason: &str) -> Result<()> {
        self.emit_event(Event::Failed {
            ticket: ticket.clone(),
            error: reason.to_string(),
        });
        if self.config.tickets.record_status {
            self.write_record(ticket, &TicketRecord::failed(reason))
                .await?;
        }
        Ok(())
    }

    async fn write_record(&self, ticket: &TicketId, record: &TicketRecord) -> Result<()> {
        self.store.set(ticket, record).await?;
        self.emit_event(Event::TicketWritten {
            ticket: ticket.clone(),
            status: record.status,
        });
        Ok(())
    }

    fn ensure_accepting(&self) -> Result<()> {
        if self.accepting_new.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::ShuttingDown)
        }
    }

    /// Emit an event to all subscribers
    ///
    /// Send fails only when nobody is subscribed, which is fine.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

impl std::fmt::Debug for TicketDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketDownloader")
            .field("executor", &self.executor)
            .field("store", &self.store.name())
            .field("pending_expirations", &self.expiration.pending())
            .finish()
    }
}
