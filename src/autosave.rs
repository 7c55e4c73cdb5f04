// src/autosave.rs - Blog draft autosave
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::{DeckError, FormHandle, Result, SlotBackend, DRAFT_SLOT};

/// Unsubmitted state of the blog form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub featured_image: String,
}

impl Draft {
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
            && self.content.trim().is_empty()
            && self.featured_image.trim().is_empty()
    }
}

/// The single draft slot.
#[derive(Clone)]
pub struct DraftSlot {
    backend: Arc<dyn SlotBackend>,
}

impl DraftSlot {
    pub fn new(backend: Arc<dyn SlotBackend>) -> Self {
        Self { backend }
    }

    /// The stored draft; unreadable text is treated as no draft.
    pub fn load(&self) -> Result<Option<Draft>> {
        let Some(text) = self.backend.read(DRAFT_SLOT)? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(draft) => Ok(Some(draft)),
            Err(e) => {
                warn!("Ignoring malformed blog draft: {}", e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, draft: &Draft) -> Result<()> {
        self.backend.write(DRAFT_SLOT, &serde_json::to_string(draft)?)?;
        debug!("Draft saved ({} characters of content)", draft.content.len());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.remove(DRAFT_SLOT)
    }
}

#[derive(Debug, Clone)]
pub struct AutosaveStatus {
    /// Whether the autosave task is running
    pub is_running: bool,
    /// The time of the last autosave
    pub last_saved: Option<DateTime<Utc>>,
    /// Number of autosaves since start
    pub saves: u64,
}

#[derive(Debug, Clone)]
pub enum AutosaveCommand {
    /// Snapshot the form immediately
    SaveNow,
    /// Stop the autosave task
    Stop,
}

/// Periodically snapshots the blog form into the draft slot.
///
/// At most one autosave task exists per `DraftAutosaver`; starting again
/// stops the previous task first.
pub struct DraftAutosaver {
    /// Time between snapshots
    interval: Duration,

    /// Slot receiving the snapshots
    drafts: DraftSlot,

    /// Form being snapshotted
    form: FormHandle,

    /// Channel to send commands to the autosave task
    command_tx: Option<mpsc::Sender<AutosaveCommand>>,

    /// Handle to the autosave task
    task: Option<JoinHandle<()>>,

    /// Status shared with the autosave task
    status: Arc<Mutex<AutosaveStatus>>,
}

impl DraftAutosaver {
    pub fn new(interval: Duration, drafts: DraftSlot, form: FormHandle) -> Self {
        info!("Initializing draft autosave every {:?}", interval);
        Self {
            interval,
            drafts,
            form,
            command_tx: None,
            task: None,
            status: Arc::new(Mutex::new(AutosaveStatus {
                is_running: false,
                last_saved: None,
                saves: 0,
            })),
        }
    }

    /// Starts autosaving, replacing any task already running.
    pub async fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            debug!("Autosave already running, restarting");
            self.stop().await?;
        }

        if self.interval.is_zero() {
            return Err(DeckError::ConfigError {
                message: "Autosave interval must be greater than zero".to_string(),
            });
        }

        let (command_tx, mut command_rx) = mpsc::channel(10);
        self.command_tx = Some(command_tx);

        let drafts = self.drafts.clone();
        let form = Arc::clone(&self.form);
        let status = Arc::clone(&self.status);
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // Initial tick

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        snapshot(&drafts, &form, &status).await;
                    }
                    cmd = command_rx.recv() => match cmd {
                        Some(AutosaveCommand::SaveNow) => {
                            snapshot(&drafts, &form, &status).await;
                        }
                        Some(AutosaveCommand::Stop) | None => {
                            debug!("Draft autosave stopping...");
                            break;
                        }
                    }
                }
            }
        });

        self.task = Some(task);
        self.status.lock().await.is_running = true;
        info!("Draft autosave started");
        Ok(())
    }

    /// Stops the autosave task if it's running.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            debug!("Draft autosave is not running");
            return Ok(());
        };

        if let Some(command_tx) = self.command_tx.take() {
            if let Err(e) = command_tx.send(AutosaveCommand::Stop).await {
                error!("Failed to send stop command to draft autosave: {}", e);
            }
        }

        if let Err(e) = task.await {
            let error_mgs = format!("Failed to stop draft autosave: {}", e);
            error!("{}", error_mgs);
            return Err(DeckError::ApplicationError { message: error_mgs });
        }

        self.status.lock().await.is_running = false;
        info!("Draft autosave stopped");
        Ok(())
    }

    /// Asks the running task for an immediate snapshot.
    pub async fn save_now(&self) -> Result<()> {
        let command_tx = self
            .command_tx
            .as_ref()
            .ok_or_else(|| DeckError::ApplicationError {
                message: "Draft autosave is not running".to_string(),
            })?;

        command_tx
            .send(AutosaveCommand::SaveNow)
            .await
            .map_err(|e| DeckError::ApplicationError {
                message: format!("Failed to send autosave command: {}", e),
            })
    }

    pub async fn status(&self) -> AutosaveStatus {
        self.status.lock().await.clone()
    }
}

impl Drop for DraftAutosaver {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn snapshot(drafts: &DraftSlot, form: &FormHandle, status: &Arc<Mutex<AutosaveStatus>>) {
    let draft = match form.lock() {
        Ok(form) => form.to_draft(),
        Err(_) => {
            error!("Failed to acquire lock on blog form for autosave");
            return;
        }
    };

    match drafts.save(&draft) {
        Ok(()) => {
            let mut status = status.lock().await;
            status.last_saved = Some(Utc::now());
            status.saves += 1;
        }
        Err(e) => error!("Draft autosave failed: {}", e),
    }
}
