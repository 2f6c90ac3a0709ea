use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex, RwLock, RwLockWriteGuard},
    thread::{self, JoinHandle},
};

use log::{error, info};
use rusqlite::Connection;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex as AsyncMutex};

mod helpers;
pub mod models;
mod repositories;
mod schema;

pub use models::{DataRecord, NewRecord, Sentiment, StoreStats};

use schema::ensure_schema;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store used before initialize()")]
    NotInitialized,
    #[error("failed to open record store at {path}: {source}")]
    Init {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to write record store: {0}")]
    Write(#[source] rusqlite::Error),
    #[error("failed to read record store: {0}")]
    Read(#[source] rusqlite::Error),
    #[error("stored row is invalid: {0}")]
    Corrupt(String),
    #[error("sentiment must be between 1 and 5, got {0}")]
    InvalidSentiment(i64),
    #[error("database worker terminated unexpectedly")]
    WorkerGone,
}

impl StoreError {
    fn init(path: &Path, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Init {
            path: path.display().to_string(),
            source: source.into(),
        }
    }
}

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DatabaseInner {
    fn shutdown(&self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle to the record store.
///
/// Constructed unopened; `initialize` opens the SQLite file on a dedicated
/// worker thread. Clones share the same connection, and every call is a
/// serialized request/response pair on that thread.
#[derive(Clone)]
pub struct Database {
    inner: Arc<RwLock<Option<Arc<DatabaseInner>>>>,
    opening: Arc<AsyncMutex<()>>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            opening: Arc::new(AsyncMutex::new(())),
            db_path: Arc::new(db_path),
        }
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub fn is_initialized(&self) -> bool {
        self.current().is_some()
    }

    /// Open the backing file and make sure the records table exists.
    ///
    /// Repeated and concurrent calls share a single open; after `close`
    /// the file is opened again.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        let _opening = self.opening.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        let inner = spawn_worker(self.db_path.clone()).await?;
        *self.slot_mut() = Some(inner);
        Ok(())
    }

    /// Stop the worker thread. Later calls fail with `NotInitialized` until
    /// the next `initialize`.
    pub fn close(&self) {
        let taken = self.slot_mut().take();
        if let Some(inner) = taken {
            inner.shutdown();
            info!("Record store at {} closed", self.db_path.display());
        }
    }

    fn current(&self) -> Option<Arc<DatabaseInner>> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn slot_mut(&self) -> RwLockWriteGuard<'_, Option<Arc<DatabaseInner>>> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.current().ok_or(StoreError::NotInitialized)?;
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        inner
            .sender
            .send(command)
            .map_err(|_| StoreError::NotInitialized)?;

        reply_rx.await.map_err(|_| StoreError::WorkerGone)?
    }
}

async fn spawn_worker(db_path: Arc<PathBuf>) -> Result<Arc<DatabaseInner>, StoreError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| StoreError::init(&db_path, err))?;
        }
    }

    let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
    let (ready_tx, ready_rx) = oneshot::channel::<Result<(), StoreError>>();
    let path_for_thread = db_path.clone();

    let worker = thread::Builder::new()
        .name("dailylog-db".into())
        .spawn(move || {
            let mut conn = match Connection::open(path_for_thread.as_path()) {
                Ok(connection) => connection,
                Err(err) => {
                    let _ = ready_tx.send(Err(StoreError::init(&path_for_thread, err)));
                    return;
                }
            };

            if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                error!("Failed to enable WAL mode: {err}");
            }

            let init_result =
                ensure_schema(&mut conn).map_err(|err| StoreError::init(&path_for_thread, err));
            let ready = init_result.is_ok();
            if ready_tx.send(init_result).is_err() || !ready {
                return;
            }

            while let Ok(command) = command_rx.recv() {
                match command {
                    DbCommand::Execute(task) => task(&mut conn),
                    DbCommand::Shutdown => break,
                }
            }

            info!("Database thread shutting down");
        })
        .map_err(|err| StoreError::init(&db_path, err))?;

    let ready = ready_rx.await.map_err(|_| StoreError::WorkerGone);
    if let Err(err) = ready.and_then(|result| result) {
        let _ = worker.join();
        return Err(err);
    }

    info!("Record store initialized at {}", db_path.display());

    Ok(Arc::new(DatabaseInner {
        sender: command_tx,
        worker: Mutex::new(Some(worker)),
    }))
}
