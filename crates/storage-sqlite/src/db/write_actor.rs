//! Single-writer actor serializing all SQLite writes.
//!
//! SQLite allows one writer at a time. Instead of letting pool connections
//! contend on the write lock, every mutation is shipped to one background
//! task that owns a dedicated connection and runs each job inside
//! `BEGIN IMMEDIATE`, so a job sees the write lock from its first statement.

use super::DbPool;
use crate::errors::StorageError;
use diesel::SqliteConnection;
use florin_core::errors::Result;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

// Jobs are boxed closures; Box<dyn Any> erases each job's return type so one
// channel can carry them all.
type WriteJob<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedResult = Box<dyn Any + Send + 'static>;

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    #[allow(clippy::type_complexity)]
    tx: mpsc::Sender<(WriteJob<ErasedResult>, oneshot::Sender<Result<ErasedResult>>)>,
}

impl WriteHandle {
    /// Runs `job` on the writer's connection, inside an immediate transaction.
    ///
    /// Returning `Err` from the job rolls the whole transaction back.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as ErasedResult)),
                ret_tx,
            ))
            .await
            .expect("writer actor channel closed; the actor task has stopped");

        ret_rx
            .await
            .expect("writer actor dropped a reply sender without responding")
            .map(|boxed: ErasedResult| {
                *boxed
                    .downcast::<T>()
                    .unwrap_or_else(|_| panic!("writer actor returned an unexpected type"))
            })
    }
}

/// Spawns the writer task, which holds one pooled connection for its lifetime
/// and processes jobs strictly in arrival order.
pub fn spawn_writer(pool: Arc<DbPool>) -> WriteHandle {
    let (tx, mut rx) =
        mpsc::channel::<(WriteJob<ErasedResult>, oneshot::Sender<Result<ErasedResult>>)>(1024);

    tokio::spawn(async move {
        let mut conn = pool
            .get()
            .expect("no connection available for the writer actor");

        while let Some((job, reply_tx)) = rx.recv().await {
            // StorageError implements From<diesel::result::Error>, which the
            // transaction wrapper needs; convert back at the boundary.
            let result: Result<ErasedResult> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // A dropped receiver just means the caller gave up waiting.
            let _ = reply_tx.send(result);
        }
        // Channel drained and all handles dropped; nothing left to do.
    });

    WriteHandle { tx }
}
