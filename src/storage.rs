//! MongoDB-backed task store.
//!
//! The store wraps the official driver's `Client`. Connecting is lazy: the
//! driver opens sockets on first operation, so construction succeeds even
//! when the database is down and each request then fails individually. The
//! startup reachability probe lives in `server::run`, which logs the result
//! without gating the listener on it.

use crate::config::ServiceConfig;
use crate::model::{NewTask, TaskChanges, TaskDocument};
use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use std::time::Duration;

/// Collection holding task documents
const TASKS_COLLECTION: &str = "tasks";

/// Upper bound on server selection so a down database fails requests
/// quickly instead of holding them for the driver's 30s default.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

pub type StorageResult<T> = Result<T, mongodb::error::Error>;

/// Filter for listing tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    /// Only tasks with this completion state
    pub completed: Option<bool>,
    /// Maximum number of tasks to return
    pub limit: i64,
}

/// Handle to the task collection and the owning client.
///
/// Cheap to clone; all clones share one underlying connection pool, so
/// closing any clone closes the pool for all of them.
#[derive(Clone)]
pub struct TaskStore {
    client: Client,
    database: Database,
    tasks: Collection<TaskDocument>,
}

impl TaskStore {
    /// Build a store from configuration. Validates the connection string
    /// but performs no I/O.
    pub async fn connect(config: &ServiceConfig) -> StorageResult<Self> {
        let mut options = ClientOptions::parse(&config.mongo_uri).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        let client = Client::with_options(options)?;
        let database = client.database(&config.mongo_database);
        let tasks = database.collection::<TaskDocument>(TASKS_COLLECTION);

        Ok(Self {
            client,
            database,
            tasks,
        })
    }

    /// Round-trip to the server to check reachability
    pub async fn ping(&self) -> StorageResult<()> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    /// List tasks, newest first
    pub async fn list(&self, filter: TaskFilter) -> StorageResult<Vec<TaskDocument>> {
        let mut query = doc! {};
        if let Some(completed) = filter.completed {
            query.insert("completed", completed);
        }

        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(filter.limit)
            .build();

        let cursor = self.tasks.find(query, options).await?;
        cursor.try_collect().await
    }

    /// Fetch a single task by id
    pub async fn get(&self, id: ObjectId) -> StorageResult<Option<TaskDocument>> {
        self.tasks.find_one(doc! { "_id": id }, None).await
    }

    /// Insert a new task; timestamps are set server-side here, not by the caller
    pub async fn create(&self, new: NewTask) -> StorageResult<TaskDocument> {
        let now = DateTime::now();
        let document = TaskDocument {
            id: ObjectId::new(),
            title: new.title,
            description: new.description,
            completed: false,
            created_at: now,
            updated_at: now,
        };

        self.tasks.insert_one(&document, None).await?;
        Ok(document)
    }

    /// Apply a partial update and return the updated document, or `None`
    /// if no task has this id
    pub async fn update(
        &self,
        id: ObjectId,
        changes: TaskChanges,
    ) -> StorageResult<Option<TaskDocument>> {
        let mut set = doc! { "updated_at": DateTime::now() };
        if let Some(title) = changes.title {
            set.insert("title", title);
        }
        if let Some(description) = changes.description {
            set.insert("description", description);
        }
        if let Some(completed) = changes.completed {
            set.insert("completed", completed);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.tasks
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await
    }

    /// Delete a task by id; returns whether a document was removed
    pub async fn delete(&self, id: ObjectId) -> StorageResult<bool> {
        let result = self.tasks.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    /// Close the client, releasing all pooled connections.
    ///
    /// Consumes the store; in-flight operations on other clones are allowed
    /// to finish before the pool is torn down. This is the storage half of
    /// the shutdown sequence and must only run after the listener has
    /// drained.
    pub async fn close(self) -> StorageResult<()> {
        self.client.shutdown().await;
        Ok(())
    }
}
