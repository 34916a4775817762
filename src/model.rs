//! Task document and API-facing representations.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Task document as stored in the `tasks` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub completed: bool,

    pub created_at: DateTime,

    pub updated_at: DateTime,
}

/// Task as rendered by the API: hex object id, RFC 3339 timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<TaskDocument> for Task {
    fn from(doc: TaskDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            title: doc.title,
            description: doc.description,
            completed: doc.completed,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

/// Payload for creating a task
#[derive(Debug, Deserialize)]
pub struct NewTask {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update payload; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct TaskChanges {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: Option<bool>,
}

impl TaskChanges {
    /// True when the payload carries no changes at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> TaskDocument {
        TaskDocument {
            id: ObjectId::new(),
            title: "write release notes".to_string(),
            description: Some("for the 0.1 cut".to_string()),
            completed: false,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    #[test]
    fn api_task_renders_hex_id() {
        let doc = sample_document();
        let hex = doc.id.to_hex();

        let task = Task::from(doc);
        assert_eq!(task.id, hex);
        assert_eq!(task.id.len(), 24);
        assert_eq!(task.title, "write release notes");
        assert!(!task.completed);
    }

    #[test]
    fn document_round_trips_through_bson() {
        let doc = sample_document();
        let bson = mongodb::bson::to_document(&doc).unwrap();
        assert!(bson.contains_key("_id"));
        assert!(bson.contains_key("created_at"));

        let back: TaskDocument = mongodb::bson::from_document(bson).unwrap();
        assert_eq!(back.id, doc.id);
        assert_eq!(back.title, doc.title);
        assert_eq!(back.description, doc.description);
    }

    #[test]
    fn missing_description_deserializes_as_none() {
        let bson = mongodb::bson::doc! {
            "_id": ObjectId::new(),
            "title": "no description",
            "completed": true,
            "created_at": DateTime::now(),
            "updated_at": DateTime::now(),
        };
        let doc: TaskDocument = mongodb::bson::from_document(bson).unwrap();
        assert_eq!(doc.description, None);
        assert!(doc.completed);
    }

    #[test]
    fn empty_changes_detected() {
        let changes: TaskChanges = serde_json::from_str("{}").unwrap();
        assert!(changes.is_empty());

        let changes: TaskChanges = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert!(!changes.is_empty());
        assert_eq!(changes.completed, Some(true));
    }
}
