//! Event records from the remote event log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record of the remote event log.
///
/// Only `id`, `type` and `data` matter to Hardlinker; the payload is kept as
/// opaque JSON and inspected with [`Event::file_target`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic event id. Gaps are possible when the remote buffer overflows.
    pub id: u64,
    /// Id across all event subscriptions.
    #[serde(rename = "globalID", default)]
    pub global_id: u64,
    /// Event type tag, e.g. `ItemFinished`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Emission timestamp as sent by the remote.
    #[serde(default)]
    pub time: Option<String>,
    /// Type-specific payload.
    #[serde(default)]
    pub data: Value,
}

/// The `(folder, item)` pair an event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileTarget {
    /// Folder id.
    pub folder: String,
    /// Item path relative to the folder root.
    pub item: String,
}

impl Event {
    /// Creates an event with the given payload.
    pub fn new(id: u64, kind: impl Into<String>, data: Value) -> Self {
        Self {
            id,
            global_id: id,
            kind: kind.into(),
            time: None,
            data,
        }
    }

    /// Creates an `ItemFinished` event for a successfully synced item.
    pub fn item_finished(id: u64, folder: &str, item: &str) -> Self {
        Self::new(
            id,
            "ItemFinished",
            serde_json::json!({
                "folder": folder,
                "item": item,
                "error": null,
                "type": "file",
                "action": "update",
            }),
        )
    }

    /// Extracts the file this event refers to.
    ///
    /// Returns `None` if the payload reports an error, or lacks a string
    /// `folder` or `item`.
    pub fn file_target(&self) -> Option<FileTarget> {
        let data = self.data.as_object()?;

        if data.get("error").is_some_and(|error| !error.is_null()) {
            return None;
        }

        let folder = data.get("folder")?.as_str()?;
        let item = data.get("item")?.as_str()?;

        Some(FileTarget {
            folder: folder.to_string(),
            item: item.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_item_finished() {
        let raw = r#"{
            "id": 93,
            "globalID": 93,
            "type": "ItemFinished",
            "time": "2024-06-01T12:00:00.000000000+02:00",
            "data": {
                "item": "a/b.txt",
                "folder": "f1",
                "error": null,
                "type": "file",
                "action": "update"
            }
        }"#;
        let event: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(event.id, 93);
        assert_eq!(event.kind, "ItemFinished");
        assert_eq!(
            event.file_target(),
            Some(FileTarget {
                folder: "f1".into(),
                item: "a/b.txt".into()
            })
        );
    }

    #[test]
    fn decode_minimal_event() {
        let event: Event = serde_json::from_str(r#"{"id": 1, "type": "Starting"}"#).unwrap();
        assert_eq!(event.global_id, 0);
        assert!(event.data.is_null());
        assert_eq!(event.file_target(), None);
    }

    #[test]
    fn error_payload_has_no_target() {
        let event = Event::new(
            7,
            "ItemFinished",
            json!({"folder": "f1", "item": "x", "error": "permission denied"}),
        );
        assert_eq!(event.file_target(), None);
    }

    #[test]
    fn missing_folder_or_item_has_no_target() {
        let event = Event::new(8, "ItemFinished", json!({"item": "x"}));
        assert_eq!(event.file_target(), None);

        let event = Event::new(9, "ItemFinished", json!({"folder": "f1"}));
        assert_eq!(event.file_target(), None);

        let event = Event::new(10, "ItemFinished", json!({"folder": 3, "item": "x"}));
        assert_eq!(event.file_target(), None);
    }
}
