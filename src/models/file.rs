use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A file attached to a note.
///
/// The payload is a base64 string passed through untouched; the server never
/// decodes or inspects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteFile {
    pub id: Uuid,
    pub name: String,
    /// Size in bytes as reported by the client.
    pub size: u64,
    /// MIME type as reported by the client.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Base64-encoded contents.
    pub data: String,
    pub is_image: bool,
}

/// A file as sent by a client.
///
/// Every field is optional on the wire; missing values fall back to their
/// empty defaults. `id` is only honoured when a note's whole file list is
/// replaced, so that existing attachments keep their identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteFileInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub data: String,
    pub is_image: bool,
}

impl NoteFileInput {
    /// Materialize the file under the given identifier.
    pub fn into_file(self, id: Uuid) -> NoteFile {
        NoteFile {
            id,
            name: self.name,
            size: self.size,
            mime_type: self.mime_type,
            data: self.data,
            is_image: self.is_image,
        }
    }
}

impl From<NoteFile> for NoteFileInput {
    fn from(file: NoteFile) -> Self {
        Self {
            id: Some(file.id),
            name: file.name,
            size: file.size,
            mime_type: file.mime_type,
            data: file.data,
            is_image: file.is_image,
        }
    }
}

/// Body of the add-file endpoint: `{ "file": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFileInput {
    pub file: NoteFileInput,
}

/// Turn a client-supplied file list into stored files, keeping order.
///
/// Supplied ids are kept unless missing or already used earlier in the list,
/// in which case a fresh one is generated. The result never contains two
/// files with the same id.
pub fn assign_file_ids(inputs: Vec<NoteFileInput>) -> Vec<NoteFile> {
    let mut seen = HashSet::with_capacity(inputs.len());

    inputs
        .into_iter()
        .map(|input| {
            let id = match input.id {
                Some(id) if !seen.contains(&id) => id,
                _ => Uuid::new_v4(),
            };
            seen.insert(id);
            input.into_file(id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, id: Option<Uuid>) -> NoteFileInput {
        NoteFileInput {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn keeps_supplied_ids_and_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let files = assign_file_ids(vec![input("a", Some(a)), input("b", Some(b))]);

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].id, a);
        assert_eq!(files[0].name, "a");
        assert_eq!(files[1].id, b);
        assert_eq!(files[1].name, "b");
    }

    #[test]
    fn generates_ids_for_files_without_one() {
        let files = assign_file_ids(vec![input("a", None), input("b", None)]);

        assert_ne!(files[0].id, files[1].id);
        assert!(!files[0].id.is_nil());
    }

    #[test]
    fn replaces_duplicate_ids() {
        let shared = Uuid::new_v4();

        let files = assign_file_ids(vec![input("a", Some(shared)), input("b", Some(shared))]);

        assert_eq!(files[0].id, shared);
        assert_ne!(files[1].id, shared);
    }

    #[test]
    fn file_type_uses_type_key_on_the_wire() {
        let json = serde_json::json!({
            "name": "cat.png",
            "size": 12,
            "type": "image/png",
            "data": "aGVsbG8=",
            "isImage": true
        });

        let parsed: NoteFileInput = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.mime_type, "image/png");
        assert!(parsed.is_image);
        assert!(parsed.id.is_none());

        let file = parsed.into_file(Uuid::new_v4());
        let out = serde_json::to_value(&file).unwrap();
        assert_eq!(out["type"], "image/png");
        assert_eq!(out["isImage"], true);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: NoteFileInput = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.name, "");
        assert_eq!(parsed.size, 0);
        assert!(!parsed.is_image);
    }
}
