//! Backup manifest codec.
//!
//! The manifest is a single JSON document (`backup.json` inside the archive)
//! describing the exported projects plus export metadata. Unknown fields are
//! ignored on decode so newer producers stay readable.
//!
//! Decoding deliberately keeps each project entry as a raw JSON value:
//! import parses entries one at a time, so a single malformed entry fails
//! that one record instead of the whole manifest.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backup::{BackupError, BackupResult};

/// Manifest file name inside the archive (fixed, top level).
pub const MANIFEST_FILE_NAME: &str = "backup.json";

/// Archive subdirectory holding exported images.
pub const IMAGES_DIR_NAME: &str = "images";

/// Manifest format version written by this application.
pub const BACKUP_VERSION: i32 = 1;

/// Export metadata carried alongside the project list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Manifest format version.
    pub version: i32,
    /// Export timestamp, epoch millis.
    pub export_date: i64,
    /// Version string of the producing application.
    pub app_version: String,
    /// Declared number of project entries. Informational only: a mismatch
    /// against the actual list length is logged, never fatal.
    pub project_count: i32,
}

/// The archive-schema representation of a project.
///
/// Identical in shape to the domain record except that `kind` is a
/// lowercase token string and ids are carried verbatim from the exporting
/// device. Image paths here are still the exporter's absolute paths; the
/// archive-relative names are derived during staging, not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortableProject {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub stitch_counter_number: i32,
    pub stitch_adjustment: i32,
    pub row_counter_number: i32,
    pub row_adjustment: i32,
    pub total_rows: i32,
    pub image_paths: Vec<String>,
}

/// A complete manifest, as written at export time.
#[derive(Debug, Clone, Serialize)]
pub struct BackupManifest {
    pub metadata: BackupMetadata,
    pub projects: Vec<PortableProject>,
}

/// A decoded manifest with project entries left as raw JSON.
///
/// Entries are parsed into [`PortableProject`] individually by the import
/// orchestrator so that per-record failures stay isolated.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDocument {
    pub metadata: BackupMetadata,
    #[serde(default)]
    pub projects: Vec<Value>,
}

/// Encode a manifest to its JSON document form.
///
/// # Errors
///
/// Returns `Format` if serialization fails (practically unreachable for
/// these types, but the codec owns its own failure mode).
pub fn encode(manifest: &BackupManifest) -> BackupResult<String> {
    serde_json::to_string(manifest).map_err(|e| BackupError::Format(e.to_string()))
}

/// Decode a manifest document.
///
/// Unknown fields anywhere in the document are ignored. Only structural
/// validity is checked here; semantic validation is the caller's concern.
///
/// # Errors
///
/// Returns `Format` if the text is not a valid manifest document.
pub fn decode(text: &str) -> BackupResult<ManifestDocument> {
    serde_json::from_str(text).map_err(|e| BackupError::Format(format!("manifest: {e}")))
}

/// Best-effort human label for a raw project entry, for failure lists.
///
/// Falls back to placeholders when the entry is too malformed to carry a
/// title or id.
#[must_use]
pub fn project_label(entry: &Value) -> String {
    let title = entry
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("<untitled>");
    let id = entry
        .get("id")
        .and_then(Value::as_i64)
        .map_or_else(|| "?".to_string(), |id| id.to_string());
    format!("{title} (ID: {id})")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> BackupManifest {
        BackupManifest {
            metadata: BackupMetadata {
                version: BACKUP_VERSION,
                export_date: 1_700_000_000_000,
                app_version: "0.1.0".to_string(),
                project_count: 1,
            },
            projects: vec![PortableProject {
                id: 3,
                kind: "double".to_string(),
                title: "Winter Scarf".to_string(),
                stitch_counter_number: 42,
                stitch_adjustment: 2,
                row_counter_number: 7,
                row_adjustment: 1,
                total_rows: 120,
                image_paths: vec!["/data/images/a.jpg".to_string()],
            }],
        }
    }

    #[test]
    fn test_round_trip() {
        let manifest = sample_manifest();
        let text = encode(&manifest).unwrap();

        let doc = decode(&text).unwrap();
        assert_eq!(doc.metadata.version, 1);
        assert_eq!(doc.metadata.project_count, 1);
        assert_eq!(doc.projects.len(), 1);

        let record: PortableProject = serde_json::from_value(doc.projects[0].clone()).unwrap();
        assert_eq!(record, manifest.projects[0]);
    }

    #[test]
    fn test_wire_field_names() {
        let text = encode(&sample_manifest()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        let entry = &value["projects"][0];
        assert_eq!(entry["type"], "double");
        assert_eq!(entry["stitch_counter_number"], 42);
        assert_eq!(entry["row_adjustment"], 1);
        assert_eq!(value["metadata"]["export_date"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let text = r#"{
            "metadata": {
                "version": 1,
                "export_date": 5,
                "app_version": "9.9",
                "project_count": 1,
                "produced_by": "a future release"
            },
            "projects": [{
                "id": 1,
                "type": "single",
                "title": "Dishcloth",
                "stitch_counter_number": 0,
                "stitch_adjustment": 1,
                "row_counter_number": 0,
                "row_adjustment": 1,
                "total_rows": 0,
                "image_paths": [],
                "mood": "optimistic"
            }]
        }"#;

        let doc = decode(text).unwrap();
        let record: PortableProject = serde_json::from_value(doc.projects[0].clone()).unwrap();
        assert_eq!(record.title, "Dishcloth");
    }

    #[test]
    fn test_decode_rejects_invalid_document() {
        assert!(matches!(decode("not json"), Err(BackupError::Format(_))));
        assert!(matches!(decode(r#"{"projects": []}"#), Err(BackupError::Format(_))));
    }

    #[test]
    fn test_malformed_entry_survives_decode() {
        // A bad entry must not fail the manifest; it fails later, alone.
        let text = r#"{
            "metadata": {"version": 1, "export_date": 5, "app_version": "1", "project_count": 2},
            "projects": [
                {"id": 1, "type": "single", "title": "Good", "stitch_counter_number": 0,
                 "stitch_adjustment": 1, "row_counter_number": 0, "row_adjustment": 1,
                 "total_rows": 0, "image_paths": []},
                {"id": 2, "title": "Broken", "stitch_counter_number": "not a number"}
            ]
        }"#;

        let doc = decode(text).unwrap();
        assert_eq!(doc.projects.len(), 2);
        assert!(serde_json::from_value::<PortableProject>(doc.projects[1].clone()).is_err());
    }

    #[test]
    fn test_project_label() {
        let entry: Value = serde_json::from_str(r#"{"title": "Broken", "id": 2}"#).unwrap();
        assert_eq!(project_label(&entry), "Broken (ID: 2)");

        let bare: Value = serde_json::from_str("{}").unwrap();
        assert_eq!(project_label(&bare), "<untitled> (ID: ?)");
    }
}
