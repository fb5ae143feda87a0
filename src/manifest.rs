use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{PackError, Result};
use crate::mediatype::MEDIA_TYPE_OCI_MANIFEST;

pub const SCHEMA_VERSION: u32 = 2;

// Index annotation keys (OCI standard).
pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";
pub const ANNOTATION_REF_NAME: &str = "org.opencontainers.image.ref.name";
pub const ANNOTATION_CREATED: &str = "org.opencontainers.image.created";
pub const ANNOTATION_DESCRIPTION: &str = "org.opencontainers.image.description";

// Layer annotation keys (ModelPack conventions).
pub const ANNOTATION_FILEPATH: &str = "org.cncf.model.filepath";
pub const ANNOTATION_FILE_METADATA: &str = "org.cncf.model.file.metadata+json";
pub const ANNOTATION_MEDIATYPE_UNTESTED: &str = "org.cncf.model.file.mediatype.untested";

/// A content-addressable descriptor used in both manifests and indexes.
/// Two descriptors with equal digest always point at byte-identical blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,

    pub digest: String,

    pub size: u64,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl Descriptor {
    pub fn new(media_type: impl Into<String>, hex_digest: &str, size: u64) -> Self {
        Self {
            media_type: media_type.into(),
            digest: format!("sha256:{hex_digest}"),
            size,
            annotations: None,
        }
    }

    /// Hex part of the digest, without the algorithm prefix.
    pub fn encoded_digest(&self) -> &str {
        self.digest.strip_prefix("sha256:").unwrap_or(&self.digest)
    }
}

/// Single artifact metadata document listing its config and layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,

    #[serde(rename = "mediaType")]
    pub media_type: String,

    #[serde(rename = "artifactType")]
    pub artifact_type: String,

    pub config: Descriptor,

    pub layers: Vec<Descriptor>,
}

/// Top-level document listing manifests with tagging annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,

    #[serde(rename = "mediaType")]
    pub media_type: String,

    pub manifests: Vec<Descriptor>,
}

/// Per-layer file metadata carried in the metadata+json annotation. Owner,
/// mode, and mtime are pinned so the block is a pure function of file
/// content and relative path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: String,
    pub typeflag: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub files: Option<u64>,
}

const EPOCH_RFC3339: &str = "1970-01-01T00:00:00Z";
const PINNED_MODE: u32 = 420; // 0o644

impl FileMetadata {
    /// Metadata for a single regular file.
    pub fn regular(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            mode: PINNED_MODE,
            uid: 0,
            gid: 0,
            size,
            mtime: EPOCH_RFC3339.to_string(),
            typeflag: 0,
            files: None,
        }
    }

    /// Metadata for an aggregate category archive: total uncompressed size
    /// plus the file count.
    pub fn aggregate(label: &str, total_size: u64, file_count: u64) -> Self {
        Self {
            files: Some(file_count),
            ..Self::regular(label, total_size)
        }
    }
}

/// Build the annotation map attached to a layer descriptor.
pub fn layer_annotations(filepath: &str, metadata: &FileMetadata) -> Result<BTreeMap<String, String>> {
    let mut annotations = BTreeMap::new();
    annotations.insert(ANNOTATION_FILEPATH.to_string(), filepath.to_string());
    annotations.insert(
        ANNOTATION_FILE_METADATA.to_string(),
        serde_json::to_string(metadata)?,
    );
    annotations.insert(
        ANNOTATION_MEDIATYPE_UNTESTED.to_string(),
        "true".to_string(),
    );
    Ok(annotations)
}

/// Sanity-check a serialized manifest before it is committed as a blob.
/// A failure here is a template defect, not an environment fault.
pub fn validate_manifest_json(json: &str) -> Result<()> {
    if !json.starts_with('{') {
        return Err(PackError::InvalidManifest(
            "serialized manifest does not start with '{'".to_string(),
        ));
    }
    if !json.contains("\"schemaVersion\": 2") {
        return Err(PackError::InvalidManifest(
            "manifest does not declare schemaVersion 2".to_string(),
        ));
    }
    if !json.contains(MEDIA_TYPE_OCI_MANIFEST) {
        return Err(PackError::InvalidManifest(format!(
            "manifest does not declare media type {MEDIA_TYPE_OCI_MANIFEST}"
        )));
    }
    Ok(())
}
