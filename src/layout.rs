use crate::digest;
use crate::error::Result;
use crate::manifest::Index;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Exact bytes of the `oci-layout` schema marker.
pub const OCI_LAYOUT_MARKER: &str = "{\"imageLayoutVersion\":\"1.0.0\"}";

/// An on-disk OCI layout directory: `oci-layout`, `index.json`, and a
/// `blobs/sha256` content-addressed store.
///
/// Blobs are staged inside the store and renamed to their digest once
/// hashed, so a committed blob name always matches its content. Identical
/// content written twice lands on the same name.
pub struct Layout {
    root: PathBuf,
    blobs_dir: PathBuf,
}

impl Layout {
    /// Create the layout directory structure and write the schema marker.
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let blobs_dir = root.join("blobs").join("sha256");
        fs::create_dir_all(&blobs_dir)?;
        fs::write(root.join("oci-layout"), OCI_LAYOUT_MARKER)?;
        Ok(Self { root, blobs_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blob_path(&self, hex_digest: &str) -> PathBuf {
        self.blobs_dir.join(hex_digest)
    }

    pub fn has_blob(&self, hex_digest: &str) -> bool {
        self.blob_path(hex_digest).is_file()
    }

    /// Path for an in-progress blob inside the store, so the final rename
    /// never crosses a filesystem boundary.
    pub fn staging_path(&self, name: &str) -> PathBuf {
        self.blobs_dir.join(name)
    }

    /// Hash a finished staging file and move it to its digest name.
    /// Returns the hex digest and the byte length as written.
    pub fn commit_staged(&self, staged: &Path) -> Result<(String, u64)> {
        let mut file = File::open(staged)?;
        let (hex, size) = digest::sha256_reader(&mut file)?;
        drop(file);
        fs::rename(staged, self.blob_path(&hex))?;
        Ok((hex, size))
    }

    /// Write an in-memory blob directly under its digest name.
    pub fn write_blob(&self, bytes: &[u8]) -> Result<(String, u64)> {
        let hex = digest::sha256_bytes(bytes);
        fs::write(self.blob_path(&hex), bytes)?;
        Ok((hex, bytes.len() as u64))
    }

    pub fn write_index(&self, index: &Index) -> Result<()> {
        fs::write(
            self.root.join("index.json"),
            serde_json::to_string_pretty(index)?,
        )?;
        Ok(())
    }
}
