use crate::constants::{DEFAULT_HF_REVISION, HF_BASE_URL};
use crate::error::{PackError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::info;

/// A source reference resolved to a local directory.
///
/// Downloaded and cloned sources live in a temporary directory owned by
/// this value; dropping it releases the directory exactly once, on success
/// and failure paths alike.
#[derive(Debug)]
pub struct ResolvedSource {
    dir: PathBuf,
    _temp: Option<TempDir>,
}

impl ResolvedSource {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn local(dir: PathBuf) -> Self {
        Self { dir, _temp: None }
    }

    fn temporary(temp: TempDir) -> Self {
        Self {
            dir: temp.path().to_path_buf(),
            _temp: Some(temp),
        }
    }
}

/// Resolve a source reference into a local directory tree.
///
/// Supported schemes: bare paths and `file://` (local directory),
/// `http://`/`https://` (single-file download), `hf://org/repo` (full
/// repository snapshot via shallow git clone), and
/// `huggingface://org/repo[@revision]/path` (single file, optionally
/// token-authenticated).
pub fn resolve(source: &str, hf_token: Option<&str>) -> Result<ResolvedSource> {
    let scheme = source.split_once("://").map_or("", |(s, _)| s);
    match scheme {
        "" | "file" => resolve_local(source),
        "http" | "https" => resolve_http(source),
        "hf" => resolve_hf_snapshot(source),
        "huggingface" => resolve_hf_file(source, hf_token),
        other => Err(PackError::Resolve(format!(
            "unsupported source scheme: {other}"
        ))),
    }
}

fn resolve_local(source: &str) -> Result<ResolvedSource> {
    let path = Path::new(source.strip_prefix("file://").unwrap_or(source));
    let abs = path
        .canonicalize()
        .map_err(|e| PackError::Resolve(format!("source directory {}: {e}", path.display())))?;
    if !abs.is_dir() {
        return Err(PackError::Resolve(format!(
            "source must be a directory: {}",
            abs.display()
        )));
    }
    Ok(ResolvedSource::local(abs))
}

fn resolve_http(source: &str) -> Result<ResolvedSource> {
    let file_name = file_name_from_url(source).ok_or_else(|| {
        PackError::Resolve(format!("could not determine filename from URL: {source}"))
    })?;
    download_to_temp(source, &file_name, None)
}

fn resolve_hf_snapshot(source: &str) -> Result<ResolvedSource> {
    let repo = source.trim_start_matches("hf://");
    if repo.is_empty() || repo.contains(' ') || repo.contains("..") {
        return Err(PackError::Resolve(format!("invalid hf repo: {repo:?}")));
    }

    let temp = TempDir::new()?;
    let url = format!("{HF_BASE_URL}/{repo}");
    info!(%url, "cloning repository snapshot");

    let output = Command::new("git")
        .args(["clone", "--depth", "1", &url])
        .arg(temp.path())
        .output()
        .map_err(|e| PackError::Resolve(format!("failed to run git: {e}")))?;
    if !output.status.success() {
        // temp dir is torn down on drop before the error surfaces
        return Err(PackError::Resolve(format!(
            "git clone failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(ResolvedSource::temporary(temp))
}

fn resolve_hf_file(source: &str, token: Option<&str>) -> Result<ResolvedSource> {
    let reference = HfFileRef::parse(source)?;
    let url = format!(
        "{HF_BASE_URL}/{}/{}/resolve/{}/{}",
        reference.namespace, reference.model, reference.revision, reference.path
    );
    let file_name = reference
        .path
        .rsplit('/')
        .next()
        .unwrap_or(&reference.path)
        .to_string();
    download_to_temp(&url, &file_name, token)
}

/// A single-file Hugging Face reference:
/// `huggingface://namespace/model[@revision]/path/to/file`.
#[derive(Debug, PartialEq, Eq)]
struct HfFileRef {
    namespace: String,
    model: String,
    revision: String,
    path: String,
}

impl HfFileRef {
    fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim_start_matches("huggingface://");
        let mut parts = trimmed.splitn(3, '/');
        let namespace = parts.next().unwrap_or_default();
        let model_rev = parts.next().unwrap_or_default();
        let path = parts.next().unwrap_or_default();

        if namespace.is_empty() || model_rev.is_empty() {
            return Err(PackError::Resolve(format!(
                "invalid huggingface source: {source}"
            )));
        }
        if path.is_empty() {
            return Err(PackError::Resolve(format!(
                "huggingface source needs a file path (use hf:// for full snapshots): {source}"
            )));
        }

        let (model, revision) = match model_rev.split_once('@') {
            Some((m, r)) if !r.is_empty() => (m, r),
            _ => (model_rev, DEFAULT_HF_REVISION),
        };
        Ok(Self {
            namespace: namespace.to_string(),
            model: model.to_string(),
            revision: revision.to_string(),
            path: path.to_string(),
        })
    }
}

/// Download a single file into a fresh temp dir whose path becomes the
/// resolved source tree.
fn download_to_temp(url: &str, file_name: &str, token: Option<&str>) -> Result<ResolvedSource> {
    let temp = TempDir::new()?;
    info!(%url, file = %file_name, "downloading source file");

    let client = reqwest::blocking::Client::new();
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let mut response = request.send()?;
    if !response.status().is_success() {
        return Err(PackError::Resolve(format!(
            "download failed: {} ({url})",
            response.status()
        )));
    }

    let mut file = File::create(temp.path().join(file_name))?;
    response.copy_to(&mut file)?;
    Ok(ResolvedSource::temporary(temp))
}

/// Deduce a file name from the path component of a URL.
fn file_name_from_url(url: &str) -> Option<String> {
    let no_fragment = url.split('#').next().unwrap_or(url);
    let no_query = no_fragment.split('?').next().unwrap_or(no_fragment);
    let name = no_query.rsplit('/').next().unwrap_or_default();
    if name.is_empty() || name.contains("://") {
        None
    } else {
        Some(name.to_string())
    }
}
