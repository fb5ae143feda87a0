use crate::classify::{self, Category};
use crate::error::{PackError, Result};
use crate::ignore::IgnoreRules;
use crate::layer;
use crate::layout::Layout;
use crate::manifest::{
    validate_manifest_json, Descriptor, Index, Manifest, ANNOTATION_CREATED,
    ANNOTATION_DESCRIPTION, ANNOTATION_REF_NAME, ANNOTATION_TITLE, SCHEMA_VERSION,
};
use crate::mediatype;
use crate::source;
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// How files within a category are grouped into blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackMode {
    Raw,
    Tar,
    TarGzip,
    TarZstd,
}

impl PackMode {
    /// Media-type suffix; doubles as the wire name of the mode.
    pub fn suffix(&self) -> &'static str {
        match self {
            PackMode::Raw => "raw",
            PackMode::Tar => "tar",
            PackMode::TarGzip => "tar+gzip",
            PackMode::TarZstd => "tar+zstd",
        }
    }
}

impl FromStr for PackMode {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(PackMode::Raw),
            "tar" => Ok(PackMode::Tar),
            "tar+gzip" => Ok(PackMode::TarGzip),
            "tar+zstd" => Ok(PackMode::TarZstd),
            other => Err(PackError::Config(format!("unknown pack mode: {other}"))),
        }
    }
}

/// Which artifact spec the layout follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecKind {
    #[default]
    ModelPack,
    Generic,
}

impl SpecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecKind::ModelPack => "modelpack",
            SpecKind::Generic => "generic",
        }
    }
}

impl FromStr for SpecKind {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "modelpack" => Ok(SpecKind::ModelPack),
            "generic" => Ok(SpecKind::Generic),
            other => Err(PackError::Config(format!("unknown spec: {other}"))),
        }
    }
}

/// Optional media-type overrides. Empty fields fall back to the spec
/// defaults; a set field is carried into the manifest verbatim.
#[derive(Debug, Clone, Default)]
pub struct MediaTypeOverrides {
    pub manifest_config: Option<String>,
    pub weights: Option<String>,
    pub config: Option<String>,
    pub docs: Option<String>,
}

/// Configuration for one packaging run.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Local path, file://, http(s)://, hf://, or huggingface:// reference.
    pub source: String,
    /// Directory the OCI layout is written into. Created if absent.
    pub output_dir: PathBuf,
    pub mode: PackMode,
    pub spec: SpecKind,
    /// Human-friendly name carried as the index title annotation.
    pub name: Option<String>,
    /// Overrides the manifest artifactType.
    pub artifact_type: Option<String>,
    pub media_types: MediaTypeOverrides,
    /// Bearer token for huggingface:// single-file downloads.
    pub hf_token: Option<String>,
    /// Extra glob patterns excluded from the walked tree.
    pub exclude: Vec<String>,
}

impl PackOptions {
    pub fn new(source: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output_dir: output_dir.into(),
            mode: PackMode::Raw,
            spec: SpecKind::ModelPack,
            name: None,
            artifact_type: None,
            media_types: MediaTypeOverrides::default(),
            hf_token: None,
            exclude: Vec::new(),
        }
    }
}

/// Result of a successful packaging run.
#[derive(Debug)]
pub struct PackSummary {
    pub layout_path: PathBuf,
    pub manifest_digest: String,
    pub layer_count: usize,
    /// Total bytes committed to the blob store (layers + config + manifest).
    pub blob_bytes: u64,
}

const FALLBACK_TITLE: &str = "aikitmodel";
const UNTAGGED_REF: &str = "latest";
const EMPTY_REF_NAME: &str = "aikit/model";

/// Normalize a free-form title into an OCI-safe reference: ASCII letters
/// lower-cased, digits and `/ . _ -` passed through, everything else
/// mapped to `-`.
pub fn safe_ref_name(name: &str) -> String {
    if name.is_empty() {
        return EMPTY_REF_NAME.to_string();
    }
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '/' | '.' | '_' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect()
}

/// Resolve the source reference and package it into an OCI layout.
///
/// Runs are stateless: packaging the same tree twice yields identical blob
/// digests. Concurrent runs against the same output directory are not
/// coordinated; callers must serialize or use distinct directories.
pub fn pack(opts: &PackOptions) -> Result<PackSummary> {
    if opts.source.trim().is_empty() {
        return Err(PackError::Config("source is required".to_string()));
    }
    if opts.output_dir.as_os_str().is_empty() {
        return Err(PackError::Config("output directory is required".to_string()));
    }

    let resolved = source::resolve(&opts.source, opts.hf_token.as_deref())?;
    pack_resolved(resolved.dir(), opts)
}

/// Package an already-resolved local directory. Entry point for callers
/// that hold the source tree themselves.
pub fn pack_resolved(src_dir: &Path, opts: &PackOptions) -> Result<PackSummary> {
    if opts.output_dir.as_os_str().is_empty() {
        return Err(PackError::Config("output directory is required".to_string()));
    }

    let ignore = IgnoreRules::defaults_with(&opts.exclude);
    let layout = Layout::create(&opts.output_dir)?;

    let (layers, config_media_type, artifact_type) = match opts.spec {
        SpecKind::ModelPack => (
            build_modelpack_layers(&layout, src_dir, opts, &ignore)?,
            opts.media_types
                .manifest_config
                .clone()
                .unwrap_or_else(|| mediatype::MEDIA_TYPE_MODEL_CONFIG.to_string()),
            opts.artifact_type
                .clone()
                .unwrap_or_else(|| mediatype::ARTIFACT_TYPE_MODEL.to_string()),
        ),
        SpecKind::Generic => (
            build_generic_layers(&layout, src_dir, opts, &ignore)?,
            opts.media_types
                .manifest_config
                .clone()
                .unwrap_or_else(|| mediatype::MEDIA_TYPE_EMPTY_CONFIG.to_string()),
            opts.artifact_type
                .clone()
                .unwrap_or_else(|| mediatype::ARTIFACT_TYPE_GENERIC.to_string()),
        ),
    };

    let layer_count = layers.len();
    let layer_bytes: u64 = layers.iter().map(|l| l.size).sum();

    // Empty-object config blob
    let (config_hex, config_size) = layout.write_blob(b"{}")?;
    let config = Descriptor::new(config_media_type, &config_hex, config_size);

    let manifest = Manifest {
        schema_version: SCHEMA_VERSION,
        media_type: mediatype::MEDIA_TYPE_OCI_MANIFEST.to_string(),
        artifact_type,
        config,
        layers,
    };
    let manifest_json = serde_json::to_string_pretty(&manifest)?;
    validate_manifest_json(&manifest_json)?;
    let (manifest_hex, manifest_size) = layout.write_blob(manifest_json.as_bytes())?;

    let mut entry = Descriptor::new(mediatype::MEDIA_TYPE_OCI_MANIFEST, &manifest_hex, manifest_size);
    entry.annotations = Some(index_annotations(opts));
    let index = Index {
        schema_version: SCHEMA_VERSION,
        media_type: mediatype::MEDIA_TYPE_OCI_INDEX.to_string(),
        manifests: vec![entry],
    };
    layout.write_index(&index)?;

    info!(
        layers = layer_count,
        digest = %manifest_hex,
        path = %layout.root().display(),
        "OCI layout written"
    );

    Ok(PackSummary {
        layout_path: layout.root().to_path_buf(),
        manifest_digest: format!("sha256:{manifest_hex}"),
        layer_count,
        blob_bytes: layer_bytes + config_size + manifest_size,
    })
}

/// Classify the tree and emit category layers in fixed priority order.
fn build_modelpack_layers(
    layout: &Layout,
    src_dir: &Path,
    opts: &PackOptions,
    ignore: &IgnoreRules,
) -> Result<Vec<Descriptor>> {
    let tree = classify::classify_tree(src_dir, ignore)?;
    let mut layers = Vec::new();

    for category in Category::PRIORITY {
        let files = tree.files(category);
        if files.is_empty() {
            continue;
        }
        let media_type = override_for(category, &opts.media_types)
            .unwrap_or_else(|| mediatype::category_layer_media_type(category, opts.mode));

        match opts.mode {
            PackMode::Raw => {
                layers.extend(layer::build_raw_layers(
                    layout, src_dir, files, &media_type, true,
                )?);
            }
            // One archive per weight file: a single changed weight must not
            // invalidate a monolithic bundle blob.
            _ if category == Category::Weights => {
                layers.extend(layer::build_file_archives(
                    layout,
                    src_dir,
                    files,
                    opts.mode,
                    &media_type,
                    category.as_str(),
                )?);
            }
            _ => {
                if let Some(desc) = layer::build_aggregate_archive(
                    layout,
                    src_dir,
                    files,
                    opts.mode,
                    &media_type,
                    category.as_str(),
                    true,
                )? {
                    layers.push(desc);
                }
            }
        }
    }
    Ok(layers)
}

/// Generic spec: one undifferentiated set, no annotations.
fn build_generic_layers(
    layout: &Layout,
    src_dir: &Path,
    opts: &PackOptions,
    ignore: &IgnoreRules,
) -> Result<Vec<Descriptor>> {
    let files = classify::list_files(src_dir, ignore)?;
    let media_type = mediatype::generic_layer_media_type(opts.mode);

    match opts.mode {
        PackMode::Raw => layer::build_raw_layers(layout, src_dir, &files, &media_type, false),
        _ => Ok(layer::build_aggregate_archive(
            layout, src_dir, &files, opts.mode, &media_type, "generic", false,
        )?
        .into_iter()
        .collect()),
    }
}

fn override_for(category: Category, overrides: &MediaTypeOverrides) -> Option<String> {
    match category {
        Category::Weights => overrides.weights.clone(),
        Category::Config => overrides.config.clone(),
        Category::Docs => overrides.docs.clone(),
        Category::Code | Category::Dataset => None,
    }
}

fn index_annotations(opts: &PackOptions) -> BTreeMap<String, String> {
    let name = opts.name.as_deref().filter(|n| !n.is_empty());
    // Title and ref-name fall back independently: an empty title annotation
    // is invalid, while an untagged ref is a normal state.
    let title = name.unwrap_or(FALLBACK_TITLE).to_string();
    let ref_name = name.map_or_else(|| UNTAGGED_REF.to_string(), safe_ref_name);

    BTreeMap::from([
        (ANNOTATION_TITLE.to_string(), title),
        (ANNOTATION_REF_NAME.to_string(), ref_name),
        (
            ANNOTATION_CREATED.to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        ),
        (
            ANNOTATION_DESCRIPTION.to_string(),
            format!("AI model packaged by aipack ({})", opts.spec.as_str()),
        ),
    ])
}
