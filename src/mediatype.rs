//! Media-type tables for the supported artifact specs.
//!
//! Kept as static data rather than scattered conditionals so the
//! category/mode → media-type mapping stays auditable in one place.

use crate::classify::Category;
use crate::pack::PackMode;

pub const MEDIA_TYPE_OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub const MEDIA_TYPE_OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Manifest config media type for generic artifacts; the config blob is the
/// literal two-byte `{}`.
pub const MEDIA_TYPE_EMPTY_CONFIG: &str = "application/vnd.oci.empty.v1+json";

/// Manifest config media type for model-pack artifacts.
pub const MEDIA_TYPE_MODEL_CONFIG: &str = "application/vnd.cncf.model.config.v1+json";

pub const ARTIFACT_TYPE_MODEL: &str = "application/vnd.cncf.model.manifest.v1+json";
pub const ARTIFACT_TYPE_GENERIC: &str = "application/vnd.unknown.artifact.v1";

pub const MEDIA_TYPE_OCTET_STREAM: &str = "application/octet-stream";

const GENERIC_LAYER_BASE: &str = "application/vnd.oci.image.layer.v1";

/// Category → media-type family base. The pack-mode suffix is appended.
fn category_base(category: Category) -> &'static str {
    match category {
        Category::Weights => "application/vnd.cncf.model.weight.v1",
        Category::Config => "application/vnd.cncf.model.weight.config.v1",
        Category::Docs => "application/vnd.cncf.model.doc.v1",
        Category::Code => "application/vnd.cncf.model.code.v1",
        Category::Dataset => "application/vnd.cncf.model.dataset.v1",
    }
}

/// Default layer media type for a model-pack category under a pack mode.
pub fn category_layer_media_type(category: Category, mode: PackMode) -> String {
    format!("{}.{}", category_base(category), mode.suffix())
}

/// Layer media type for the generic spec. Raw blobs are untyped byte
/// streams; archives use the standard OCI layer family.
pub fn generic_layer_media_type(mode: PackMode) -> String {
    match mode {
        PackMode::Raw => MEDIA_TYPE_OCTET_STREAM.to_string(),
        _ => format!("{}.{}", GENERIC_LAYER_BASE, mode.suffix()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_media_types() {
        assert_eq!(
            category_layer_media_type(Category::Weights, PackMode::Raw),
            "application/vnd.cncf.model.weight.v1.raw"
        );
        assert_eq!(
            category_layer_media_type(Category::Config, PackMode::Tar),
            "application/vnd.cncf.model.weight.config.v1.tar"
        );
        assert_eq!(
            category_layer_media_type(Category::Docs, PackMode::TarGzip),
            "application/vnd.cncf.model.doc.v1.tar+gzip"
        );
        assert_eq!(
            category_layer_media_type(Category::Dataset, PackMode::TarZstd),
            "application/vnd.cncf.model.dataset.v1.tar+zstd"
        );
    }

    #[test]
    fn test_generic_media_types() {
        assert_eq!(
            generic_layer_media_type(PackMode::Raw),
            "application/octet-stream"
        );
        assert_eq!(
            generic_layer_media_type(PackMode::Tar),
            "application/vnd.oci.image.layer.v1.tar"
        );
        assert_eq!(
            generic_layer_media_type(PackMode::TarGzip),
            "application/vnd.oci.image.layer.v1.tar+gzip"
        );
        assert_eq!(
            generic_layer_media_type(PackMode::TarZstd),
            "application/vnd.oci.image.layer.v1.tar+zstd"
        );
    }

    #[test]
    fn test_every_category_has_a_base() {
        for category in Category::PRIORITY {
            assert!(!category_layer_media_type(category, PackMode::Tar).is_empty());
        }
    }
}
