use aipack::manifest::{
    Index, Manifest, ANNOTATION_FILEPATH, ANNOTATION_FILE_METADATA, ANNOTATION_REF_NAME,
    ANNOTATION_TITLE,
};
use aipack::{pack, MediaTypeOverrides, PackMode, PackOptions, SpecKind};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn make_file(dir: &Path, name: &str, size: usize) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![0u8; size]).unwrap();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    let content = fs::read_to_string(path).unwrap_or_else(|e| panic!("read {path:?}: {e}"));
    serde_json::from_str(&content).unwrap_or_else(|e| panic!("unmarshal {path:?}: {e}"))
}

fn load_manifest(layout: &Path) -> Manifest {
    let index: Index = read_json(&layout.join("index.json"));
    assert_eq!(index.manifests.len(), 1, "expected exactly one manifest");
    let digest = index.manifests[0].encoded_digest().to_string();
    read_json(&layout.join("blobs").join("sha256").join(digest))
}

#[test]
fn test_modelpack_raw_three_layer_scenario() {
    let src = tempdir().unwrap();
    make_file(src.path(), "model.safetensors", 1024);
    make_file(src.path(), "config.json", 200);
    make_file(src.path(), "README.md", 100);

    let out = tempdir().unwrap();
    let mut opts = PackOptions::new(src.path().to_str().unwrap(), out.path());
    opts.mode = PackMode::Raw;
    opts.name = Some("My Model 1".to_string());

    let summary = pack(&opts).unwrap();
    assert_eq!(summary.layer_count, 3);

    let manifest = load_manifest(out.path());
    assert_eq!(manifest.schema_version, 2);
    assert_eq!(
        manifest.artifact_type,
        "application/vnd.cncf.model.manifest.v1+json"
    );
    assert_eq!(manifest.layers.len(), 3);
    assert_eq!(
        manifest.layers[0].media_type,
        "application/vnd.cncf.model.weight.v1.raw"
    );
    assert_eq!(
        manifest.layers[1].media_type,
        "application/vnd.cncf.model.weight.config.v1.raw"
    );
    assert_eq!(
        manifest.layers[2].media_type,
        "application/vnd.cncf.model.doc.v1.raw"
    );

    // Every raw layer carries the per-file annotation metadata block.
    for (layer, expected_path) in manifest
        .layers
        .iter()
        .zip(["model.safetensors", "config.json", "README.md"])
    {
        let ann = layer.annotations.as_ref().expect("raw layer annotations");
        assert_eq!(ann.get(ANNOTATION_FILEPATH).unwrap(), expected_path);
        let meta = ann.get(ANNOTATION_FILE_METADATA).unwrap();
        assert!(meta.contains("\"mode\":420"));
        assert!(meta.contains("\"mtime\":\"1970-01-01T00:00:00Z\""));
    }

    let index: Index = read_json(&out.path().join("index.json"));
    let ann = index.manifests[0].annotations.as_ref().unwrap();
    assert_eq!(ann.get(ANNOTATION_TITLE).unwrap(), "My Model 1");
    assert_eq!(ann.get(ANNOTATION_REF_NAME).unwrap(), "my-model-1");
}

#[test]
fn test_modelpack_partitioning_with_size_fallback() {
    let src = tempdir().unwrap();
    make_file(src.path(), "model.safetensors", 1024);
    make_file(src.path(), "config.json", 200);
    make_file(src.path(), "README.md", 100);
    make_file(src.path(), "misc.xyz", 50); // small unknown -> config
    make_file(src.path(), "bigfile.dat", 11 * 1024 * 1024); // large unknown -> weights

    let out = tempdir().unwrap();
    let mut opts = PackOptions::new(src.path().to_str().unwrap(), out.path());
    opts.mode = PackMode::Tar;

    pack(&opts).unwrap();
    let manifest = load_manifest(out.path());

    // tar mode: one archive per weight file, one aggregate per other category
    assert_eq!(manifest.layers.len(), 4);
    let weight_paths: Vec<&str> = manifest.layers[..2]
        .iter()
        .map(|l| {
            l.annotations
                .as_ref()
                .unwrap()
                .get(ANNOTATION_FILEPATH)
                .unwrap()
                .as_str()
        })
        .collect();
    assert_eq!(weight_paths, ["bigfile.dat", "model.safetensors"]);

    let config_layer = &manifest.layers[2];
    assert_eq!(
        config_layer.media_type,
        "application/vnd.cncf.model.weight.config.v1.tar"
    );
    let meta = config_layer
        .annotations
        .as_ref()
        .unwrap()
        .get(ANNOTATION_FILE_METADATA)
        .unwrap();
    assert!(meta.contains("\"files\":2"), "config.json + misc.xyz: {meta}");

    assert_eq!(
        manifest.layers[3].media_type,
        "application/vnd.cncf.model.doc.v1.tar"
    );
}

#[test]
fn test_aggregate_tar_entries_sorted_and_normalized() {
    let src = tempdir().unwrap();
    make_file(src.path(), "b_config.json", 10);
    make_file(src.path(), "a_config.json", 10);
    make_file(src.path(), "nested/c.txt", 10);

    let out = tempdir().unwrap();
    let mut opts = PackOptions::new(src.path().to_str().unwrap(), out.path());
    opts.mode = PackMode::Tar;

    pack(&opts).unwrap();
    let manifest = load_manifest(out.path());
    assert_eq!(manifest.layers.len(), 1);

    let blob = out
        .path()
        .join("blobs")
        .join("sha256")
        .join(manifest.layers[0].encoded_digest());
    let mut archive = tar::Archive::new(fs::File::open(blob).unwrap());
    let mut names = Vec::new();
    for entry in archive.entries().unwrap() {
        let entry = entry.unwrap();
        let header = entry.header();
        assert_eq!(header.mode().unwrap(), 0o644);
        assert_eq!(header.uid().unwrap(), 0);
        assert_eq!(header.gid().unwrap(), 0);
        assert_eq!(header.mtime().unwrap(), 0);
        names.push(entry.path().unwrap().to_string_lossy().into_owned());
    }
    assert_eq!(names, ["a_config.json", "b_config.json", "nested/c.txt"]);
}

#[test]
fn test_generic_tar_gzip_single_layer() {
    let src = tempdir().unwrap();
    make_file(src.path(), "f1.txt", 10);
    make_file(src.path(), "f2.txt", 5);

    let out = tempdir().unwrap();
    let mut opts = PackOptions::new(src.path().to_str().unwrap(), out.path());
    opts.spec = SpecKind::Generic;
    opts.mode = PackMode::TarGzip;
    opts.name = Some("Generic Artifact".to_string());

    let summary = pack(&opts).unwrap();
    assert_eq!(summary.layer_count, 1);

    let manifest = load_manifest(out.path());
    assert_eq!(manifest.layers.len(), 1);
    assert_eq!(
        manifest.layers[0].media_type,
        "application/vnd.oci.image.layer.v1.tar+gzip"
    );
    assert!(manifest.layers[0].annotations.is_none());
    assert_eq!(manifest.artifact_type, "application/vnd.unknown.artifact.v1");
    assert_eq!(
        manifest.config.media_type,
        "application/vnd.oci.empty.v1+json"
    );

    // config blob is the literal empty object
    let config = fs::read(
        out.path()
            .join("blobs")
            .join("sha256")
            .join(manifest.config.encoded_digest()),
    )
    .unwrap();
    assert_eq!(config, b"{}");
}

#[test]
fn test_generic_zstd_layer_decompresses_to_plain_tar() {
    let src = tempdir().unwrap();
    make_file(src.path(), "f1.txt", 64);
    make_file(src.path(), "f2.txt", 32);

    let pack_with = |mode: PackMode| {
        let out = tempdir().unwrap();
        let mut opts = PackOptions::new(src.path().to_str().unwrap(), out.path());
        opts.spec = SpecKind::Generic;
        opts.mode = mode;
        pack(&opts).unwrap();
        let manifest = load_manifest(out.path());
        let blob = out
            .path()
            .join("blobs")
            .join("sha256")
            .join(manifest.layers[0].encoded_digest());
        (fs::read(blob).unwrap(), manifest.layers[0].media_type.clone())
    };

    let (plain, plain_mt) = pack_with(PackMode::Tar);
    let (compressed, zstd_mt) = pack_with(PackMode::TarZstd);
    assert_eq!(plain_mt, "application/vnd.oci.image.layer.v1.tar");
    assert_eq!(zstd_mt, "application/vnd.oci.image.layer.v1.tar+zstd");
    assert_eq!(zstd::decode_all(&compressed[..]).unwrap(), plain);
}

#[test]
fn test_media_type_overrides_propagate() {
    let src = tempdir().unwrap();
    make_file(src.path(), "a.bin", 1);
    make_file(src.path(), "config.json", 1);
    make_file(src.path(), "README.md", 1);

    let out = tempdir().unwrap();
    let mut opts = PackOptions::new(src.path().to_str().unwrap(), out.path());
    opts.mode = PackMode::Tar;
    opts.media_types = MediaTypeOverrides {
        manifest_config: Some("custom/mcfg".to_string()),
        weights: Some("custom/w".to_string()),
        config: Some("custom/c".to_string()),
        docs: Some("custom/d".to_string()),
    };

    pack(&opts).unwrap();
    let manifest = load_manifest(out.path());
    assert_eq!(manifest.layers.len(), 3);
    assert_eq!(manifest.layers[0].media_type, "custom/w");
    assert_eq!(manifest.layers[1].media_type, "custom/c");
    assert_eq!(manifest.layers[2].media_type, "custom/d");
    assert_eq!(manifest.config.media_type, "custom/mcfg");
}

#[test]
fn test_blob_referential_integrity() {
    let src = tempdir().unwrap();
    make_file(src.path(), "model.safetensors", 2048);
    make_file(src.path(), "tokenizer.json", 128);
    make_file(src.path(), "README.md", 64);
    make_file(src.path(), "train.jsonl", 256);
    make_file(src.path(), "infer.py", 32);

    let out = tempdir().unwrap();
    let mut opts = PackOptions::new(src.path().to_str().unwrap(), out.path());
    opts.mode = PackMode::TarGzip;

    pack(&opts).unwrap();

    let blobs = out.path().join("blobs").join("sha256");
    let index: Index = read_json(&out.path().join("index.json"));
    for entry in &index.manifests {
        let path = blobs.join(entry.encoded_digest());
        assert_eq!(fs::metadata(&path).unwrap().len(), entry.size);
    }

    let manifest = load_manifest(out.path());
    // weights, config, docs, code, dataset all present
    assert_eq!(manifest.layers.len(), 5);
    for desc in manifest.layers.iter().chain([&manifest.config]) {
        let path = blobs.join(desc.encoded_digest());
        assert!(path.is_file(), "missing blob for {}", desc.digest);
        assert_eq!(fs::metadata(&path).unwrap().len(), desc.size);
    }

    // No stray staging files survive a successful run.
    for entry in fs::read_dir(&blobs).unwrap() {
        let name = entry.unwrap().file_name();
        let name = name.to_string_lossy();
        assert_eq!(name.len(), 64, "unexpected blob store entry: {name}");
    }
}

#[test]
fn test_exclude_patterns_filter_tree() {
    let src = tempdir().unwrap();
    make_file(src.path(), "model.safetensors", 10);
    make_file(src.path(), "original/model.bin", 10);
    make_file(src.path(), "weights.lock", 10);
    make_file(src.path(), ".cache/tmp.bin", 10);

    let out = tempdir().unwrap();
    let mut opts = PackOptions::new(src.path().to_str().unwrap(), out.path());
    opts.mode = PackMode::Raw;
    opts.exclude = vec!["original/*".to_string()];

    let summary = pack(&opts).unwrap();
    assert_eq!(summary.layer_count, 1, "lock, cache, and excluded files skipped");

    let manifest = load_manifest(out.path());
    let ann = manifest.layers[0].annotations.as_ref().unwrap();
    assert_eq!(ann.get(ANNOTATION_FILEPATH).unwrap(), "model.safetensors");
}
