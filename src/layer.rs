use crate::error::{PackError, Result};
use crate::layout::Layout;
use crate::manifest::{layer_annotations, Descriptor, FileMetadata};
use crate::pack::PackMode;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};
use tracing::debug;

/// Build one raw blob per file. Each descriptor optionally carries the
/// per-file annotation metadata block.
pub fn build_raw_layers(
    layout: &Layout,
    src_dir: &Path,
    files: &[String],
    media_type: &str,
    annotate: bool,
) -> Result<Vec<Descriptor>> {
    let mut descriptors = Vec::with_capacity(files.len());
    for (idx, rel) in files.iter().enumerate() {
        let staged = layout.staging_path(&format!("raw-{idx}.part"));
        stage_copy(&src_dir.join(rel), &staged)?;
        let (hex, size) = layout.commit_staged(&staged)?;
        debug!(file = %rel, digest = %hex, size, "raw layer committed");

        let mut desc = Descriptor::new(media_type, &hex, size);
        if annotate {
            let meta = FileMetadata::regular(rel, size);
            desc.annotations = Some(layer_annotations(rel, &meta)?);
        }
        descriptors.push(desc);
    }
    Ok(descriptors)
}

/// Build one archive blob per file (used for weights, so changing a single
/// weight file never invalidates its siblings' blobs).
pub fn build_file_archives(
    layout: &Layout,
    src_dir: &Path,
    files: &[String],
    mode: PackMode,
    media_type: &str,
    label: &str,
) -> Result<Vec<Descriptor>> {
    let mut descriptors = Vec::with_capacity(files.len());
    for (idx, rel) in files.iter().enumerate() {
        let staging_name = format!("{label}-{idx}.tar.part");
        let (staged, uncompressed) =
            stage_archive(layout, src_dir, std::slice::from_ref(rel), mode, &staging_name)?;
        let (hex, size) = layout.commit_staged(&staged)?;
        debug!(file = %rel, digest = %hex, size, "file archive committed");

        let mut desc = Descriptor::new(media_type, &hex, size);
        let meta = FileMetadata::regular(rel, uncompressed);
        desc.annotations = Some(layer_annotations(rel, &meta)?);
        descriptors.push(desc);
    }
    Ok(descriptors)
}

/// Build a single archive blob holding every file of a category. Returns
/// `None` for an empty list; a zero-content layer is never emitted.
pub fn build_aggregate_archive(
    layout: &Layout,
    src_dir: &Path,
    files: &[String],
    mode: PackMode,
    media_type: &str,
    label: &str,
    annotate: bool,
) -> Result<Option<Descriptor>> {
    if files.is_empty() {
        return Ok(None);
    }
    let staging_name = format!("{label}.tar.part");
    let (staged, uncompressed) = stage_archive(layout, src_dir, files, mode, &staging_name)?;
    let (hex, size) = layout.commit_staged(&staged)?;
    debug!(label, digest = %hex, size, files = files.len(), "aggregate archive committed");

    let mut desc = Descriptor::new(media_type, &hex, size);
    if annotate {
        let meta = FileMetadata::aggregate(label, uncompressed, files.len() as u64);
        desc.annotations = Some(layer_annotations(label, &meta)?);
    }
    Ok(Some(desc))
}

/// Stream a file byte-for-byte into a staging path.
fn stage_copy(src: &Path, staged: &Path) -> Result<()> {
    let mut input = File::open(src)?;
    let mut output = File::create(staged)?;
    io::copy(&mut input, &mut output)?;
    Ok(())
}

/// Write a deterministic tar of `files` (optionally compressed) into a
/// staging file. Returns the staging path and total uncompressed size.
fn stage_archive(
    layout: &Layout,
    src_dir: &Path,
    files: &[String],
    mode: PackMode,
    staging_name: &str,
) -> Result<(PathBuf, u64)> {
    if mode == PackMode::Raw {
        return Err(PackError::Config(
            "raw mode does not produce archives".to_string(),
        ));
    }
    let staged = layout.staging_path(staging_name);
    let file = File::create(&staged)?;

    let total = match mode {
        PackMode::Raw => unreachable!("rejected above"),
        PackMode::Tar => {
            let mut builder = Builder::new(file);
            let total = append_all(&mut builder, src_dir, files)?;
            builder.into_inner()?;
            total
        }
        PackMode::TarGzip => {
            let encoder = GzEncoder::new(file, Compression::default());
            let mut builder = Builder::new(encoder);
            let total = append_all(&mut builder, src_dir, files)?;
            builder.into_inner()?.finish()?;
            total
        }
        PackMode::TarZstd => {
            let encoder = zstd::stream::write::Encoder::new(file, 0)?;
            let mut builder = Builder::new(encoder);
            let total = append_all(&mut builder, src_dir, files)?;
            builder.into_inner()?.finish()?;
            total
        }
    };

    Ok((staged, total))
}

fn append_all<W: Write>(builder: &mut Builder<W>, src_dir: &Path, files: &[String]) -> Result<u64> {
    let mut total = 0;
    for rel in files {
        total += append_file(builder, src_dir, rel)?;
    }
    Ok(total)
}

/// Append one file with normalized header fields so identical input trees
/// always produce identical tar bytes regardless of host filesystem.
fn append_file<W: Write>(builder: &mut Builder<W>, src_dir: &Path, rel: &str) -> Result<u64> {
    let mut file = File::open(src_dir.join(rel))?;
    let size = file.metadata()?.len();

    let mut header = Header::new_gnu();
    header.set_size(size);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_entry_type(EntryType::Regular);

    builder.append_data(&mut header, rel, &mut file)?;
    Ok(size)
}
