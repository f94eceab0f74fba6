//! Preprocessing pipeline and artifact cache
//!
//! A preprocessor transforms source bytes before compilation. The result is
//! persisted next to the source (or under a relocation prefix) as an
//! artifact named `<stem><infix>.<ext>`, and reused as long as it is at
//! least as new as the source. Diagnostics show the artifact under its
//! display path so host-side line references stay meaningful even when the
//! artifact is relocated.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use pathload_vfs::VirtualFileSystem;

use crate::config::LoaderConfig;
use crate::error::LoadError;

/// A preprocessing transform over raw source bytes.
pub type Preprocessor<'a> = &'a dyn Fn(&[u8], &Path) -> Result<Vec<u8>, LoadError>;

/// The two names of a preprocessing artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// The path shown in diagnostics: always next to the source.
    pub display: PathBuf,
    /// Where the artifact is actually stored.
    pub real: PathBuf,
}

/// Compute the artifact paths for a source file.
///
/// With an absolute `prefix`, the artifact nests under the prefix mirroring
/// the source directory. With a relative one, it nests in a subdirectory
/// next to the source.
pub fn artifact_paths(
    config: &LoaderConfig,
    source: &Path,
    prefix: Option<&Path>,
) -> ArtifactPaths {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unit");
    let ext = source
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or(&config.source_extension);
    let file_name = format!("{}{}.{}", stem, config.artifact_infix, ext);

    let dir = source.parent().unwrap_or(Path::new("/"));
    let display = dir.join(&file_name);

    let real = match prefix {
        None => display.clone(),
        Some(prefix) if prefix.is_absolute() => {
            let mirrored: PathBuf = dir
                .components()
                .filter(|c| matches!(c, std::path::Component::Normal(_)))
                .collect();
            prefix.join(mirrored).join(&file_name)
        }
        Some(prefix) => dir.join(prefix).join(&file_name),
    };

    ArtifactPaths { display, real }
}

/// Is the stored artifact still valid for this source?
fn artifact_is_fresh(
    vfs: &dyn VirtualFileSystem,
    source: &Path,
    artifact: &Path,
) -> bool {
    if !vfs.is_file(artifact) {
        return false;
    }
    match (vfs.mtime(artifact), vfs.mtime(source)) {
        (Ok(artifact_mtime), Ok(source_mtime)) => artifact_mtime >= source_mtime,
        _ => false,
    }
}

fn provenance_header(source: &Path) -> String {
    format!(
        "# NOTE: This file was automatically generated from:\n# {}\n# DO NOT CHANGE DIRECTLY!\n",
        source.display()
    )
}

/// Run a preprocessor over a source file, consulting and maintaining the
/// artifact cache.
///
/// Returns the bytes to compile plus the artifact paths. With caching off,
/// any stale artifact on disk is removed and nothing is persisted.
pub fn process(
    vfs: &dyn VirtualFileSystem,
    config: &LoaderConfig,
    source_path: &Path,
    preprocessor: Preprocessor<'_>,
    use_cache: bool,
    prefix: Option<&Path>,
) -> Result<(Vec<u8>, ArtifactPaths), LoadError> {
    let paths = artifact_paths(config, source_path, prefix);

    if use_cache && artifact_is_fresh(vfs, source_path, &paths.real) {
        trace!(artifact = %paths.real.display(), "reusing preprocessing artifact");
        let bytes = vfs.read_file(&paths.real)?;
        return Ok((bytes, paths));
    }

    let source = vfs.read_file(source_path)?;
    let processed = preprocessor(&source, source_path)?;

    let mut output = provenance_header(source_path).into_bytes();
    output.extend_from_slice(&processed);

    if use_cache {
        if let Some(parent) = paths.real.parent() {
            vfs.create_dir_all(parent)?;
        }
        vfs.write_file(&paths.real, &output)?;
        debug!(
            source = %source_path.display(),
            artifact = %paths.real.display(),
            "wrote preprocessing artifact"
        );
    } else if vfs.is_file(&paths.real) {
        // Caching is off for this load; a leftover artifact would shadow
        // future edits, so drop it.
        vfs.remove_file(&paths.real)?;
        debug!(artifact = %paths.real.display(), "removed stale preprocessing artifact");
    }

    Ok((output, paths))
}
