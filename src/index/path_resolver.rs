//! Candidate path canonicalization and project containment.
//!
//! A file keeps its own path as identity even when it is a symlink: every
//! parent directory is resolved to its real location, but the terminal
//! component is not dereferenced. Containment in the project is checked on
//! the fully resolved target.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::core::errors::{IndexError, Result};
use crate::index::context::{ModuleContext, ProjectContext};

/// A candidate resolved against the project and its module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Real path of the file; a terminal symlink is kept as is
    pub absolute: PathBuf,
    /// Fully resolved on-disk location (differs from `absolute` for symlinks)
    pub target: PathBuf,
    /// Forward-slash path relative to the project base directory
    pub project_relative: String,
    /// Forward-slash path relative to the module base directory
    pub module_relative: String,
}

/// Result of resolving a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The file lies inside the project
    Resolved(ResolvedPath),
    /// The file (or its symlink target) lies outside the project base directory
    OutsideProject {
        /// Resolved location that failed the containment check
        target: PathBuf,
    },
}

/// Resolves candidate paths against a project.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathResolver;

impl PathResolver {
    /// Resolve `candidate`, owned by `module`, against `project`.
    ///
    /// I/O failures are fatal and reported as [`IndexError::PathResolution`].
    /// A file outside the project is not an error: it is logged and reported
    /// as [`Resolution::OutsideProject`].
    pub fn resolve(
        &self,
        project: &ProjectContext,
        module: &ModuleContext,
        candidate: &Path,
    ) -> Result<Resolution> {
        let candidate = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            module.base_dir().join(candidate)
        };
        let fail = |err: io::Error| {
            IndexError::path_resolution(display_path(project.base_dir(), &candidate), err)
        };

        let (absolute, target) = real_path_keeping_link(&candidate).map_err(fail)?;

        if !target.starts_with(project.base_dir()) || !absolute.starts_with(project.base_dir()) {
            warn!(
                "File '{}' is ignored. It is not located in project basedir '{}'.",
                target.display(),
                project.base_dir().display()
            );
            return Ok(Resolution::OutsideProject { target });
        }

        let project_relative = relative_slash_path(project.base_dir(), &absolute);
        let module_relative = relative_slash_path(module.base_dir(), &absolute);

        Ok(Resolution::Resolved(ResolvedPath {
            absolute,
            target,
            project_relative,
            module_relative,
        }))
    }
}

/// Resolve all parents of `path` and, unless the file itself is a symlink,
/// the file too. Returns `(identity, fully_resolved_target)`.
fn real_path_keeping_link(path: &Path) -> io::Result<(PathBuf, PathBuf)> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name component")
    })?;
    let metadata = fs::symlink_metadata(path)?;

    if !metadata.file_type().is_symlink() {
        let real = fs::canonicalize(path)?;
        return Ok((real.clone(), real));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let real_parent = fs::canonicalize(parent)?;
    let real_name = on_disk_name(&real_parent, file_name)?;
    let target = fs::canonicalize(path)?;

    Ok((real_parent.join(real_name), target))
}

/// Name of the directory entry matching `name`, with its on-disk case.
fn on_disk_name(dir: &Path, name: &std::ffi::OsStr) -> io::Result<std::ffi::OsString> {
    let wanted = name.to_string_lossy();
    let mut folded = None;

    for entry in fs::read_dir(dir)? {
        let entry_name = entry?.file_name();
        if entry_name == name {
            return Ok(entry_name);
        }
        if folded.is_none() && entry_name.to_string_lossy().eq_ignore_ascii_case(&wanted) {
            folded = Some(entry_name);
        }
    }

    Ok(folded.unwrap_or_else(|| name.to_os_string()))
}

/// Lexical path of `path` relative to `base`, forward-slash separated.
///
/// Paths outside `base` climb with `..` segments.
pub fn relative_slash_path(base: &Path, path: &Path) -> String {
    if let Ok(stripped) = path.strip_prefix(base) {
        return to_slash(stripped);
    }

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let path_parts: Vec<Component<'_>> = path.components().collect();
    let common = base_parts
        .iter()
        .zip(&path_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = vec!["..".to_string(); base_parts.len() - common];
    segments.extend(
        path_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    segments.join("/")
}

/// Join the components of a relative path with `/`.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Project-relative rendering of a possibly unresolved path, for messages.
fn display_path(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(relative) => to_slash(relative),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}
