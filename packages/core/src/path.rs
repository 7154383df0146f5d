//! Path resolution against directory roots.
//!
//! Resolution is purely lexical: `.` components are dropped and `..` pops the
//! previous component. Popping past the root is an error, so a resolved path
//! always stays inside the root it was resolved against. Symlinks are not
//! followed.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::{Directory, DirectoryRoots, Error};

/// An absolute file path plus the directory that contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub parent: PathBuf,
}

impl ResolvedPath {
    pub fn display(&self) -> String {
        self.path.display().to_string()
    }

    /// Make sure the parent directory exists.
    ///
    /// Missing intermediates are created only when `recursive` is set;
    /// otherwise nothing is created and `DirectoryMissing` is returned.
    pub async fn prepare_parent(&self, recursive: bool) -> Result<(), Error> {
        match tokio::fs::metadata(&self.parent).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::DirectoryMissing {
                path: self.parent.clone(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if recursive {
                    tokio::fs::create_dir_all(&self.parent).await?;
                    Ok(())
                } else {
                    Err(Error::DirectoryMissing {
                        path: self.parent.clone(),
                    })
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolve `path` against the root of `directory`.
///
/// With a directory, `path` is relative to its root (leading `/` is ignored)
/// or a `file://` URI inside that root. Without one, `path` must already be a
/// `file://` URI or an absolute path.
pub fn resolve(
    directory: Option<Directory>,
    path: &str,
    roots: &DirectoryRoots,
) -> Result<ResolvedPath, Error> {
    if path.is_empty() {
        return Err(Error::invalid_path(path, "path is empty"));
    }
    if path.contains('\0') {
        return Err(Error::invalid_path(path, "path contains a NUL byte"));
    }

    let resolved = match directory {
        Some(directory) => {
            let root = roots.get(directory).ok_or_else(|| {
                Error::invalid_path(path, format!("no root configured for {}", directory))
            })?;
            let root = normalize(root, Path::new("/"), path)?;

            if path.starts_with("file:") {
                let absolute = file_uri_to_path(path)?;
                let normalized = normalize(&absolute, Path::new("/"), path)?;
                if !normalized.starts_with(&root) {
                    return Err(Error::invalid_path(
                        path,
                        format!("file URI is outside the {} root", directory),
                    ));
                }
                normalized
            } else {
                normalize(Path::new(path.trim_start_matches('/')), &root, path)?
            }
        }
        None => {
            let absolute = if path.starts_with("file:") {
                file_uri_to_path(path)?
            } else {
                PathBuf::from(path)
            };
            if !absolute.has_root() {
                return Err(Error::invalid_path(
                    path,
                    "a directory is required for relative paths",
                ));
            }
            normalize(&absolute, Path::new("/"), path)?
        }
    };

    let parent = match resolved.parent() {
        Some(parent) if resolved.file_name().is_some() => parent.to_path_buf(),
        _ => return Err(Error::invalid_path(path, "path does not name a file")),
    };

    if let Some(directory) = directory {
        // The root itself is not a writable file.
        if roots
            .get(directory)
            .and_then(|root| normalize(root, Path::new("/"), path).ok())
            .is_some_and(|root| root == resolved)
        {
            return Err(Error::invalid_path(path, "path does not name a file"));
        }
    }

    Ok(ResolvedPath {
        path: resolved,
        parent,
    })
}

fn file_uri_to_path(uri: &str) -> Result<PathBuf, Error> {
    let url = Url::parse(uri).map_err(|e| Error::invalid_path(uri, e.to_string()))?;
    if url.scheme() != "file" {
        return Err(Error::invalid_path(uri, "only file:// URIs are supported"));
    }
    url.to_file_path()
        .map_err(|_| Error::invalid_path(uri, "URI is not a local file path"))
}

/// Join `relative` onto `base`, never ascending above `base`.
fn normalize(relative: &Path, base: &Path, original: &str) -> Result<PathBuf, Error> {
    let mut out = base.to_path_buf();
    let floor = out.components().count();

    for component in relative.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if out.components().count() <= floor {
                    return Err(Error::invalid_path(original, "path escapes its root"));
                }
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }

    Ok(out)
}
