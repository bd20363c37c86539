//! Mapping request URIs onto paths under the served root.
//!
//! Resolution is purely lexical: nothing here touches the filesystem, so a
//! symlink inside the root that points elsewhere is followed later by the
//! operations themselves.

use std::borrow::Cow;
use std::ops::Deref;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

use http::Uri;
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use crate::reply::{FailureSignal, ServeError};

/// A filesystem path that is known to be the root or to lie below it.
///
/// Only [`PathResolver::resolve`] creates one, so holding a `RequestPath`
/// means containment has already been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath(PathBuf);

impl RequestPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl Deref for RequestPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for RequestPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// `root` is expected to be absolute; it is normalised but not canonicalised.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: normalize(&root.into()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the path component of `uri` against the root.
    ///
    /// A path with a broken escape or one that does not decode to UTF-8 is
    /// [`ServeError::MalformedPath`]; one that lands outside the root is
    /// `403 Forbidden`.
    pub fn resolve(&self, uri: &Uri) -> Result<RequestPath, ServeError> {
        let decoded = decode(uri.path()).inspect_err(|e| debug!(path = uri.path(), cause = %e, "request path is malformed"))?;

        // an absolute remainder such as `//etc` replaces the root, and is rejected below
        let relative = decoded.strip_prefix('/').unwrap_or(&decoded);
        let resolved = normalize(&self.root.join(relative));

        if self.contains(&resolved) {
            Ok(RequestPath(resolved))
        } else {
            warn!(path = uri.path(), resolved = %resolved.display(), "request path escapes the root");
            Err(FailureSignal::forbidden().into())
        }
    }

    fn contains(&self, path: &Path) -> bool {
        if path == self.root {
            return true;
        }

        let root = self.root.as_os_str().as_encoded_bytes();
        let separator = MAIN_SEPARATOR_STR.as_bytes();
        match path.as_os_str().as_encoded_bytes().strip_prefix(root) {
            Some(rest) => root.ends_with(separator) || rest.starts_with(separator),
            None => false,
        }
    }
}

/// Percent-decodes `path`, rejecting a `%` not followed by two hex digits.
fn decode(path: &str) -> Result<String, ServeError> {
    let mut rest = path.as_bytes();
    while let Some(at) = rest.iter().position(|&b| b == b'%') {
        match rest.get(at + 1..at + 3) {
            Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => rest = &rest[at + 3..],
            _ => return Err(ServeError::MalformedPath(format!("invalid escape in {path}"))),
        }
    }

    percent_decode_str(path)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|e| ServeError::MalformedPath(e.to_string()))
}

/// Removes `.` and applies `..` without consulting the filesystem. `..`
/// never climbs above the filesystem root.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
        }
    }
    normalized
}
