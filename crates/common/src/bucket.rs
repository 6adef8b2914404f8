//! Bucket resolution
//!
//! Every request names its tenant through the `Host` header. The gateway's
//! own listening addresses (its "self hosts") are stripped out of the host
//! and whatever remains is the bucket, a single directory directly under the
//! storage root. Requests that arrive on a bare self host resolve to the empty
//! bucket and address buckets through the first path segment instead.
//!
//! Resolution is purely lexical: nothing here touches the filesystem, so it
//! works for objects that do not exist yet (uploads). The result is always
//! checked against the bucket directory after `.` and `..` are folded away.

use std::path::{Component, Path, PathBuf};

/// Addresses the gateway itself listens on, in `host:port` form.
pub const DEFAULT_SELF_HOSTS: [&str; 4] = [
    "basket:9002",
    "basket:9004",
    "localhost:9004",
    "localhost:9002",
];

/// Ordered, immutable list of self host suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfHosts(Vec<String>);

impl SelfHosts {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            hosts
                .into_iter()
                .map(Into::into)
                .filter(|h: &String| !h.is_empty())
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SelfHosts {
    fn default() -> Self {
        Self::new(DEFAULT_SELF_HOSTS)
    }
}

/// A request mapped onto the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Tenant identifier, possibly empty
    pub bucket: String,
    /// Absolute, normalized on-disk path
    pub path: PathBuf,
}

impl Resolved {
    /// Whether the target names a ZIP object that can be browsed.
    pub fn is_zip(&self) -> bool {
        self.path
            .extension()
            .map(|ext| ext == "zip")
            .unwrap_or(false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("path escapes its bucket: {path}")]
    PathEscape { path: String },
}

/// Derives buckets from hostnames and sandboxes request paths.
#[derive(Debug, Clone)]
pub struct BucketResolver {
    storage_root: PathBuf,
    self_hosts: SelfHosts,
}

impl BucketResolver {
    pub fn new(storage_root: impl Into<PathBuf>, self_hosts: SelfHosts) -> Self {
        Self {
            storage_root: normalize(&storage_root.into()),
            self_hosts,
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn self_hosts(&self) -> &SelfHosts {
        &self.self_hosts
    }

    /// Strip every self host out of `host`.
    ///
    /// Removal is global, not anchored at the end: `.suffix` occurrences go
    /// first, then bare `suffix` occurrences.
    pub fn bucket(&self, host: &str) -> String {
        let mut bucket = host.to_string();
        for suffix in self.self_hosts.iter() {
            bucket = bucket.replace(&format!(".{}", suffix), "");
        }
        for suffix in self.self_hosts.iter() {
            bucket = bucket.replace(suffix, "");
        }
        bucket
    }

    /// Directory that holds a bucket's objects.
    pub fn bucket_root(&self, bucket: &str) -> PathBuf {
        normalize(&self.storage_root.join(bucket))
    }

    /// Map `host` and `request_path` to a path inside the bucket.
    pub fn resolve(&self, host: &str, request_path: &str) -> Result<Resolved, ResolveError> {
        let bucket = self.bucket(host);

        if !is_single_segment(&bucket) {
            return Err(ResolveError::PathEscape {
                path: format!("{}{}", bucket, request_path),
            });
        }

        let rest = strip_bucket_prefix(request_path, &bucket);
        let sandbox = self.bucket_root(&bucket);
        let path = normalize(&sandbox.join(rest.trim_start_matches('/')));

        if !path.starts_with(&sandbox) {
            return Err(ResolveError::PathEscape {
                path: request_path.to_string(),
            });
        }

        tracing::debug!(
            host,
            bucket = %bucket,
            request_path,
            path = %path.display(),
            "resolved request"
        );

        Ok(Resolved { bucket, path })
    }
}

/// Drop a leading `/<bucket>` segment so path-style requests land in the
/// same place as host-style ones.
fn strip_bucket_prefix<'a>(request_path: &'a str, bucket: &str) -> &'a str {
    if bucket.is_empty() {
        return request_path;
    }
    match request_path
        .strip_prefix('/')
        .and_then(|p| p.strip_prefix(bucket))
    {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => request_path,
    }
}

fn is_single_segment(bucket: &str) -> bool {
    if bucket.is_empty() {
        return true;
    }
    let mut components = Path::new(bucket).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == bucket
    )
}

/// Lexically fold `.` and `..` out of a path. `..` never climbs above the
/// filesystem root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}
