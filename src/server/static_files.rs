use std::path::{Component, Path, PathBuf};

use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Files served from a directory on disk for any path the API does not own.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        StaticFiles {
            root: root.into(),
            index_file: index_file.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn index(&self) -> Option<StaticFile> {
        self.read(self.root.join(&self.index_file)).await
    }

    /// Resolve a request path beneath the root. `None` means not found.
    pub async fn load(&self, request_path: &str) -> Option<StaticFile> {
        let relative = sanitize(request_path)?;
        self.read(self.root.join(relative)).await
    }

    async fn read(&self, path: PathBuf) -> Option<StaticFile> {
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(StaticFile {
                content_type: content_type_for(&path),
                bytes,
            }),
            Err(err) => {
                trace!(path = %path.display(), error = %err, "static file unavailable");
                None
            }
        }
    }
}

/// Turn `/a/b.css` into `a/b.css`, refusing anything that could leave the root.
fn sanitize(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let candidate = Path::new(trimmed);
    let mut out = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        _ => "text/plain",
    }
}
