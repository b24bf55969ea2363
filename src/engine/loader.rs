//! Module loading.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tracing::debug;

use crate::cache::ModuleHandle;

// == Module Loader ==
/// Fetches the module behind a route key.
///
/// Loads may fail and may take arbitrarily long; the engine guarantees it
/// never runs two loads for the same key at once.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, route: &str) -> anyhow::Result<ModuleHandle>;
}

// == Fs Module Loader ==
/// Loads compiled route modules from a directory.
///
/// `/` maps to `index.<ext>`, `/a/b` to `a/b.<ext>`. The module handle is the
/// file's bytes as `Vec<u8>`.
#[derive(Debug, Clone)]
pub struct FsModuleLoader {
    root: PathBuf,
    extension: String,
}

impl FsModuleLoader {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Resolves a route key to a file under the root.
    ///
    /// Rejects keys that would escape the root.
    pub fn module_path(&self, route: &str) -> anyhow::Result<PathBuf> {
        let trimmed = route.trim_matches('/');
        let relative = if trimmed.is_empty() { "index" } else { trimmed };

        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("route '{}' does not name a module file", route);
        }

        let mut path = self.root.join(relative);
        let file_name = format!(
            "{}.{}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            self.extension
        );
        path.set_file_name(file_name);
        Ok(path)
    }
}

#[async_trait]
impl ModuleLoader for FsModuleLoader {
    async fn load(&self, route: &str) -> anyhow::Result<ModuleHandle> {
        let path = self.module_path(route)?;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading module {}", path.display()))?;

        debug!(route, bytes = bytes.len(), "module read from disk");
        Ok(Arc::new(bytes))
    }
}
