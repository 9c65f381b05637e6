//! Private scratch directory and named workfiles (§3, §4.1 phase 2).
//!
//! Grounded on `internal/usecase/resolve/workfilecreator.go`: a handful of fixed
//! file names inside one private temp directory, removed on drop unless the
//! caller asks to retain it (`--debug`, §10.5).

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{PipelineError, Result};

/// Owns a private temporary directory holding the pipeline's intermediate files.
/// Dropping it removes the directory and everything in it, unless [`Workspace::keep`]
/// has been called.
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
    pub domains: PathBuf,
    pub massdns_public: PathBuf,
    pub massdns_trusted: PathBuf,
    pub temporary: PathBuf,
    pub public_resolvers: PathBuf,
    pub trusted_resolvers: PathBuf,
    pub wildcard_roots: PathBuf,
}

impl Workspace {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("rdnsx.")
            .tempdir()
            .map_err(PipelineError::workspace)?;
        let root = dir.path().to_path_buf();

        let touch = |name: &str| -> Result<PathBuf> {
            let path = root.join(name);
            File::create(&path).map_err(PipelineError::workspace)?;
            Ok(path)
        };

        Ok(Self {
            domains: touch("domains")?,
            massdns_public: touch("massdns-public")?,
            massdns_trusted: touch("massdns-trusted")?,
            temporary: touch("temporary")?,
            public_resolvers: touch("resolvers-public")?,
            trusted_resolvers: touch("resolvers-trusted")?,
            wildcard_roots: touch("wildcard-roots")?,
            root,
            dir: Some(dir),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Detach the temp directory from its drop guard so it survives process exit;
    /// returns its path for `--debug` reporting (§10.5).
    pub fn keep(mut self) -> PathBuf {
        if let Some(dir) = self.dir.take() {
            let _ = dir.into_path();
        }
        self.root.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_makes_every_named_workfile() {
        let ws = Workspace::create().unwrap();
        for path in [
            &ws.domains,
            &ws.massdns_public,
            &ws.massdns_trusted,
            &ws.temporary,
            &ws.public_resolvers,
            &ws.trusted_resolvers,
            &ws.wildcard_roots,
        ] {
            assert!(path.exists());
            assert!(path.starts_with(ws.root()));
        }
    }

    #[test]
    fn drop_removes_the_directory() {
        let root = {
            let ws = Workspace::create().unwrap();
            ws.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn keep_retains_the_directory_after_drop() {
        let ws = Workspace::create().unwrap();
        let root = ws.keep();
        assert!(root.exists());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
