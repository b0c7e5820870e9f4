//! Locating the files that make up a scope.

use glob::Pattern;
use indexmap::IndexMap;
use std::path::PathBuf;
use thiserror::Error;

/// Ordered mapping from source identifier to file content. Iteration order
/// is merge order.
pub type FileSet = IndexMap<String, String>;

/// Finds every file named `file_name` that belongs to `scope`.
pub trait FileResolver {
    fn get(&self, file_name: &str, scope: &str) -> Result<FileSet, ResolveError>;
}

impl<T: FileResolver + ?Sized> FileResolver for &T {
    fn get(&self, file_name: &str, scope: &str) -> Result<FileSet, ResolveError> {
        (**self).get(file_name, scope)
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid file name pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves files from a list of configuration roots.
///
/// For the global scope each root is searched directly; any other scope is
/// looked up in the `<root>/<scope>` subdirectory. Roots are visited in
/// order and the matches inside each directory are sorted, so later roots
/// override earlier ones when merged.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    roots: Vec<PathBuf>,
    global_scope: String,
}

impl DirectoryResolver {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            global_scope: crate::reader::DEFAULT_SCOPE.to_string(),
        }
    }

    /// Name of the scope that maps to the roots themselves.
    pub fn with_global_scope(mut self, scope: impl Into<String>) -> Self {
        self.global_scope = scope.into();
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn scope_directory(&self, root: &std::path::Path, scope: &str) -> PathBuf {
        if scope == self.global_scope {
            root.to_path_buf()
        } else {
            root.join(scope)
        }
    }
}

impl FileResolver for DirectoryResolver {
    fn get(&self, file_name: &str, scope: &str) -> Result<FileSet, ResolveError> {
        let mut files = FileSet::new();

        for root in &self.roots {
            let dir = self.scope_directory(root, scope);
            if !dir.is_dir() {
                tracing::debug!(dir = %dir.display(), "Skipping missing configuration directory");
                continue;
            }

            let pattern = format!(
                "{}/{}",
                Pattern::escape(&dir.to_string_lossy()),
                file_name
            );
            let entries = glob::glob(&pattern).map_err(|source| ResolveError::Pattern {
                pattern: file_name.to_string(),
                source,
            })?;

            let mut paths = Vec::new();
            for entry in entries {
                let path = entry.map_err(|err| ResolveError::Io {
                    path: err.path().display().to_string(),
                    source: err.into_error(),
                })?;
                if path.is_file() {
                    paths.push(path);
                }
            }
            paths.sort();

            for path in paths {
                let content = std::fs::read_to_string(&path).map_err(|source| ResolveError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                tracing::debug!(file = %path.display(), scope, "Resolved configuration file");
                files.insert(path.display().to_string(), content);
            }
        }

        Ok(files)
    }
}

/// In-memory resolver keyed by scope.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    scopes: IndexMap<String, FileSet>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to `scope`. Files are returned in insertion order.
    pub fn with_file(
        mut self,
        scope: impl Into<String>,
        id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.scopes
            .entry(scope.into())
            .or_default()
            .insert(id.into(), content.into());
        self
    }
}

impl FileResolver for MemoryResolver {
    fn get(&self, file_name: &str, scope: &str) -> Result<FileSet, ResolveError> {
        let pattern = Pattern::new(file_name).map_err(|source| ResolveError::Pattern {
            pattern: file_name.to_string(),
            source,
        })?;

        let Some(files) = self.scopes.get(scope) else {
            return Ok(FileSet::new());
        };

        Ok(files
            .iter()
            .filter(|(id, _)| {
                let basename = id.rsplit(['/', '\\']).next().unwrap_or(id.as_str());
                pattern.matches(basename)
            })
            .map(|(id, content)| (id.clone(), content.clone()))
            .collect())
    }
}
