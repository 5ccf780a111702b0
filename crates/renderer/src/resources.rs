use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::StageKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("resource {name}.{extension} not found in {}", root.display())]
    Missing {
        name: String,
        extension: String,
        root: PathBuf,
    },
}

/// Directory of bundled shader resources, addressed by base name and suffix.
#[derive(Debug, Clone)]
pub struct ResourceBundle {
    root: PathBuf,
}

impl ResourceBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `<name>.<extension>` inside the bundle.
    pub fn path_for_resource(&self, name: &str, extension: &str) -> Result<PathBuf, ResourceError> {
        let path = self.root.join(format!("{name}.{extension}"));
        if path.is_file() {
            Ok(path)
        } else {
            Err(ResourceError::Missing {
                name: name.to_string(),
                extension: extension.to_string(),
                root: self.root.clone(),
            })
        }
    }

    /// Resolves the vertex and fragment sources for a shader pair.
    pub fn shader_pair(&self, name: &str) -> Result<(PathBuf, PathBuf), ResourceError> {
        let vertex = self.path_for_resource(name, StageKind::Vertex.extension())?;
        let fragment = self.path_for_resource(name, StageKind::Fragment.extension())?;
        tracing::debug!(
            vertex = %vertex.display(),
            fragment = %fragment.display(),
            "resolved shader resources"
        );
        Ok((vertex, fragment))
    }
}
