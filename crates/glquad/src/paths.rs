use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

const RESOURCE_DIR_NAME: &str = "shaders";

/// Picks the shader resource directory.
///
/// An explicit directory always wins. Otherwise the first existing candidate
/// is used: `shaders/` next to the executable, then the workspace's bundled
/// `shaders/` directory for development builds.
pub fn resolve_resource_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "using resource directory from CLI/env");
        return path.to_path_buf();
    }

    let candidates = [executable_resource_dir(), Some(dev_resource_dir())];
    for candidate in candidates.into_iter().flatten() {
        if candidate.is_dir() {
            debug!(path = %candidate.display(), "using bundled resource directory");
            return candidate;
        }
    }

    debug!("no bundled resource directory found; falling back to ./{RESOURCE_DIR_NAME}");
    PathBuf::from(RESOURCE_DIR_NAME)
}

fn executable_resource_dir() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    Some(exe.parent()?.join(RESOURCE_DIR_NAME))
}

fn dev_resource_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(RESOURCE_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directory_wins_even_if_missing() {
        let explicit = Path::new("/definitely/not/here");
        assert_eq!(resolve_resource_dir(Some(explicit)), explicit);
    }

    #[test]
    fn development_builds_find_the_workspace_shaders() {
        let resolved = resolve_resource_dir(None);
        assert!(resolved.join("Shader.vsh").is_file());
        assert!(resolved.join("Shader.fsh").is_file());
    }
}
