//! Resolution of the input file name to an absolute path

use std::path::{Component, Path, PathBuf};

/// Join `name` onto `base` and normalise `.`/`..` components lexically.
///
/// A missing file is logged but still returned; opening it later yields
/// `PipelineError::ResourceNotFound`.
pub fn resolve_data_path(base: &Path, name: &str) -> PathBuf {
    let joined = base.join(name);
    let path = normalize(&joined);

    if !path.is_file() {
        log::error!("The file '{}' does not exist.", path.display());
    }

    path
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
