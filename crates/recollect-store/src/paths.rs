use std::path::{Path, PathBuf};

/// Default name of the intermediate document written by `parse`.
pub const DEFAULT_PARSED_FILE: &str = "parsed_conversation.json";

/// Well-known paths for one working directory.
#[derive(Debug, Clone)]
pub struct RecollectPaths {
    pub root: PathBuf,
    pub recollect_dir: PathBuf,
    pub config_json: PathBuf,
    pub parsed_json: PathBuf,
    pub memory_dir: PathBuf,
}

impl RecollectPaths {
    /// Derive all paths from a working directory. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let recollect_dir = root.join(".recollect");
        Self {
            config_json: recollect_dir.join("config.json"),
            parsed_json: root.join(DEFAULT_PARSED_FILE),
            memory_dir: root.join("memory_files"),
            recollect_dir,
            root,
        }
    }

    /// Walk up from `start` looking for a directory containing `.recollect/`.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".recollect").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}
