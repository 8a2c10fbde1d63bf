use ordenes_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the data directory.
///
/// Priority:
/// 1. `--root` flag / `ORDENES_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `ordenes.yaml` or `ordenes.redb`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_data_dir(&cwd).unwrap_or(cwd)
}

fn find_data_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| paths::config_path(dir).is_file() || paths::db_path(dir).is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_config_in_ancestor() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(paths::CONFIG_FILE), "version: 1\n").unwrap();
        let deep = dir.path().join("a/b");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_data_dir(&deep).as_deref(), Some(dir.path()));
    }

    #[test]
    fn nothing_found_without_markers() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("empty");
        std::fs::create_dir_all(&deep).unwrap();
        // Ancestors above the temp dir could hold markers; only check the
        // temp subtree.
        let found = find_data_dir(&deep);
        assert!(found.map_or(true, |p| !p.starts_with(dir.path())));
    }
}
