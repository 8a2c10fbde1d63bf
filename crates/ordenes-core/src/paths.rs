use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "ordenes.yaml";
pub const DB_FILE: &str = "ordenes.redb";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn db_path(root: &Path) -> PathBuf {
    root.join(DB_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_root() {
        let root = Path::new("/srv/ordenes");
        assert_eq!(config_path(root), PathBuf::from("/srv/ordenes/ordenes.yaml"));
        assert_eq!(db_path(root), PathBuf::from("/srv/ordenes/ordenes.redb"));
    }
}
