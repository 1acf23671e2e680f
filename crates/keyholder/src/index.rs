//! Name index - the enumerable list of stored key names
//!
//! The keychain cannot be listed, so names live in a plain file next to it,
//! one per line, sorted. The file holds no secret material but is still
//! created owner-only.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File-backed set of key names
#[derive(Debug, Clone)]
pub struct NameIndex {
    path: PathBuf,
}

impl NameIndex {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all names. A missing file is an empty index.
    pub fn load(&self) -> Result<BTreeSet<String>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read index: {}", self.path.display()))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Replace the index with `names`, sorted, one per line
    pub fn save(&self, names: &BTreeSet<String>) -> Result<()> {
        let mut content = String::new();
        for name in names {
            content.push_str(name);
            content.push('\n');
        }

        let tmp_path = self.tmp_path();
        let mut file = self
            .open_tmp(&tmp_path)
            .with_context(|| format!("Failed to create index: {}", tmp_path.display()))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .with_context(|| format!("Failed to write index: {}", tmp_path.display()))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace index: {}", self.path.display()))?;

        tracing::debug!(count = names.len(), path = %self.path.display(), "index saved");
        Ok(())
    }

    /// Add one name and persist
    pub fn insert(&self, name: &str) -> Result<()> {
        let mut names = self.load()?;
        names.insert(name.to_string());
        self.save(&names)
    }

    /// Drop one name and persist. Returns whether it was present.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut names = self.load()?;
        let removed = names.remove(name);
        self.save(&names)?;
        Ok(removed)
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.contains(name))
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "keyholder_index".to_string());
        self.path.with_file_name(format!(".{}.tmp", file_name))
    }

    /// Sibling temp file: 0600 for a fresh index, else the existing file's mode
    #[cfg(unix)]
    fn open_tmp(&self, tmp_path: &Path) -> std::io::Result<fs::File> {
        use std::os::unix::fs::OpenOptionsExt;

        let _ = fs::remove_file(tmp_path);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(tmp_path)?;

        if let Ok(meta) = fs::metadata(&self.path) {
            fs::set_permissions(tmp_path, meta.permissions())?;
        }

        Ok(file)
    }

    #[cfg(not(unix))]
    fn open_tmp(&self, tmp_path: &Path) -> std::io::Result<fs::File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_index() -> (NameIndex, TempDir) {
        let dir = TempDir::new().unwrap();
        let index = NameIndex::new(&dir.path().join(".keyholder_index"));
        (index, dir)
    }

    fn set_of(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_load_missing_file() {
        let (index, _dir) = temp_index();
        assert!(index.load().unwrap().is_empty());
        assert!(!index.path().exists());
    }

    #[test]
    fn test_save_sorted_lines() {
        let (index, _dir) = temp_index();
        index.save(&set_of(&["openai", "anthropic", "elevenlabs"])).unwrap();

        let content = fs::read_to_string(index.path()).unwrap();
        assert_eq!(content, "anthropic\nelevenlabs\nopenai\n");
    }

    #[test]
    fn test_save_empty() {
        let (index, _dir) = temp_index();
        index.save(&BTreeSet::new()).unwrap();
        assert_eq!(fs::read_to_string(index.path()).unwrap(), "");
        assert!(index.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let (index, _dir) = temp_index();
        fs::write(index.path(), "b\n\n  a  \n\nb\n").unwrap();
        assert_eq!(index.load().unwrap(), set_of(&["a", "b"]));
    }

    #[test]
    fn test_save_load_fixed_point() {
        let (index, _dir) = temp_index();
        fs::write(index.path(), "zeta\nalpha\nzeta\n\nmid\n").unwrap();

        index.save(&index.load().unwrap()).unwrap();
        let first = fs::read_to_string(index.path()).unwrap();
        assert_eq!(first, "alpha\nmid\nzeta\n");

        index.save(&index.load().unwrap()).unwrap();
        assert_eq!(fs::read_to_string(index.path()).unwrap(), first);
    }

    #[test]
    fn test_insert_and_remove() {
        let (index, _dir) = temp_index();
        index.insert("s1").unwrap();
        index.insert("s2").unwrap();
        index.insert("s1").unwrap();
        assert_eq!(index.load().unwrap(), set_of(&["s1", "s2"]));

        assert!(index.remove("s1").unwrap());
        assert!(!index.remove("s1").unwrap());
        assert_eq!(index.load().unwrap(), set_of(&["s2"]));
        assert!(index.contains("s2").unwrap());
        assert!(!index.contains("s1").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (index, _dir) = temp_index();
        index.insert("openai").unwrap();

        let mode = fs::metadata(index.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (index, _dir) = temp_index();
        fs::write(index.path(), "openai\n").unwrap();
        fs::set_permissions(index.path(), fs::Permissions::from_mode(0o640)).unwrap();

        index.insert("anthropic").unwrap();

        let mode = fs::metadata(index.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert_eq!(index.load().unwrap(), set_of(&["anthropic", "openai"]));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let (index, dir) = temp_index();
        index.insert("openai").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
