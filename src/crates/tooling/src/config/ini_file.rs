//! INI file configuration source

use super::ConfigSource;
use crate::{Result, ToolingError};
use ini::Ini;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration source backed by an INI file
///
/// Values are read from the copy loaded by [`open`](Self::open);
/// [`set_value`](Self::set_value) updates that copy and writes the whole
/// file back.
pub struct IniSource {
    path: PathBuf,
    ini: Ini,
}

impl IniSource {
    /// Load an INI file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let ini = Ini::load_from_file(&path)?;
        tracing::debug!(path = %path.display(), "Loaded INI config");
        Ok(Self { path, ini })
    }

    /// Path the source was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all named sections, in file order
    pub fn sections(&self) -> Vec<String> {
        self.ini.sections().flatten().map(str::to_string).collect()
    }

    /// Set a value and persist the file
    pub fn set_value(&mut self, section: &str, key: &str, value: impl ToString) -> Result<()> {
        self.ini
            .with_section(Some(section))
            .set(key, value.to_string());
        self.ini.write_to_file(&self.path)?;
        Ok(())
    }

    /// Re-read the file from disk
    pub fn reload(&mut self) -> Result<()> {
        self.ini = Ini::load_from_file(&self.path)?;
        Ok(())
    }
}

impl fmt::Debug for IniSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IniSource").field("path", &self.path).finish_non_exhaustive()
    }
}

impl ConfigSource for IniSource {
    fn section(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let props = self.ini.section(Some(name)).ok_or_else(|| {
            ToolingError::Config(format!(
                "Section [{}] not found in {}",
                name,
                self.path.display()
            ))
        })?;
        Ok(props.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    fn value(&self, section: &str, key: &str) -> Result<Option<String>> {
        Ok(self.section(section)?.remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = "[mysql]\nhost = 10.0.0.5\nport = 3306\nuser = admin\n\n[redis]\nhost = 10.0.0.6\n";

    fn write_sample() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    #[test]
    fn test_section_and_value() {
        let (_dir, path) = write_sample();
        let source = IniSource::open(&path).unwrap();

        let mysql = source.section("mysql").unwrap();
        assert_eq!(mysql.len(), 3);
        assert_eq!(mysql["host"], "10.0.0.5");
        assert_eq!(source.value("redis", "host").unwrap().as_deref(), Some("10.0.0.6"));
        assert!(source.value("redis", "port").unwrap().is_none());
        assert_eq!(source.sections(), vec!["mysql", "redis"]);
    }

    #[test]
    fn test_missing_section() {
        let (_dir, path) = write_sample();
        let source = IniSource::open(&path).unwrap();
        assert!(matches!(source.section("minio"), Err(ToolingError::Config(_))));
    }

    #[test]
    fn test_set_value_persists() {
        let (_dir, path) = write_sample();
        let mut source = IniSource::open(&path).unwrap();
        source.set_value("counters", "last_image", 42).unwrap();

        let reopened = IniSource::open(&path).unwrap();
        assert_eq!(reopened.value("counters", "last_image").unwrap().as_deref(), Some("42"));
        assert_eq!(reopened.value("mysql", "user").unwrap().as_deref(), Some("admin"));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(IniSource::open(dir.path().join("absent.ini")).is_err());
    }
}
