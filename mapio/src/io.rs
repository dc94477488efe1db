use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

pub fn file_exists<I: AsRef<str>>(path: I) -> bool {
    Path::new(path.as_ref()).exists()
}

/// Read the entire file. The error names the path.
pub fn slurp_file<I: AsRef<str>>(path: I) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs_err::read(path).with_context(|| format!("Can't read {}", path))
}

pub fn create_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs_err::create_dir_all(parent)?;
            info!("Created {}", parent.display());
        }
    }
    Ok(())
}

/// Write bytes to a file, creating its parent directory if needed.
pub fn write_file(path: &str, contents: &[u8]) -> Result<()> {
    create_parent_dir(path)?;
    fs_err::write(path, contents)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let bytes = slurp_file(path)?;
    serde_json::from_slice(&bytes).with_context(|| format!("Can't parse JSON from {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parent_dirs() {
        let dir = std::env::temp_dir().join("mapio_json_round_trip");
        let path = dir.join("nested/value.json").display().to_string();
        let _ = fs_err::remove_dir_all(&dir);

        assert!(!file_exists(&path));
        write_file(&path, b"[1, 2, 3]").unwrap();
        assert!(file_exists(&path));
        let back: Vec<u32> = read_json(&path).unwrap();
        assert_eq!(back, vec![1, 2, 3]);

        fs_err::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = slurp_file("definitely/not/here.kml").unwrap_err();
        assert!(format!("{:#}", err).contains("definitely/not/here.kml"));
    }
}
