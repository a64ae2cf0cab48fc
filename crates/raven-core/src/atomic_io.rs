use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::time_utils::current_unix_timestamp_ms;

/// Writes text using a temp file + rename so readers never observe partial data.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    write_bytes_atomic(path, content.as_bytes())
}

/// Writes raw bytes using a temp file + rename.
///
/// On any failure the temp file is removed, so the destination either holds the
/// previous content or the complete new content.
pub fn write_bytes_atomic(path: &Path, content: &[u8]) -> Result<()> {
    write_atomic(path, content, false)
}

/// Same as [`write_bytes_atomic`], but restricts the file to the owner (0600 on unix).
pub fn write_secret_atomic(path: &Path, content: &[u8]) -> Result<()> {
    write_atomic(path, content, true)
}

fn write_atomic(path: &Path, content: &[u8], owner_only: bool) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("destination path cannot be empty");
    }
    if path.exists() && path.is_dir() {
        bail!("destination path '{}' is a directory", path.display());
    }

    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("failed to create {}", parent_dir.display()))?;

    let temp_path = temp_path_for(parent_dir, path);
    let result = write_and_rename(&temp_path, path, content, owner_only);
    if result.is_err() && temp_path.exists() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

fn temp_path_for(parent_dir: &Path, path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.tmp-{}-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("raven-state"),
        std::process::id(),
        current_unix_timestamp_ms()
    );
    parent_dir.join(temp_name)
}

fn write_and_rename(temp_path: &Path, path: &Path, content: &[u8], owner_only: bool) -> Result<()> {
    std::fs::write(temp_path, content)
        .with_context(|| format!("failed to write temporary file {}", temp_path.display()))?;
    if owner_only {
        restrict_to_owner(temp_path)?;
    }
    std::fs::rename(temp_path, path).with_context(|| {
        format!(
            "failed to rename temporary file {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

/// Removes `path` if present. Returns `Ok(true)` when a file was deleted.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(error) => {
            Err(error).with_context(|| format!("failed to remove {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{remove_file_if_exists, write_bytes_atomic, write_secret_atomic, write_text_atomic};

    #[test]
    fn unit_write_text_atomic_replaces_existing_content_without_leftovers() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state/record.json");
        write_text_atomic(&path, "first").expect("first write");
        write_text_atomic(&path, "second").expect("second write");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "second");
        let entries = std::fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .count();
        assert_eq!(entries, 1, "temp files must not survive a successful write");
    }

    #[test]
    fn regression_write_into_directory_destination_fails_without_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("occupied");
        std::fs::create_dir_all(&path).expect("mkdir");

        let error = write_bytes_atomic(&path, b"payload").expect_err("directory target");
        assert!(error.to_string().contains("is a directory"));
        assert_eq!(std::fs::read_dir(temp.path()).expect("read dir").count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn unit_write_secret_atomic_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("secret.bin");
        write_secret_atomic(&path, &[7u8; 32]).expect("write secret");

        let mode = std::fs::metadata(&path).expect("stat").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read(&path).expect("read"), vec![7u8; 32]);
    }

    #[test]
    fn unit_remove_file_if_exists_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("gone.json");
        std::fs::write(&path, "{}").expect("write");

        assert!(remove_file_if_exists(&path).expect("first remove"));
        assert!(!remove_file_if_exists(&path).expect("second remove"));
    }
}
