use enrichor_core::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Replace `path` with `bytes` via write-temp, fsync, rename.
///
/// The temporary file lives next to the target so the rename stays on one
/// file system. On failure the temporary is removed and the previous content
/// of `path` is left untouched.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::persistence(parent, e))?;
    }

    let tmp_path = temp_path(path);
    if let Err(e) = write_and_rename(&tmp_path, path, bytes).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(Error::persistence(path, e));
    }
    Ok(())
}

async fn write_and_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp_path, path).await
}

/// `dir/.name.tmp` for `dir/name`.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}
