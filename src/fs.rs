//! Filesystem helpers

use std::path::Path;

use tokio::fs::DirBuilder;

use crate::error::Result;

/// Permission bits for directories created by the toolkit (rwxr-xr-x)
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Create `path` and any missing parents
///
/// Succeeds when the directory already exists.
pub async fn create_dir_if_not_exist(path: impl AsRef<Path>) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(path.as_ref()).await?;
    Ok(())
}
