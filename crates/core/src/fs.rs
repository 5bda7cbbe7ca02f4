//! Filesystem utilities

use std::fs;
use std::io;
use std::path::Path;

use log::info;

/// Create a directory and all parent directories if they don't exist
///
/// This is a wrapper around `std::fs::create_dir_all` with logging.
pub fn create_dir_all(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        info!("created directory: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_directories_and_is_idempotent() {
        let dir = std::env::temp_dir().join("metargram-fs-test/imgs/meteogram");
        create_dir_all(&dir).unwrap();
        assert!(dir.is_dir());
        // second call is a no-op
        create_dir_all(&dir).unwrap();
        fs::remove_dir_all(std::env::temp_dir().join("metargram-fs-test")).ok();
    }
}
