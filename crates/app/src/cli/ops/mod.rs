pub mod init;
pub mod open;
pub mod seal;
pub mod version;

pub use init::Init;
pub use open::Open;
pub use seal::Seal;
pub use version::Version;

use std::io::{self, Write};
use std::path::Path;

/// Write `contents` to `path` through a temporary file in the same directory
///
/// The destination is only replaced once every byte is on disk, so a failed
/// write never leaves a truncated output behind.
pub(crate) fn write_output(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
