use anyhow::Result;
use std::path::PathBuf;

use TxrmIO::catalogue::PathCatalogue;
use TxrmIO::{CfbStorage, OpenMode};

/// CLI: exists - stream или storage, содержащий хотя бы один stream.
pub fn exec(path: PathBuf, stream: String) -> Result<()> {
    let storage = CfbStorage::open(&path, OpenMode::Read)?;
    let cat = PathCatalogue::build(&storage)?;
    if cat.exists(&stream) {
        println!("FOUND '{}'", stream);
    } else {
        println!("NOT FOUND '{}'", stream);
    }
    Ok(())
}
