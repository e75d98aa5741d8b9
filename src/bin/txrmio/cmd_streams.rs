use anyhow::Result;
use std::path::PathBuf;

use TxrmIO::catalogue::PathCatalogue;
use TxrmIO::{CfbStorage, OpenMode};

/// CLI: streams - все пути streams (отсортированы), опционально под префиксом.
pub fn exec(path: PathBuf, prefix: Option<String>, json: bool) -> Result<()> {
    let storage = CfbStorage::open(&path, OpenMode::Read)?;
    let cat = PathCatalogue::build(&storage)?;
    let paths: Vec<&str> = match prefix.as_deref() {
        Some(p) => cat.under(p).collect(),
        None => cat.iter().collect(),
    };
    if json {
        println!("{}", serde_json::to_string(&paths)?);
    } else {
        for p in &paths {
            println!("{}", p);
        }
        println!("-- {} stream(s)", paths.len());
    }
    Ok(())
}
