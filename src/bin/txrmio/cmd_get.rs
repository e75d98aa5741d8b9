use anyhow::Result;
use std::path::PathBuf;

use TxrmIO::{CfbStorage, OpenMode, Storage};

use super::util::{display_text, hex_dump, write_file};

pub fn exec(path: PathBuf, stream: String, out: Option<PathBuf>) -> Result<()> {
    let mut storage = CfbStorage::open(&path, OpenMode::Read)?;
    match storage.read_stream(&stream)? {
        Some(v) => {
            if let Some(out_path) = out {
                write_file(&out_path, &v)?;
                println!(
                    "FOUND '{}': {} B -> wrote to {}",
                    stream,
                    v.len(),
                    out_path.display()
                );
            } else {
                println!("FOUND '{}': {} B", stream, v.len());
                println!("text: {}", display_text(&v));
                println!("hex:  {}", hex_dump(&v[..v.len().min(64)]));
            }
        }
        None => println!("NOT FOUND '{}'", stream),
    }
    Ok(())
}
