use anyhow::{anyhow, Result};
use std::path::PathBuf;

use TxrmIO::{TxrmConfig, TxrmFile, OpenMode};

/// CLI: meta - декодированные поля registry в JSON (angles в рабочей единице).
pub fn exec(path: PathBuf, field: Option<String>) -> Result<()> {
    let cfg = TxrmConfig::from_env().with_eager_images(false);
    let f = TxrmFile::open_with_config(&path, OpenMode::Read, cfg)?;
    let out = match field {
        Some(name) => f
            .meta()
            .get(&name)
            .map(|v| v.to_json())
            .ok_or_else(|| anyhow!("no metadata field '{}'", name))?,
        None => serde_json::Value::Object(
            f.meta()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        ),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
