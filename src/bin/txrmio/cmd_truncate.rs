use anyhow::{anyhow, Result};
use ndarray::{Axis, Slice};
use std::path::PathBuf;

use TxrmIO::meta::{truncate_records, FieldRole};
use TxrmIO::{CfbStorage, OpenMode, Storage, TxrmConfig, TxrmFile, Value};

/// Keep the leading `keep` entries along the first axis.
fn head(v: &Value, keep: usize) -> Value {
    let cut = Slice::from(..keep);
    match v {
        Value::F32Array(a) if a.ndim() > 0 && a.len_of(Axis(0)) > keep => {
            Value::F32Array(a.slice_axis(Axis(0), cut).to_owned())
        }
        Value::U32Array(a) if a.ndim() > 0 && a.len_of(Axis(0)) > keep => {
            Value::U32Array(a.slice_axis(Axis(0), cut).to_owned())
        }
        Value::U16Array(a) if a.ndim() > 0 && a.len_of(Axis(0)) > keep => {
            Value::U16Array(a.slice_axis(Axis(0), cut).to_owned())
        }
        other => other.clone(),
    }
}

/// CLI: truncate - первые N кадров + per-image массивы, save_as в новый файл,
/// затем dates/motor records в копии режутся до N строк. Исходный файл не меняется.
pub fn exec(path: PathBuf, keep: usize, out: PathBuf) -> Result<()> {
    let cfg = TxrmConfig::from_env()
        .with_overwrite(true)
        .with_eager_images(true);
    let mut f = TxrmFile::open_with_config(&path, OpenMode::Write, cfg)?;
    let count = f.number_of_images()? as usize;
    if keep == 0 || keep > count {
        return Err(anyhow!("--keep must be in 1..={}, got {}", count, keep));
    }

    let images = f
        .images()
        .ok_or_else(|| anyhow!("image stack was not loaded"))?
        .head(keep);
    f.set_images(images)?;

    let per_image: Vec<String> = f
        .state()
        .registry
        .fields()
        .iter()
        .filter(|s| s.role == FieldRole::PerImage)
        .map(|s| s.name.clone())
        .collect();
    for name in per_image {
        if let Some(v) = f.meta().get(&name) {
            let cut = head(v, keep);
            f.set_meta_value(&name, cut)?;
        }
    }

    let report = f.plan_save()?.1;
    let target = f.save_as(&out)?;
    f.close()?;

    let records = {
        let mut copy = CfbStorage::open(&target, OpenMode::Write)?;
        let n = truncate_records(&mut copy, keep)?;
        copy.flush()?;
        n
    };
    println!(
        "truncated {} -> {} image(s): {} ({} page(s), {} stream(s), {} record stream(s), {} B)",
        count,
        keep,
        target.display(),
        report.pages_written,
        report.streams_written,
        records,
        report.bytes_written
    );
    Ok(())
}
