use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use TxrmIO::metrics;
use TxrmIO::{TxrmConfig, TxrmFile, OpenMode};

/// CLI: status - геометрия, счётчики полей/streams, const arrays. Пиксели не читаются.
pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let cfg = TxrmConfig::from_env().with_eager_images(false);
    let f = TxrmFile::open_with_config(&path, OpenMode::Read, cfg)?;
    let g = f.geometry()?;
    let pages = TxrmIO::image::pages_for(g.count);
    let has_reference = f.reference().is_some();

    if json {
        let consts: serde_json::Map<String, serde_json::Value> = f
            .const_arrays()
            .iter()
            .map(|(p, v)| (p.clone(), json!(v.len())))
            .collect();
        let out = json!({
            "path": f.path().display().to_string(),
            "geometry": {
                "images": g.count,
                "height": g.height,
                "width": g.width,
                "image_type_code": g.kind.type_code(),
                "reference_type_code": g.reference_code,
                "pages": pages,
            },
            "reference": has_reference,
            "pixel_size": f.pixel_size(),
            "fields": f.meta().len(),
            "streams": f.catalogue().len(),
            "const_arrays": consts,
            "metrics": metrics::snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("path:        {}", f.path().display());
    println!(
        "images:      {} x {}x{} ({:?}, code {})",
        g.count,
        g.height,
        g.width,
        g.kind,
        g.kind.type_code()
    );
    println!("pages:       {}", pages);
    println!(
        "reference:   {}",
        if has_reference { "present" } else { "absent" }
    );
    if let Some(px) = f.pixel_size() {
        println!("pixel_size:  {}", px);
    }
    println!("fields:      {}", f.meta().len());
    println!("streams:     {}", f.catalogue().len());
    for (p, v) in f.const_arrays() {
        println!("const:       {} ({} value(s))", p, v.len());
    }
    let ms = metrics::snapshot();
    println!(
        "io:          {} stream(s) read, {} B (avg {:.1} B)",
        ms.streams_read,
        ms.bytes_read,
        ms.avg_stream_read_bytes()
    );
    Ok(())
}
