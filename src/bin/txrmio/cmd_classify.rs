use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;

use TxrmIO::catalogue::PathCatalogue;
use TxrmIO::classify::{self, sample_std_dev, ConstArrays};
use TxrmIO::codec::decode_f32s;
use TxrmIO::consts::{DTORA_DISTANCE_PATH, STORA_DISTANCE_PATH};
use TxrmIO::image::Geometry;
use TxrmIO::meta::MetadataRegistry;
use TxrmIO::{CfbStorage, OpenMode, Storage, TxrmConfig};

/// CLI: classify - что discovery сделал бы при write-open, без открытия на запись.
pub fn exec(path: PathBuf, threshold: Option<f64>, json: bool) -> Result<()> {
    let threshold = threshold.unwrap_or_else(|| TxrmConfig::from_env().const_deviation_threshold);
    let mut storage = CfbStorage::open(&path, OpenMode::Read)?;
    let cat = PathCatalogue::build(&storage)?;
    let registry = MetadataRegistry::builtin();
    let g = Geometry::read(&mut storage, &registry)?;

    let mut seeded = ConstArrays::new();
    for p in [DTORA_DISTANCE_PATH, STORA_DISTANCE_PATH] {
        if let Some(bytes) = storage.read_stream(p)? {
            seeded.insert(
                p.to_string(),
                decode_f32s(&bytes).with_context(|| format!("decode '{}'", p))?,
            );
        }
    }

    let found = classify::discover(&mut storage, &cat, &registry, &seeded, g.count, threshold)?;

    if json {
        let consts: Vec<_> = found
            .consts
            .iter()
            .map(|(p, v)| json!({"path": p, "std": sample_std_dev(v)}))
            .collect();
        let dynamics: Vec<_> = found
            .dynamics
            .iter()
            .map(|d| json!({"path": d.path, "name": d.name, "std": sample_std_dev(&d.values)}))
            .collect();
        let out = json!({
            "images": g.count,
            "threshold": threshold,
            "seeded": seeded.keys().collect::<Vec<_>>(),
            "const": consts,
            "dynamic": dynamics,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("images: {}, threshold: {}", g.count, threshold);
    for p in seeded.keys() {
        println!("seeded   {}", p);
    }
    for (p, v) in &found.consts {
        println!("const    {} (std={:.6})", p, sample_std_dev(v));
    }
    for d in &found.dynamics {
        println!(
            "dynamic  {} -> {} (std={:.6})",
            d.path,
            d.name,
            sample_std_dev(&d.values)
        );
    }
    Ok(())
}
