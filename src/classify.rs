//! classify - discovery of uncatalogued per-image float arrays.
//!
//! Кандидат: stream вне registry, не seeded const, payload = ровно `image_count`
//! float32. Разброс - выборочное СКО (ddof = 1), считается в f64:
//! - std <= threshold -> ConstArray (на save: pad средним / truncate до count);
//! - std >  threshold -> DynamicArray, поле `array_<leaf>` с одним путём.
//! Всё остальное - молчаливый skip, не ошибка.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};

use crate::catalogue::PathCatalogue;
use crate::codec::decode_f32s_exact;
use crate::consts::{DYNAMIC_PREFIX, PAGE_PREFIX, REFERENCE_IMAGE_PATH};
use crate::meta::MetadataRegistry;
use crate::metrics::record_classified;
use crate::storage::{fold_path, leaf_name, Storage};

/// Quasi-constant arrays keyed by stream path.
pub type ConstArrays = BTreeMap<String, Vec<f32>>;

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicArray {
    pub name: String,
    pub path: String,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub consts: ConstArrays,
    pub dynamics: Vec<DynamicArray>,
}

/// Sample standard deviation with ddof = 1. Fewer than two samples -> 0.
pub fn sample_std_dev(values: &[f32]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let ss: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Arithmetic mean (f64 accumulator); 0 for an empty slice.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}

/// Pixel pages and the reference frame are never metadata.
fn is_pixel_stream(path: &str) -> bool {
    if path.eq_ignore_ascii_case(REFERENCE_IMAGE_PATH) {
        return true;
    }
    let head = path.get(..PAGE_PREFIX.len()).unwrap_or("");
    if !head.eq_ignore_ascii_case(PAGE_PREFIX) {
        return false;
    }
    match path.get(PAGE_PREFIX.len()..) {
        Some(rest) => {
            let digits = rest.split('/').next().unwrap_or("");
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Field name for a promoted array. Collisions with an existing field (or an
/// earlier promotion) fall back to the full path with `/` -> `_`.
fn dynamic_name(path: &str, taken: &HashSet<String>) -> String {
    let short = format!("{}{}", DYNAMIC_PREFIX, leaf_name(path));
    if !taken.contains(&short) {
        return short;
    }
    let long = format!("{}{}", DYNAMIC_PREFIX, path.replace('/', "_"));
    warn!(
        "classify: field name '{}' already taken, '{}' registered as '{}'",
        short, path, long
    );
    long
}

pub fn discover<S: Storage + ?Sized>(
    storage: &mut S,
    catalogue: &PathCatalogue,
    registry: &MetadataRegistry,
    seeded: &ConstArrays,
    image_count: usize,
    threshold: f64,
) -> Result<Discovery> {
    let claimed: HashSet<String> = registry.claimed_paths().into_iter().map(fold_path).collect();
    let seeded_keys: HashSet<String> = seeded.keys().map(|p| fold_path(p)).collect();
    let mut taken: HashSet<String> = registry.fields().iter().map(|f| f.name.clone()).collect();
    let mut out = Discovery::default();

    for path in catalogue.iter() {
        let key = fold_path(path);
        if claimed.contains(&key) || seeded_keys.contains(&key) || is_pixel_stream(path) {
            continue;
        }
        let bytes = match storage
            .read_stream(path)
            .with_context(|| format!("classify: read '{}'", path))?
        {
            Some(b) => b,
            None => continue,
        };
        let values = match decode_f32s_exact(&bytes, image_count) {
            Some(v) => v,
            None => continue,
        };
        let std = sample_std_dev(&values);
        if std <= threshold {
            debug!("classify: const {} (std={:.6})", path, std);
            out.consts.insert(path.to_string(), values);
        } else {
            let name = dynamic_name(path, &taken);
            debug!("classify: dynamic {} -> {} (std={:.6})", path, name, std);
            taken.insert(name.clone());
            out.dynamics.push(DynamicArray {
                name,
                path: path.to_string(),
                values,
            });
        }
    }

    record_classified(out.consts.len(), out.dynamics.len());
    Ok(out)
}

/// Pad with the mean of the existing values, or truncate, to exactly `count`.
pub fn fit_to_count(values: &[f32], count: usize) -> Vec<f32> {
    if values.len() >= count {
        return values[..count].to_vec();
    }
    let fill = mean(values);
    let mut out = values.to_vec();
    out.resize(count, fill);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_sample_ddof1() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[3.0]), 0.0);
        assert_eq!(sample_std_dev(&[2.0, 2.0, 2.0]), 0.0);
        // var = ((−1)^2 + 0 + 1^2) / 2 = 1
        assert!((sample_std_dev(&[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fit_pads_with_mean_and_truncates() {
        assert_eq!(fit_to_count(&[1.0, 3.0], 4), vec![1.0, 3.0, 2.0, 2.0]);
        assert_eq!(fit_to_count(&[1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
        assert_eq!(fit_to_count(&[5.0], 1), vec![5.0]);
        assert_eq!(fit_to_count(&[], 2), vec![0.0, 0.0]);
    }

    #[test]
    fn pixel_streams_are_not_candidates() {
        assert!(is_pixel_stream("ImageData1/Image1"));
        assert!(is_pixel_stream("ImageData12/Image1150"));
        assert!(is_pixel_stream("ReferenceData/Image"));
        assert!(is_pixel_stream("referencedata/Image"));
        assert!(is_pixel_stream("imagedata3/Image201"));
        assert!(!is_pixel_stream("ImageDataInfo/Foo"));
        assert!(!is_pixel_stream("ImageInfo/Angles"));
    }

    #[test]
    fn collision_falls_back_to_full_path() {
        let mut taken = HashSet::new();
        assert_eq!(dynamic_name("Temp/Sensor", &taken), "array_Sensor");
        taken.insert("array_Sensor".to_string());
        assert_eq!(dynamic_name("Other/Sensor", &taken), "array_Other_Sensor");
    }
}
