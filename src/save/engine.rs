//! engine - builds the full SavePlan for a session state.
//!
//! Порядок: validate -> prune pages -> images -> metadata fan-out (angles в градусах)
//! -> const arrays (pad/truncate). Ничего не пишет сам: только записывает операции.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

use super::plan::SavePlan;
use super::validate::validate;
use super::SaveInput;
use crate::catalogue::PathCatalogue;
use crate::classify::fit_to_count;
use crate::codec::{encode_f32s, PixelKind};
use crate::consts::{F_ANGLES, F_IMAGE_DATA_TYPE};
use crate::image::paging::{image_path, page_images, page_name, pages_for, parse_image_name};
use crate::image::scalar_u32;
use crate::storage::leaf_name;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub images: usize,
    pub pages_written: usize,
    pub pages_pruned: usize,
    pub images_pruned: usize,
    pub streams_written: usize,
    pub bytes_written: u64,
}

/// Destroy pages past `pages` up to the first gap, and stale `Image{k > count}`
/// entries inside the last kept page. Returns (pages, images) removed.
fn plan_prune(plan: &mut SavePlan, catalogue: &PathCatalogue, count: usize) -> (usize, usize) {
    let pages = pages_for(count);
    let mut pruned_pages = 0usize;
    let mut q = pages + 1;
    while catalogue.exists(&page_name(q)) {
        plan.destroy(page_name(q));
        pruned_pages += 1;
        q += 1;
    }

    let mut pruned_images = 0usize;
    if pages > 0 {
        for path in catalogue.under(&page_name(pages)) {
            if let Some(k) = parse_image_name(leaf_name(path)) {
                if k > count {
                    plan.destroy(path);
                    pruned_images += 1;
                }
            }
        }
    }
    (pruned_pages, pruned_images)
}

pub fn build_plan(input: &SaveInput<'_>, catalogue: &PathCatalogue) -> Result<(SavePlan, SaveReport)> {
    // 1) validate
    let count = validate(input)?;
    let mut plan = SavePlan::new();
    let mut report = SaveReport {
        images: count,
        ..Default::default()
    };

    if let Some(stack) = input.images {
        // 2) prune
        let (pp, pi) = plan_prune(&mut plan, catalogue, count);
        report.pages_pruned = pp;
        report.images_pruned = pi;

        // 3) images, in the dtype declared by image_data_type
        let code = scalar_u32(input.meta.get(F_IMAGE_DATA_TYPE), F_IMAGE_DATA_TYPE)?;
        let kind = PixelKind::from_type_code(code, "image")?;
        let pages = pages_for(count);
        for p in 1..=pages {
            plan.create_storage(page_name(p));
            for k in page_images(p, count) {
                plan.write(image_path(k), stack.frame_bytes(k - 1, kind));
            }
        }
        report.pages_written = pages;
        debug!("save: {} image(s) on {} page(s) as {:?}", count, pages, kind);
    }

    // 4) + 5) metadata fan-out; angles go back to degrees in the payload only
    for field in input.registry.fields() {
        let value = match input.meta.get(&field.name) {
            Some(v) => v,
            None => continue,
        };
        if field.name == F_ANGLES {
            let unit = input.angle_unit;
            let stored = value.map_f32(|a| unit.to_degrees(a));
            input.registry.write_back(&mut plan, &field.name, &stored)?;
        } else {
            input
                .registry
                .write_back(&mut plan, &field.name, value)
                .with_context(|| format!("stage field '{}'", field.name))?;
        }
    }

    // 6) const arrays: pad with the mean / truncate
    for (path, values) in input.const_arrays {
        plan.write(path.clone(), encode_f32s(&fit_to_count(values, count)));
    }

    report.streams_written = plan.streams_written();
    report.bytes_written = plan.bytes_total();
    Ok((plan, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemStorage, Storage};

    #[test]
    fn prune_stops_at_first_gap() -> Result<()> {
        let mut s = MemStorage::new();
        for k in 1..=100usize {
            s.write_stream(&image_path(k), &[0u8; 2])?;
        }
        s.write_stream("ImageData2/Image101", &[0u8; 2])?;
        s.write_stream("ImageData3/Image201", &[0u8; 2])?;
        // gap at page 4, page 5 survives
        s.write_stream("ImageData5/Image401", &[0u8; 2])?;
        let cat = PathCatalogue::build(&s)?;

        let mut plan = SavePlan::new();
        let (pages, images) = plan_prune(&mut plan, &cat, 50);
        assert_eq!(pages, 2);
        assert_eq!(images, 50);
        s.commit(&plan)?;
        let cat = PathCatalogue::build(&s)?;
        assert!(!cat.exists("ImageData2"));
        assert!(!cat.exists("ImageData3"));
        assert!(cat.exists("ImageData5"));
        assert!(cat.is_stream("ImageData1/Image50"));
        assert!(!cat.is_stream("ImageData1/Image51"));
        Ok(())
    }
}
