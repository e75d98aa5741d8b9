//! save - staged, validated persistence of a session.
//!
//! - plan.rs     - SavePlan/PlanOp: ordered mutations, applied by Storage::commit
//! - validate.rs - aggregated length/shape checks against number_of_images
//! - engine.rs   - build_plan: prune, images, fan-out, const arrays; SaveReport

pub mod engine;
pub mod plan;
pub mod validate;

use crate::classify::ConstArrays;
use crate::config::AngleUnit;
use crate::image::PixelStack;
use crate::meta::{MetaMap, MetadataRegistry};

pub use engine::{build_plan, SaveReport};
pub use plan::{PlanOp, SavePlan};
pub use validate::validate;

/// Borrowed session state consumed by the engine.
pub struct SaveInput<'a> {
    pub registry: &'a MetadataRegistry,
    pub meta: &'a MetaMap,
    pub const_arrays: &'a ConstArrays,
    /// None when images were not loaded: pages are left as they are.
    pub images: Option<&'a PixelStack>,
    pub angle_unit: AngleUnit,
}
