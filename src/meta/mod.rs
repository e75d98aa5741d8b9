//! meta - metadata model: field registry (redundant paths) and fixed-width records.
//!
//! - registry.rs - MetadataRegistry/FieldSpec/FieldRole: canonical read, fan-out write
//! - records.rs  - 40-byte text records (dates, axis names/units), MotorTable

pub mod records;
pub mod registry;

use std::collections::BTreeMap;

use crate::value::Value;

pub use records::{motor_table, split_records, truncate_records, MotorTable};
pub use registry::{FieldRole, FieldSpec, MetadataRegistry};

/// In-memory metadata mapping: field name -> current (working-unit) value.
pub type MetaMap = BTreeMap<String, Value>;
