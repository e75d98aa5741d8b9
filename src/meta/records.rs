//! Fixed-width text records and the motor position table.
//!
//! Dates, axis names and axis units are stored as consecutive 40-byte records:
//! ASCII text, NUL padding, sometimes trailing instrument bytes after the NUL.

use anyhow::{anyhow, Result};
use ndarray::Array2;

use crate::codec::decode_f32s;
use crate::consts::{
    AXIS_NAMES_PATH, DATES_PATH, IDEAL_MOTOR_POSITIONS_PATH, MOTOR_POSITIONS_PATH,
    RAW_MOTOR_POSITIONS_PATH, RECORD_WIDTH,
};
use crate::storage::Storage;

/// Split a payload into 40-byte records; each record is its text up to the first NUL.
/// A trailing partial record is kept.
pub fn split_records(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(RECORD_WIDTH)
        .map(|rec| {
            let end = rec.iter().position(|&b| b == 0).unwrap_or(rec.len());
            String::from_utf8_lossy(&rec[..end]).trim().to_string()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotorTable {
    pub axis_names: Vec<String>,
    pub units: Vec<String>,
    /// Shape (rows, axes): one row per image.
    pub positions: Array2<f32>,
    pub raw: Option<Array2<f32>>,
    pub ideal: Option<Array2<f32>>,
}

impl MotorTable {
    pub fn axes(&self) -> usize {
        self.axis_names.len()
    }

    /// Column of one axis by name.
    pub fn axis(&self, name: &str) -> Option<Vec<f32>> {
        let idx = self.axis_names.iter().position(|n| n == name)?;
        Some(self.positions.column(idx).to_vec())
    }
}

fn positions_table(bytes: &[u8], axes: usize, what: &str) -> Result<Array2<f32>> {
    let flat = decode_f32s(bytes)?;
    if flat.len() % axes != 0 {
        return Err(anyhow!(
            "{}: {} position(s) is not a multiple of {} axes",
            what,
            flat.len(),
            axes
        ));
    }
    let rows = flat.len() / axes;
    Ok(Array2::from_shape_vec((rows, axes), flat)?)
}

pub fn motor_table(
    names: &[u8],
    units: &[u8],
    positions: &[u8],
    raw: Option<&[u8]>,
    ideal: Option<&[u8]>,
) -> Result<MotorTable> {
    let axis_names = split_records(names);
    let units = split_records(units);
    let axes = axis_names.len();
    if axes == 0 {
        return Err(anyhow!("motor table: no axis names"));
    }
    Ok(MotorTable {
        positions: positions_table(positions, axes, "motor positions")?,
        raw: raw
            .map(|b| positions_table(b, axes, "raw motor positions"))
            .transpose()?,
        ideal: ideal
            .map(|b| positions_table(b, axes, "ideal motor positions"))
            .transpose()?,
        axis_names,
        units,
    })
}

fn cut_stream<S: Storage + ?Sized>(storage: &mut S, path: &str, len: usize) -> Result<bool> {
    match storage.read_stream(path)? {
        Some(bytes) if bytes.len() > len => {
            storage.write_stream(path, &bytes[..len])?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Cut the per-image record streams (dates, motor tables) to their first `keep`
/// rows. Absent streams are skipped. Returns the number of streams rewritten.
pub fn truncate_records<S: Storage + ?Sized>(storage: &mut S, keep: usize) -> Result<usize> {
    let mut cut = 0usize;
    if cut_stream(storage, DATES_PATH, keep * RECORD_WIDTH)? {
        cut += 1;
    }
    let axes = match storage.read_stream(AXIS_NAMES_PATH)? {
        Some(names) => split_records(&names).len(),
        None => 0,
    };
    if axes > 0 {
        let row = axes * 4;
        for path in [
            MOTOR_POSITIONS_PATH,
            RAW_MOTOR_POSITIONS_PATH,
            IDEAL_MOTOR_POSITIONS_PATH,
        ] {
            if cut_stream(storage, path, keep * row)? {
                cut += 1;
            }
        }
    }
    Ok(cut)
}
