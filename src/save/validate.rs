//! Pre-save validation: every per-image field and the stack against number_of_images.
//! All violations are collected and reported together.

use anyhow::Result;

use super::SaveInput;
use crate::consts::{F_IMAGE_HEIGHT, F_IMAGE_WIDTH, F_NUMBER_OF_IMAGES};
use crate::error::{LengthViolation, TxrmError};
use crate::image::scalar_u32;
use crate::meta::FieldRole;

/// Returns the authoritative image count when everything matches.
pub fn validate(input: &SaveInput<'_>) -> Result<usize> {
    let count = scalar_u32(input.meta.get(F_NUMBER_OF_IMAGES), F_NUMBER_OF_IMAGES)? as usize;
    let mut violations = Vec::new();

    for field in input.registry.fields() {
        if field.role != FieldRole::PerImage {
            continue;
        }
        if let Some(v) = input.meta.get(&field.name) {
            if v.len() != count {
                violations.push(LengthViolation {
                    field: field.name.clone(),
                    expected: count,
                    actual: v.len(),
                });
            }
        }
    }

    if let Some(stack) = input.images {
        if stack.len() != count {
            violations.push(LengthViolation {
                field: "images".to_string(),
                expected: count,
                actual: stack.len(),
            });
        }
        let (h, w) = stack.frame_dim();
        let height = scalar_u32(input.meta.get(F_IMAGE_HEIGHT), F_IMAGE_HEIGHT)? as usize;
        let width = scalar_u32(input.meta.get(F_IMAGE_WIDTH), F_IMAGE_WIDTH)? as usize;
        if h != height {
            violations.push(LengthViolation {
                field: "images.height".to_string(),
                expected: height,
                actual: h,
            });
        }
        if w != width {
            violations.push(LengthViolation {
                field: "images.width".to_string(),
                expected: width,
                actual: w,
            });
        }
    }

    if !violations.is_empty() {
        return Err(TxrmError::Validation(violations).into());
    }
    Ok(count)
}
