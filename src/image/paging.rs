//! Page addressing: image k (1-based) lives at `ImageData{ceil(k/100)}/Image{k}`.

use crate::consts::{IMAGES_PER_PAGE, IMAGE_PREFIX, PAGE_PREFIX};

/// Page number (1-based) holding image `k` (1-based). `k == 0` maps to page 0.
#[inline]
pub fn page_of(k: usize) -> usize {
    (k + IMAGES_PER_PAGE - 1) / IMAGES_PER_PAGE
}

/// Pages needed for `count` images.
#[inline]
pub fn pages_for(count: usize) -> usize {
    page_of(count)
}

pub fn page_name(p: usize) -> String {
    format!("{}{}", PAGE_PREFIX, p)
}

pub fn image_name(k: usize) -> String {
    format!("{}{}", IMAGE_PREFIX, k)
}

pub fn image_path(k: usize) -> String {
    format!("{}/{}", page_name(page_of(k)), image_name(k))
}

/// Global image indices (1-based) stored on page `p`, capped at `count`.
pub fn page_images(p: usize, count: usize) -> std::ops::RangeInclusive<usize> {
    let first = (p - 1) * IMAGES_PER_PAGE + 1;
    let last = (p * IMAGES_PER_PAGE).min(count);
    first..=last
}

/// Parse `Image{k}` back to `k`.
pub fn parse_image_name(name: &str) -> Option<usize> {
    name.strip_prefix(IMAGE_PREFIX)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressing() {
        assert_eq!(page_of(1), 1);
        assert_eq!(page_of(100), 1);
        assert_eq!(page_of(101), 2);
        assert_eq!(page_of(250), 3);
        assert_eq!(pages_for(0), 0);
        assert_eq!(image_path(1), "ImageData1/Image1");
        assert_eq!(image_path(201), "ImageData3/Image201");
        assert_eq!(page_images(3, 250), 201..=250);
        assert_eq!(page_images(1, 250).count(), 100);
        assert_eq!(parse_image_name("Image42"), Some(42));
        assert_eq!(parse_image_name("Imagex"), None);
    }
}
