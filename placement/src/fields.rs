//! Scalar-field plumbing shared by the allocator and the hatcher. All
//! heavy per-cell work goes through imageproc primitives instead of nested
//! coordinate loops.

use grid::{CoordType, DynamicGrid};
use image::{GrayImage, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::region_labelling::{connected_components, Connectivity};

pub fn mask_to_image(mask: &DynamicGrid<bool>) -> GrayImage {
    let [w, h] = mask.dimensions();
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        if mask[[x as usize, y as usize]] {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// L2 distance of every masked cell to the nearest unmasked cell.
/// imageproc measures distance to the nearest foreground pixel, so the
/// mask is inverted on the way in; masked cells then read distance to the
/// outside, unmasked cells read 0.
pub fn distance_from_edge(mask: &DynamicGrid<bool>) -> DynamicGrid<f64> {
    let [w, h] = mask.dimensions();

    let inverse = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        if mask[[x as usize, y as usize]] {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });

    let squared = euclidean_squared_distance_transform(&inverse);

    let mut out = DynamicGrid::new([w, h]);
    for ([x, y], value) in out.iter_coords_mut() {
        *value = squared.get_pixel(x as u32, y as u32).0[0].sqrt();
    }
    out
}

/// 4-connected components of the mask. 0 is background, components are
/// numbered from 1
pub fn label_components(mask: &DynamicGrid<bool>) -> (DynamicGrid<u32>, u32) {
    let [w, h] = mask.dimensions();
    let labelled = connected_components(&mask_to_image(mask), Connectivity::Four, Luma([0u8]));

    let mut out = DynamicGrid::new([w, h]);
    let mut max_label = 0;
    for ([x, y], value) in out.iter_coords_mut() {
        let label = labelled.get_pixel(x as u32, y as u32).0[0];
        *value = label;
        max_label = max_label.max(label);
    }

    (out, max_label)
}

/// Distance of every masked cell from the centroid of its connected
/// component, 0 elsewhere
pub fn centroid_distance_field(mask: &DynamicGrid<bool>) -> DynamicGrid<f64> {
    let (components, count) = label_components(mask);
    let mut out = DynamicGrid::new(mask.dimensions());

    if count == 0 {
        return out;
    }

    // centroid per component
    let mut sums = vec![(0.0f64, 0.0f64, 0usize); count as usize + 1];
    for ([x, y], &label) in components.iter_coords() {
        if label > 0 {
            let entry = &mut sums[label as usize];
            entry.0 += x as f64;
            entry.1 += y as f64;
            entry.2 += 1;
        }
    }

    let centroids = sums
        .iter()
        .map(|&(sx, sy, n)| {
            if n > 0 {
                (sx / n as f64, sy / n as f64)
            } else {
                (0.0, 0.0)
            }
        })
        .collect::<Vec<_>>();

    for ([x, y], value) in out.iter_coords_mut() {
        let label = components[[x, y]];
        if label > 0 {
            let (cx, cy) = centroids[label as usize];
            *value = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
        }
    }

    out
}

#[inline]
pub fn euclidean(a: CoordType, b: CoordType) -> f64 {
    let dx = a[0] as f64 - b[0] as f64;
    let dy = a[1] as f64 - b[1] as f64;
    (dx * dx + dy * dy).sqrt()
}

/// (min, max) over the field, or None for an empty grid
pub fn min_max(field: &DynamicGrid<f64>) -> (f64, f64) {
    field.iter().fold((f64::MAX, f64::MIN), |(min, max), &v| {
        (min.min(v), max.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask(dims: [usize; 2], from: [usize; 2], to: [usize; 2]) -> DynamicGrid<bool> {
        let mut mask = DynamicGrid::new(dims);
        for x in from[0]..=to[0] {
            for y in from[1]..=to[1] {
                mask[[x, y]] = true;
            }
        }
        mask
    }

    #[test]
    fn distance_is_zero_outside_and_grows_inward() {
        let mask = square_mask([9, 9], [2, 2], [6, 6]);
        let dist = distance_from_edge(&mask);

        assert_eq!(dist[[0, 0]], 0.0);
        assert_eq!(dist[[1, 4]], 0.0);

        // one cell in from the mask edge
        assert_eq!(dist[[2, 4]], 1.0);
        // centre of a 5x5 block is 3 cells from the outside
        assert_eq!(dist[[4, 4]], 3.0);
    }

    #[test]
    fn components_are_separated() {
        let mut mask = square_mask([10, 10], [0, 0], [2, 2]);
        for x in 6..9 {
            for y in 6..9 {
                mask[[x, y]] = true;
            }
        }

        let (components, count) = label_components(&mask);
        assert_eq!(count, 2);
        assert_ne!(components[[0, 0]], 0);
        assert_ne!(components[[7, 7]], 0);
        assert_ne!(components[[0, 0]], components[[7, 7]]);
        assert_eq!(components[[4, 4]], 0);
    }

    #[test]
    fn centroid_distance_peaks_at_corners() {
        let mask = square_mask([9, 9], [2, 2], [6, 6]);
        let field = centroid_distance_field(&mask);

        assert_eq!(field[[4, 4]], 0.0);
        assert!(field[[2, 2]] > field[[3, 4]]);
        assert_eq!(field[[0, 0]], 0.0); // outside the mask
    }
}
