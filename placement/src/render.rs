//! Png rendering of finished compositions, for the binary and for eyeballing
//! test output.

use common::*;
use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::compose::CompositionData;

const COLOUR_BACKGROUND: [u8; 4] = [169, 169, 169, 255];
const COLOUR_PLANTABLE: [u8; 4] = [204, 255, 229, 255];
const COLOUR_TREE: [u8; 4] = [0, 51, 25, 255];
const COLOUR_SHRUB: [u8; 4] = [0, 204, 0, 255];

fn colour_for(code: u8) -> Rgba<u8> {
    Rgba(match code {
        0 => COLOUR_BACKGROUND,
        1 => COLOUR_PLANTABLE,
        2 => COLOUR_TREE,
        _ => COLOUR_SHRUB,
    })
}

pub fn render_composition(composition: &CompositionData, scale: u32) -> RgbaImage {
    let h = composition.grid.len() as u32;
    let w = composition.grid.first().map(Vec::len).unwrap_or(0) as u32;

    let mut image = RgbaImage::new(w * scale, h * scale);
    for (y, row) in composition.grid.iter().enumerate() {
        for (x, &code) in row.iter().enumerate() {
            let colour = colour_for(code);
            for dy in 0..scale {
                for dx in 0..scale {
                    image.put_pixel(x as u32 * scale + dx, y as u32 * scale + dy, colour);
                }
            }
        }
    }

    image
}

pub fn save(image: &RgbaImage, path: impl AsRef<Path>) -> BoxedResult<()> {
    let path = path.as_ref();
    image.save(path)?;
    info!("saved image to {file}", file = path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn one_cell_per_code_at_scale() {
        let composition = CompositionData {
            grid: vec![vec![0, 1], vec![2, 3]],
            coordinates: BTreeMap::new(),
            data_value: 0,
            surrounding_context: crate::params::Surrounding::Walkway,
        };

        let image = render_composition(&composition, 2);
        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(*image.get_pixel(0, 0), Rgba(COLOUR_BACKGROUND));
        assert_eq!(*image.get_pixel(2, 0), Rgba(COLOUR_PLANTABLE));
        assert_eq!(*image.get_pixel(0, 2), Rgba(COLOUR_TREE));
        assert_eq!(*image.get_pixel(3, 3), Rgba(COLOUR_SHRUB));
    }
}
