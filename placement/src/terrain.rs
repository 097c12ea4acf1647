use common::*;
use grid::{CoordType, DynamicGrid};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_polygon_mut;
use imageproc::morphology::dilate;
use noise::{NoiseFn, Perlin, Seedable};

use crate::map_range;

/// Occupancy of one grid cell once placement has run
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    Background,
    Plantable,
    Tree,
    Shrub,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Background
    }
}

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("terrain produced no planting candidates")]
    NoCandidates,
}

/// Everything stage T hands downstream. Immutable once generated
pub struct Terrain {
    /// Outline cells of the plantable polygon
    pub boundary: DynamicGrid<bool>,
    /// Plantable interior, outline included
    pub filled: DynamicGrid<bool>,
    /// Spacing-filtered candidate positions, row-major order
    pub candidates: Vec<CoordType>,
    /// Same candidates as a grid
    pub candidate_grid: DynamicGrid<bool>,
    /// The noise seed that produced this terrain
    pub seed: u64,
}

pub struct TerrainGenerator {
    octave: f64,
    seed: Option<u64>,
    dims: [usize; 2],
    minimum_distance: f64,
    padded_boundary: usize,
    min_coverage: f64,
}

/// Normalised 4x4 Bayer matrix
const BAYER: [[f64; 4]; 4] = [
    [0.0 / 16.0, 8.0 / 16.0, 2.0 / 16.0, 10.0 / 16.0],
    [12.0 / 16.0, 4.0 / 16.0, 14.0 / 16.0, 6.0 / 16.0],
    [3.0 / 16.0, 11.0 / 16.0, 1.0 / 16.0, 9.0 / 16.0],
    [15.0 / 16.0, 7.0 / 16.0, 13.0 / 16.0, 5.0 / 16.0],
];

const MAX_REROLLS: usize = 64;

impl TerrainGenerator {
    pub fn new(
        octave: f64,
        seed: Option<u64>,
        dims: [usize; 2],
        minimum_distance: f64,
        padded_boundary: usize,
        min_coverage: f64,
    ) -> Self {
        Self {
            octave,
            seed,
            dims,
            minimum_distance,
            padded_boundary,
            min_coverage,
        }
    }

    /// Rolls noise until the plot is usable (unpinned seed only), then
    /// extracts the plantable polygon and the spacing-filtered candidates
    pub fn generate(&self, rando: &mut SmallRng) -> Result<Terrain, TerrainError> {
        let [w, h] = self.dims;
        let cell_count = (w * h) as f64;

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let seed = match self.seed {
                Some(seed) => seed,
                None => rando.gen(),
            };

            let noise = self.sample_noise(seed);
            let dithered = self.dither(&noise);

            // unpinned seeds reroll until enough of the plot dithers to
            // candidates
            let coverage = NormalizedFloat::clamped(dithered.len() as f64 / cell_count);
            let can_reroll = self.seed.is_none() && attempt < MAX_REROLLS;
            if coverage.value() <= self.min_coverage && can_reroll {
                trace!("rerolling terrain"; "coverage" => coverage.value(), "seed" => seed);
                continue;
            }

            let (boundary, filled) = self.extract_boundary(&noise);

            // candidates live strictly inside the polygon
            let interior = dithered
                .into_iter()
                .filter(|&pos| filled[pos] && !boundary[pos])
                .collect::<Vec<_>>();
            let candidates = self.filter_spacing(interior);

            if candidates.is_empty() {
                if can_reroll {
                    trace!("rerolling empty terrain"; "seed" => seed);
                    continue;
                }
                return Err(TerrainError::NoCandidates);
            }

            debug!(
                "generated terrain";
                "seed" => seed,
                "attempts" => attempt,
                "candidates" => candidates.len(),
            );

            let mut candidate_grid = DynamicGrid::new(self.dims);
            for &pos in &candidates {
                candidate_grid[pos] = true;
            }

            return Ok(Terrain {
                boundary,
                filled,
                candidates,
                candidate_grid,
                seed,
            });
        }
    }

    /// Perlin field normalised to [0, 1], with the padded frame forced
    /// solid so the polygon cannot touch the grid edge
    fn sample_noise(&self, seed: u64) -> DynamicGrid<f64> {
        let [w, h] = self.dims;
        let perlin = Perlin::new().set_seed(seed as u32);

        let mut field = DynamicGrid::new(self.dims);
        for ([x, y], value) in field.iter_coords_mut() {
            *value = perlin.get([
                self.octave * x as f64 / w as f64,
                self.octave * y as f64 / h as f64,
            ]);
        }

        let (min, max) = crate::fields::min_max(&field);
        if max - min > f64::EPSILON {
            field
                .iter_mut()
                .for_each(|v| *v = map_range((min, max), (0.0, 1.0), *v));
        } else {
            field.fill(0.5);
        }

        let pad = self.padded_boundary;
        for ([x, y], value) in field.iter_coords_mut() {
            if x < pad || x >= w - pad || y < pad || y >= h - pad {
                *value = 1.0;
            }
        }

        field
    }

    /// Ordered dithering against the Bayer matrix, row-major output
    fn dither(&self, noise: &DynamicGrid<f64>) -> Vec<CoordType> {
        let [w, h] = self.dims;
        let pad = self.padded_boundary;

        let mut positions = Vec::new();
        for y in 0..h {
            if y <= pad || y >= h - pad {
                continue;
            }
            for x in 0..w {
                if x <= pad || x >= w - pad {
                    continue;
                }
                if noise[[x, y]] > BAYER[y % 4][x % 4] {
                    positions.push([x, y]);
                }
            }
        }

        positions
    }

    /// Threshold, invert, dilate twice and trace the outer contour of the
    /// low-noise area; returns (outline, filled polygon)
    fn extract_boundary(&self, noise: &DynamicGrid<f64>) -> (DynamicGrid<bool>, DynamicGrid<bool>) {
        let [w, h] = self.dims;

        let inverted = GrayImage::from_fn(w as u32, h as u32, |x, y| {
            if noise[[x as usize, y as usize]] > 0.5 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });

        // 3x3 kernel, applied twice, merges dithering specks into a blob
        let dilated = dilate(&dilate(&inverted, Norm::LInf, 1), Norm::LInf, 1);

        let mut outline_img = GrayImage::new(w as u32, h as u32);
        let mut filled_img = GrayImage::new(w as u32, h as u32);

        for contour in find_contours::<i32>(&dilated) {
            if contour.border_type != BorderType::Outer {
                continue;
            }

            let points = &contour.points;
            if points.len() >= 3 && points.first() != points.last() {
                draw_polygon_mut(&mut filled_img, points, Luma([255u8]));
            }

            for point in points {
                outline_img.put_pixel(point.x as u32, point.y as u32, Luma([255u8]));
                filled_img.put_pixel(point.x as u32, point.y as u32, Luma([255u8]));
            }
        }

        let mut boundary = DynamicGrid::new(self.dims);
        let mut filled = DynamicGrid::new(self.dims);
        for ([x, y], value) in boundary.iter_coords_mut() {
            *value = outline_img.get_pixel(x as u32, y as u32).0[0] > 0;
        }
        for ([x, y], value) in filled.iter_coords_mut() {
            *value = filled_img.get_pixel(x as u32, y as u32).0[0] > 0;
        }

        (boundary, filled)
    }

    /// Greedy spacing filter: keep a candidate only if it is at least
    /// `minimum_distance` from every candidate kept before it
    fn filter_spacing(&self, positions: Vec<CoordType>) -> Vec<CoordType> {
        let min_sq = self.minimum_distance * self.minimum_distance;
        let mut kept: Vec<CoordType> = Vec::with_capacity(positions.len());

        for pos in positions {
            let too_close = kept.iter().any(|&other| {
                let dx = pos[0] as f64 - other[0] as f64;
                let dy = pos[1] as f64 - other[1] as f64;
                dx * dx + dy * dy < min_sq
            });

            if !too_close {
                kept.push(pos);
            }
        }

        kept
    }
}
