use common::*;
use grid::{CoordType, DynamicGrid};
use image::{GrayImage, Luma};
use imageproc::edges::canny;
use std::collections::{BTreeMap, BTreeSet};

use crate::hatching::{HatchOutcome, RegionLabel, TreeInstance};
use crate::map_range;

const CANNY_LOW: f32 = 100.0;
const CANNY_HIGH: f32 = 200.0;
const PLANT_WEIGHT: f64 = 0.7;
const EDGE_WEIGHT: f64 = 0.3;

/// Mirror axes in evaluation order; ties resolve to the earliest
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SplitAxis {
    Horizontal,
    Vertical,
    AntiDiagonal,
    MainDiagonal,
}

impl SplitAxis {
    const ALL: [SplitAxis; 4] = [
        SplitAxis::Horizontal,
        SplitAxis::Vertical,
        SplitAxis::AntiDiagonal,
        SplitAxis::MainDiagonal,
    ];

    /// Whether a coordinate lies in the half that survives the mirror
    fn in_source_half(self, [x, y]: CoordType, [w, h]: [usize; 2]) -> bool {
        match self {
            SplitAxis::Horizontal => y < h / 2,
            SplitAxis::Vertical => x < w / 2,
            SplitAxis::AntiDiagonal => x + y >= w,
            SplitAxis::MainDiagonal => x < y,
        }
    }

    fn reflect(self, [x, y]: CoordType, [w, h]: [usize; 2]) -> CoordType {
        match self {
            SplitAxis::Horizontal => [x, h - 1 - y],
            SplitAxis::Vertical => [w - 1 - x, y],
            SplitAxis::AntiDiagonal => [h - 1 - y, w - 1 - x],
            SplitAxis::MainDiagonal => [y, x],
        }
    }

    fn needs_square(self) -> bool {
        matches!(self, SplitAxis::AntiDiagonal | SplitAxis::MainDiagonal)
    }
}

/// Mirror the manicured composition along whichever axis scores the most
/// symmetric. Returns the chosen axis, or None when there is nothing to
/// mirror
pub fn mirror_composition(outcome: &mut HatchOutcome) -> Option<SplitAxis> {
    let dims = outcome.label_grid.dimensions();
    let [w, h] = dims;

    if outcome.label_grid.iter().all(|&label| label == 0) {
        debug!("nothing to mirror, no labelled regions");
        return None;
    }

    let edges = detect_edges(&outcome.label_grid);

    let mut best: Option<(f64, SplitAxis, DynamicGrid<RegionLabel>)> = None;
    for &axis in &SplitAxis::ALL {
        if axis.needs_square() && w != h {
            continue;
        }

        let mirrored = mirror_grid(&outcome.label_grid, axis);
        let score = evaluate_symmetry(&outcome.label_grid, &mirrored, &edges, axis);
        trace!("evaluated mirror axis"; "axis" => ?axis, "score" => score);

        match best {
            Some((top, _, _)) if score <= top => {}
            _ => best = Some((score, axis, mirrored)),
        }
    }

    let (score, axis, mirrored) = best?;
    info!("mirroring composition"; "axis" => ?axis, "score" => score);

    outcome.label_grid = mirrored;
    outcome.seeds = mirror_seeds(&outcome.seeds, axis, dims);
    outcome.trees = mirror_trees(&outcome.trees, axis, dims);

    Some(axis)
}

/// Canny edges of the min-max-normalised label grid
fn detect_edges(grid: &DynamicGrid<RegionLabel>) -> GrayImage {
    let [w, h] = grid.dimensions();

    let (min, max) = grid.iter().fold((u32::MAX, 0u32), |(min, max), &v| {
        (min.min(v), max.max(v))
    });

    let normalised = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let value = grid[[x as usize, y as usize]];
        if max > min {
            let scaled = map_range((min as f64, max as f64), (0.0, 255.0), value as f64);
            Luma([scaled as u8])
        } else {
            Luma([0u8])
        }
    });

    canny(&normalised, CANNY_LOW, CANNY_HIGH)
}

/// Copy the source half over the other half
fn mirror_grid(grid: &DynamicGrid<RegionLabel>, axis: SplitAxis) -> DynamicGrid<RegionLabel> {
    let dims = grid.dimensions();
    let mut mirrored = grid.clone();

    for (pos, &value) in grid.iter_coords() {
        if axis.in_source_half(pos, dims) {
            mirrored[axis.reflect(pos, dims)] = value;
        }
    }

    mirrored
}

fn mirror_seeds(
    seeds: &BTreeMap<RegionLabel, Vec<CoordType>>,
    axis: SplitAxis,
    dims: [usize; 2],
) -> BTreeMap<RegionLabel, Vec<CoordType>> {
    seeds
        .iter()
        .map(|(&label, positions)| {
            let mirrored = positions
                .iter()
                .filter(|&&pos| axis.in_source_half(pos, dims))
                .flat_map(|&pos| once(pos).chain(once(axis.reflect(pos, dims))))
                .collect::<BTreeSet<_>>();

            (label, mirrored.into_iter().collect())
        })
        .collect()
}

fn mirror_trees(trees: &[TreeInstance], axis: SplitAxis, dims: [usize; 2]) -> Vec<TreeInstance> {
    let mut mirrored: BTreeMap<CoordType, TreeInstance> = BTreeMap::new();

    for tree in trees {
        if !axis.in_source_half(tree.pos, dims) {
            continue;
        }

        let reflected = axis.reflect(tree.pos, dims);
        mirrored.insert(tree.pos, tree.clone());
        mirrored.insert(
            reflected,
            TreeInstance {
                pos: reflected,
                ..tree.clone()
            },
        );
    }

    mirrored.into_values().collect()
}

/// Weighted symmetry score; closer to zero is more symmetric
fn evaluate_symmetry(
    grid: &DynamicGrid<RegionLabel>,
    mirrored: &DynamicGrid<RegionLabel>,
    edges: &GrayImage,
    axis: SplitAxis,
) -> f64 {
    let dims = grid.dimensions();
    let [w, h] = dims;

    let mut plant_diff = 0usize;
    for (pos, &value) in grid.iter_coords() {
        if value != 0 && mirrored[pos] != value {
            plant_diff += 1;
        }
    }
    let normalised_plant_diff = plant_diff as f64 / (w * h) as f64;

    let mut edge_total = 0usize;
    let mut edge_diff = 0usize;
    for y in 0..h {
        for x in 0..w {
            let here = edges.get_pixel(x as u32, y as u32).0[0] > 0;
            if here {
                edge_total += 1;
            }

            let [rx, ry] = axis.reflect([x, y], dims);
            let there = edges.get_pixel(rx as u32, ry as u32).0[0] > 0;
            if here != there {
                edge_diff += 1;
            }
        }
    }
    let normalised_edge_diff = if edge_total > 0 {
        edge_diff as f64 / edge_total as f64
    } else {
        0.0
    };

    -(PLANT_WEIGHT * normalised_plant_diff + EDGE_WEIGHT * normalised_edge_diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hatching::SeedMapping;
    use crate::palette::SpeciesId;

    fn reflected_equals(grid: &DynamicGrid<RegionLabel>, axis: SplitAxis) -> bool {
        let dims = grid.dimensions();
        grid.iter_coords()
            .all(|(pos, &value)| grid[axis.reflect(pos, dims)] == value)
    }

    fn outcome_with_left_heavy_plot() -> HatchOutcome {
        let dims = [20, 20];
        let mut label_grid = DynamicGrid::new(dims);

        // an asymmetric blob of two regions leaning left
        for ([x, y], value) in label_grid.iter_coords_mut() {
            if x >= 2 && x < 12 && y >= 4 && y < 16 {
                *value = if y < 10 { 4 } else { 5 };
            }
        }

        let mut seeds = BTreeMap::new();
        seeds.insert(4u32, vec![[4usize, 6usize]]);
        seeds.insert(5u32, vec![[4usize, 12usize]]);

        HatchOutcome {
            label_grid,
            seeds,
            mapping: SeedMapping::assign(&[]),
            trees: vec![TreeInstance {
                pos: [3, 6],
                radius: 2.0,
                species: SpeciesId::Int(7),
            }],
        }
    }

    #[test]
    fn mirrored_grid_is_symmetric_about_the_chosen_axis() {
        let mut outcome = outcome_with_left_heavy_plot();
        let axis = mirror_composition(&mut outcome).expect("regions exist");

        assert!(reflected_equals(&outcome.label_grid, axis));
    }

    #[test]
    fn seeds_and_trees_are_duplicated_across_the_axis() {
        let mut outcome = outcome_with_left_heavy_plot();
        let axis = mirror_composition(&mut outcome).expect("regions exist");
        let dims = outcome.label_grid.dimensions();

        for positions in outcome.seeds.values() {
            for &pos in positions {
                let reflected = axis.reflect(pos, dims);
                assert!(
                    positions.contains(&reflected),
                    "seed {:?} lost its mirror twin",
                    pos
                );
            }
        }

        let tree_positions: Vec<_> = outcome.trees.iter().map(|t| t.pos).collect();
        for &pos in &tree_positions {
            assert!(tree_positions.contains(&axis.reflect(pos, dims)));
        }
    }

    #[test]
    fn mirroring_is_idempotent() {
        let mut outcome = outcome_with_left_heavy_plot();
        let first_axis = mirror_composition(&mut outcome).expect("regions exist");

        let grid_after_first = outcome.label_grid.clone();
        let seeds_after_first = outcome.seeds.clone();
        let trees_after_first: Vec<_> = outcome.trees.iter().map(|t| t.pos).collect();

        let second_axis = mirror_composition(&mut outcome).expect("regions exist");

        assert_eq!(first_axis, second_axis);
        assert_eq!(outcome.label_grid, grid_after_first);
        assert_eq!(outcome.seeds, seeds_after_first);
        let trees_after_second: Vec<_> = outcome.trees.iter().map(|t| t.pos).collect();
        assert_eq!(trees_after_second, trees_after_first);
    }

    #[test]
    fn empty_label_grid_is_left_alone() {
        let mut outcome = HatchOutcome {
            label_grid: DynamicGrid::new([10, 10]),
            seeds: BTreeMap::new(),
            mapping: SeedMapping::assign(&[]),
            trees: Vec::new(),
        };

        assert_eq!(mirror_composition(&mut outcome), None);
    }
}
