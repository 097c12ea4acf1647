use common::*;
use grid::{CoordType, DynamicGrid};
use std::collections::{BTreeMap, BTreeSet};

use super::labels::RegionLabel;
use crate::fields::label_components;

const MAX_FILL_PASSES: usize = 32;

fn mask_of(grid: &DynamicGrid<RegionLabel>, label: RegionLabel) -> DynamicGrid<bool> {
    let mut mask = DynamicGrid::new(grid.dimensions());
    for (pos, value) in mask.iter_coords_mut() {
        *value = grid[pos] == label;
    }
    mask
}

fn sorted_labels(grid: &DynamicGrid<RegionLabel>) -> Vec<RegionLabel> {
    grid.iter()
        .copied()
        .filter(|&label| label >= super::labels::STARTING_LABEL)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Most frequent positive 4-neighbour value around a set of cells,
/// excluding the region's own label. Smallest label wins a count tie
fn dominant_neighbour(
    grid: &DynamicGrid<RegionLabel>,
    cells: &[usize],
    own: RegionLabel,
) -> Option<RegionLabel> {
    let mut counts: BTreeMap<RegionLabel, usize> = BTreeMap::new();

    for &index in cells {
        for neighbour in grid.neighbours(index) {
            let value = grid[neighbour];
            if value > 0 && value != own {
                *counts.entry(value).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(label, _)| label)
}

/// Recolour connected components that are too small or contain no shrub
/// placement, repeating until the grid stops changing
pub fn fill_small_regions(
    grid: &mut DynamicGrid<RegionLabel>,
    min_size: usize,
    shrub_positions: &BTreeSet<CoordType>,
) {
    for pass in 0..MAX_FILL_PASSES {
        let mut changed = false;

        for label in sorted_labels(grid) {
            let mask = mask_of(grid, label);
            let (components, count) = label_components(&mask);

            for component in 1..=count {
                let cells = components
                    .iter()
                    .enumerate()
                    .filter(|&(_, &c)| c == component)
                    .map(|(index, _)| index)
                    .collect::<Vec<_>>();

                let holds_seed = cells
                    .iter()
                    .any(|&index| shrub_positions.contains(&grid.unflatten_index(index)));

                if cells.len() >= min_size && holds_seed {
                    continue;
                }

                if let Some(replacement) = dominant_neighbour(grid, &cells, label) {
                    for &index in &cells {
                        grid[index] = replacement;
                    }
                    changed = true;
                }
            }
        }

        if !changed {
            debug!("small regions filled"; "passes" => pass + 1);
            return;
        }
    }

    warn!("region filling did not stabilise"; "passes" => MAX_FILL_PASSES);
}

/// Bucket shrub placements by the region label under each one
pub fn bucket_seeds(
    grid: &DynamicGrid<RegionLabel>,
    shrub_positions: &[CoordType],
) -> BTreeMap<RegionLabel, Vec<CoordType>> {
    let mut seeds: BTreeMap<RegionLabel, Vec<CoordType>> = BTreeMap::new();

    for &pos in shrub_positions {
        let label = grid[pos];
        seeds.entry(label).or_default().push(pos);
    }

    seeds
}

/// Merge every connected component that holds no seed into its most
/// frequent positive neighbour component, then map components back to
/// species labels
pub fn drop_seedless_regions(
    grid: &mut DynamicGrid<RegionLabel>,
    seeds: &BTreeMap<RegionLabel, Vec<CoordType>>,
) {
    let dims = grid.dimensions();

    // unique component ids across all labels
    let mut unique: DynamicGrid<u32> = DynamicGrid::new(dims);
    let mut component_label = vec![0 as RegionLabel]; // id 0 is background
    for label in sorted_labels(grid) {
        let mask = mask_of(grid, label);
        let (components, count) = label_components(&mask);

        for component in 1..=count {
            let id = component_label.len() as u32;
            component_label.push(label);
            for (index, &c) in components.iter().enumerate() {
                if c == component {
                    unique[index] = id;
                }
            }
        }
    }

    let seeded = seeds
        .values()
        .flatten()
        .map(|&pos| unique[pos])
        .filter(|&id| id > 0)
        .collect::<BTreeSet<_>>();

    for id in 1..component_label.len() as u32 {
        if seeded.contains(&id) {
            continue;
        }

        let cells = unique
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == id)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        if cells.is_empty() {
            // already merged away
            continue;
        }

        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for &index in &cells {
            for neighbour in unique.neighbours(index) {
                let value = unique[neighbour];
                if value > 0 && value != id {
                    *counts.entry(value).or_insert(0) += 1;
                }
            }
        }

        if let Some((target, _)) = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        {
            for &index in &cells {
                unique[index] = target;
            }
        }
    }

    for (index, &id) in unique.iter().enumerate() {
        grid[index] = component_label[id as usize];
    }
}
