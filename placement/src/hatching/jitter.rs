use grid::{CoordType, DynamicGrid};
use std::collections::BTreeMap;

use super::labels::RegionLabel;
use crate::fields::{distance_from_edge, euclidean};

/// Nudge every region seed off the region boundary, then spread seeds of
/// the same region apart. Both phases are bounded hill climbs over the
/// 8-neighbourhood, restricted to the seed's own region
pub fn jitter_seeds(
    grid: &DynamicGrid<RegionLabel>,
    seeds: BTreeMap<RegionLabel, Vec<CoordType>>,
    boundary_margin: f64,
    spacing: f64,
    max_iterations: usize,
) -> BTreeMap<RegionLabel, Vec<CoordType>> {
    let mut jittered = BTreeMap::new();

    for (label, positions) in seeds {
        let mut mask = DynamicGrid::new(grid.dimensions());
        for (pos, value) in mask.iter_coords_mut() {
            *value = grid[pos] == label;
        }
        let distance = distance_from_edge(&mask);

        // phase 1: walk inward until clear of the region boundary
        let margin_steps = boundary_margin.ceil() as usize;
        let shifted = positions
            .into_iter()
            .map(|seed| {
                let mut pos = seed;
                let mut steps = 0;

                while distance[pos] < boundary_margin && steps < margin_steps {
                    let best = grid
                        .neighbours8(grid.flatten_coords(pos))
                        .filter(|&n| mask[n])
                        .max_by(|&a, &b| {
                            distance[a]
                                .partial_cmp(&distance[b])
                                .expect("distances are finite")
                        })
                        .filter(|&n| distance[n] > distance[pos]);

                    match best {
                        Some(n) => pos = grid.unflatten_index(n),
                        None => break,
                    }
                    steps += 1;
                }

                pos
            })
            .collect::<Vec<_>>();

        // phase 2: spread seeds of this region apart
        let mut placed: Vec<CoordType> = Vec::with_capacity(shifted.len());
        for seed in shifted {
            let mut pos = seed;
            let mut iterations = 0;

            while iterations < max_iterations {
                let spaced = placed.iter().all(|&other| euclidean(pos, other) >= spacing);
                if spaced {
                    break;
                }

                let mut best: Option<(f64, usize)> = None;
                for neighbour in grid.neighbours8(grid.flatten_coords(pos)) {
                    if !mask[neighbour] {
                        continue;
                    }

                    let candidate = grid.unflatten_index(neighbour);
                    let clearance = placed
                        .iter()
                        .map(|&other| euclidean(candidate, other))
                        .fold(f64::MAX, f64::min);

                    match best {
                        Some((top, _)) if clearance <= top => {}
                        _ => best = Some((clearance, neighbour)),
                    }
                }

                match best {
                    Some((_, n)) => pos = grid.unflatten_index(n),
                    None => break,
                }
                iterations += 1;
            }

            placed.push(pos);
        }

        jittered.insert(label, placed);
    }

    jittered
}
