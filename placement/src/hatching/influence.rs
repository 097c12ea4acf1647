use common::*;
use grid::{CoordType, DynamicGrid};
use std::collections::BTreeMap;

use super::labels::{
    is_border_loving_label, is_shade_loving_label, RegionLabel, SeedMapping,
};
use super::TreeInstance;
use crate::fields::{distance_from_edge, euclidean, min_max};
use crate::map_range;
use crate::params::CompositionParams;

/// One Worley-style heatmap shared by every species: minimum distance to a
/// handful of feature points, normalised and scaled into `value_range`
pub fn worley_heatmap(
    dims: [usize; 2],
    feature_points: usize,
    value_range: (f64, f64),
    invert: bool,
    rando: &mut SmallRng,
) -> DynamicGrid<f64> {
    let [w, h] = dims;

    let points = (0..feature_points)
        .map(|_| {
            (
                rando.gen_range(0.0, w as f64),
                rando.gen_range(0.0, h as f64),
            )
        })
        .collect::<Vec<_>>();

    let mut field = DynamicGrid::new(dims);
    for ([x, y], value) in field.iter_coords_mut() {
        *value = points
            .iter()
            .map(|&(fx, fy)| ((x as f64 - fx).powi(2) + (y as f64 - fy).powi(2)).sqrt())
            .fold(f64::MAX, f64::min);
    }

    let (min, max) = min_max(&field);
    let span = (max - min).max(f64::EPSILON);
    for value in field.iter_mut() {
        let mut normalised = NormalizedFloat::clamped((*value - min) / span);
        if invert {
            normalised = NormalizedFloat::one() - normalised;
        }
        *value = map_range((0.0, 1.0), value_range, normalised.value());
    }

    field
}

/// Radiate each seed's noise strength outward with exponential decay,
/// keeping the maximum contribution per cell
pub fn radiate_influence(
    noise: &DynamicGrid<f64>,
    seeds: &[CoordType],
    decay: f64,
) -> DynamicGrid<f64> {
    let mut field = DynamicGrid::new(noise.dimensions());

    for &seed in seeds {
        let strength = noise[seed];
        for (pos, value) in field.iter_coords_mut() {
            let influence = strength * (-decay * euclidean(pos, seed)).exp();
            if influence > *value {
                *value = influence;
            }
        }
    }

    field
}

/// 100 under (or away from) every canopy depending on the species' shade
/// preference. All zero when the composition has no trees
pub fn shade_field(
    plantable: &DynamicGrid<bool>,
    trees: &[TreeInstance],
    shade_loving: bool,
) -> DynamicGrid<f64> {
    let mut field = DynamicGrid::new(plantable.dimensions());

    if trees.is_empty() {
        return field;
    }

    for (pos, value) in field.iter_coords_mut() {
        if !plantable[pos] {
            continue;
        }

        let qualifies = if shade_loving {
            trees
                .iter()
                .any(|tree| euclidean(pos, tree.pos) <= tree.radius)
        } else {
            trees
                .iter()
                .all(|tree| euclidean(pos, tree.pos) > tree.radius)
        };

        if qualifies {
            *value = 100.0;
        }
    }

    field
}

const DISTANCE_CUTOFF: f64 = 1.0;

/// Border-loving species: full marks inside the constant zone next to the
/// border, linear decay beyond it
pub fn border_proximity_field(
    border_distance: &DynamicGrid<f64>,
    constant_zone: f64,
    binary_scale: bool,
) -> DynamicGrid<f64> {
    let (_, max_distance) = min_max(border_distance);
    let zone = constant_zone * max_distance;

    let mut field = DynamicGrid::new(border_distance.dimensions());
    for (pos, value) in field.iter_coords_mut() {
        let d = border_distance[pos];
        if d < DISTANCE_CUTOFF {
            continue;
        }

        let score = if d <= zone {
            100.0
        } else if max_distance - zone > f64::EPSILON {
            (1.0 - (d - zone) / (max_distance - zone)) * 100.0
        } else {
            0.0
        };

        *value = if binary_scale && score < 100.0 {
            0.0
        } else {
            score
        };
    }

    field
}

/// Not-border species: score climbs with depth and saturates at 100 over
/// the innermost band of the plot
pub fn interior_field(
    border_distance: &DynamicGrid<f64>,
    interior_band: f64,
    binary_scale: bool,
) -> DynamicGrid<f64> {
    let (_, max_distance) = min_max(border_distance);
    let saturation = (1.0 - interior_band) * max_distance;

    let mut field = DynamicGrid::new(border_distance.dimensions());
    if saturation <= 0.0 {
        return field;
    }

    for (pos, value) in field.iter_coords_mut() {
        let d = border_distance[pos];
        if d < DISTANCE_CUTOFF {
            continue;
        }

        let score = (d.min(saturation) / saturation) * 100.0;
        *value = if binary_scale && score < 100.0 {
            0.0
        } else {
            score
        };
    }

    field
}

/// Sum of noise, shade and border contributions per species, in mapping
/// order
pub fn species_influences(
    plantable: &DynamicGrid<bool>,
    mapping: &SeedMapping,
    starters: &BTreeMap<RegionLabel, Vec<CoordType>>,
    trees: &[TreeInstance],
    params: &CompositionParams,
    rando: &mut SmallRng,
) -> Vec<(RegionLabel, DynamicGrid<f64>)> {
    let noise = worley_heatmap(
        plantable.dimensions(),
        params.worley_points,
        (40.0, 50.0),
        false,
        rando,
    );
    let border_distance = distance_from_edge(plantable);

    mapping
        .entries()
        .iter()
        .map(|entry| {
            let label = entry.label;

            let radiated = radiate_influence(
                &noise,
                starters.get(&label).map(Vec::as_slice).unwrap_or(&[]),
                params.influence_decay,
            );
            let shade = shade_field(plantable, trees, is_shade_loving_label(label));
            let border = if is_border_loving_label(label) {
                border_proximity_field(
                    &border_distance,
                    params.border_constant_zone,
                    params.binary_scale,
                )
            } else {
                interior_field(&border_distance, params.interior_band, params.binary_scale)
            };

            let mut combined = radiated;
            for (pos, value) in combined.iter_coords_mut() {
                *value += shade[pos] + border[pos];
            }

            (label, combined)
        })
        .collect()
}

/// Winner-takes-the-cell assignment: the species with the strongest
/// influence claims each plantable cell, with a seeded coin flip when the
/// top two are within the dominance threshold
pub fn assign_regions(
    plantable: &DynamicGrid<bool>,
    influences: &[(RegionLabel, DynamicGrid<f64>)],
    threshold: f64,
    rando: &mut SmallRng,
) -> DynamicGrid<RegionLabel> {
    let mut regions = DynamicGrid::new(plantable.dimensions());

    for (pos, region) in regions.iter_coords_mut() {
        if !plantable[pos] {
            continue;
        }

        let mut top: Option<(f64, RegionLabel)> = None;
        let mut second: Option<(f64, RegionLabel)> = None;

        for &(label, ref field) in influences {
            let value = field[pos];
            match top {
                Some((best, _)) if value <= best => match second {
                    Some((next, _)) if value <= next => {}
                    _ => second = Some((value, label)),
                },
                _ => {
                    second = top;
                    top = Some((value, label));
                }
            }
        }

        *region = match (top, second) {
            (Some((best, winner)), Some((next, runner_up))) => {
                if (best - next).abs() <= threshold {
                    *[winner, runner_up]
                        .choose(rando)
                        .expect("slice is non-empty")
                } else {
                    winner
                }
            }
            (Some((_, winner)), None) => winner,
            (None, _) => 0,
        };
    }

    regions
}
