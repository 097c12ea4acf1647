mod cleanup;
mod influence;
mod jitter;
mod labels;

pub use labels::{
    choose_starters, is_border_loving_label, is_shade_loving_label, RegionLabel, SeedEntry,
    SeedMapping, ShrubCategory, STARTING_LABEL,
};

use common::*;
use grid::{CoordType, DynamicGrid};
use std::collections::{BTreeMap, BTreeSet};

use crate::allocation::PlacementRecord;
use crate::palette::{SpeciesId, SplitPalette};
use crate::params::CompositionParams;
use crate::terrain::Cell;

#[derive(Debug, Error)]
pub enum HatchError {
    #[error("palette has no tree species but {0} trees were placed")]
    NoTreeSpecies(usize),
}

/// A placed tree with the canopy and species drawn from the palette
#[derive(Clone, Debug)]
pub struct TreeInstance {
    pub pos: CoordType,
    pub radius: f64,
    pub species: SpeciesId,
}

/// Stage H artefacts handed to the mirror and the output encoder
pub struct HatchOutcome {
    /// 0 outside the plot, species labels >= 3 inside
    pub label_grid: DynamicGrid<RegionLabel>,
    /// Post-jitter region seeds per label
    pub seeds: BTreeMap<RegionLabel, Vec<CoordType>>,
    pub mapping: SeedMapping,
    pub trees: Vec<TreeInstance>,
}

/// Stage H: draw tree instances, carve the plantable area into one region
/// per shrub species and anchor each region's seeds
pub fn hatch(
    placement: &PlacementRecord,
    palette: &SplitPalette,
    params: &CompositionParams,
    rando: &mut SmallRng,
) -> Result<HatchOutcome, HatchError> {
    if !placement.trees.is_empty() && palette.trees.is_empty() {
        return Err(HatchError::NoTreeSpecies(placement.trees.len()));
    }

    let trees = placement
        .trees
        .iter()
        .map(|&pos| {
            let record = palette
                .trees
                .choose(rando)
                .expect("tree palette emptiness was checked above");
            TreeInstance {
                pos,
                radius: record.canopy_radius(),
                species: record.species_id.clone(),
            }
        })
        .collect::<Vec<_>>();

    let mapping = SeedMapping::assign(&palette.shrubs);

    let mut outcome = HatchOutcome {
        label_grid: DynamicGrid::new(placement.occupancy.dimensions()),
        seeds: BTreeMap::new(),
        mapping,
        trees,
    };

    if palette.shrubs.is_empty() || placement.shrubs.is_empty() {
        info!("skipping hatching"; "shrub_species" => palette.shrubs.len(), "shrub_placements" => placement.shrubs.len());
        return Ok(outcome);
    }

    let mut plantable = DynamicGrid::new(placement.occupancy.dimensions());
    for (pos, value) in plantable.iter_coords_mut() {
        *value = placement.occupancy[pos] != Cell::Background;
    }

    let starters = choose_starters(&placement.shrubs, &outcome.mapping, params.starter_fraction);
    let influences = influence::species_influences(
        &plantable,
        &outcome.mapping,
        &starters,
        &outcome.trees,
        params,
        rando,
    );

    let mut label_grid = influence::assign_regions(
        &plantable,
        &influences,
        params.dominance_threshold,
        rando,
    );

    let shrub_set: BTreeSet<CoordType> = placement.shrubs.iter().copied().collect();
    cleanup::fill_small_regions(&mut label_grid, params.region_min_size, &shrub_set);

    let seeds = cleanup::bucket_seeds(&label_grid, &placement.shrubs);
    let seeds = jitter::jitter_seeds(
        &label_grid,
        seeds,
        params.seed_boundary_margin,
        params.seed_spacing,
        params.jitter_iterations,
    );

    cleanup::drop_seedless_regions(&mut label_grid, &seeds);

    info!(
        "hatched regions";
        "species" => outcome.mapping.entries().len(),
        "seeds" => seeds.values().map(Vec::len).sum::<usize>(),
    );

    outcome.label_grid = label_grid;
    outcome.seeds = seeds;
    Ok(outcome)
}
