use grid::DynamicGrid;
use std::collections::BTreeMap;

use crate::allocation::PlacementRecord;
use crate::hatching::HatchOutcome;
use crate::palette::{SpeciesId, SplitPalette};
use crate::terrain::Cell;

pub const CODE_BACKGROUND: u8 = 0;
pub const CODE_PLANTABLE: u8 = 1;
pub const CODE_TREE: u8 = 2;
pub const CODE_SHRUB: u8 = 3;

/// Stage O artefacts: the collapsed four-value grid and the species map
pub struct EncodedComposition {
    pub grid: DynamicGrid<u8>,
    pub coordinates: BTreeMap<String, SpeciesId>,
}

fn coordinate_key([x, y]: grid::CoordType) -> String {
    format!("({}, {})", y, x)
}

/// Collapse the pipeline artefacts into the output contract: every region
/// seed maps to its species, every tree to the species drawn at placement,
/// and the grid folds back to background/plantable/tree/shrub
pub fn encode(
    placement: &PlacementRecord,
    outcome: &HatchOutcome,
    palette: &SplitPalette,
) -> EncodedComposition {
    let hatched = outcome.label_grid.iter().any(|&label| label > 0);

    let mut grid = DynamicGrid::new(placement.occupancy.dimensions());
    for (pos, value) in grid.iter_coords_mut() {
        let plantable = if hatched {
            outcome.label_grid[pos] > 0
        } else {
            placement.occupancy[pos] != Cell::Background
        };
        *value = if plantable {
            CODE_PLANTABLE
        } else {
            CODE_BACKGROUND
        };
    }

    let mut coordinates = BTreeMap::new();

    for (&label, positions) in &outcome.seeds {
        let species = outcome
            .mapping
            .species_for(label)
            .map(|index| palette.shrubs[index].species_id.clone());

        if let Some(species) = species {
            for &pos in positions {
                coordinates.insert(coordinate_key(pos), species.clone());
                grid[pos] = CODE_SHRUB;
            }
        }
    }

    // trees win any collision with a seed entry
    for tree in &outcome.trees {
        coordinates.insert(coordinate_key(tree.pos), tree.species.clone());
        grid[tree.pos] = CODE_TREE;
    }

    EncodedComposition { grid, coordinates }
}
