use common::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::allocation::{allocate, GreedyPolicy, LinearPolicy, PlacementPolicy, PolicyError};
use crate::hatching::{hatch, HatchError};
use crate::mirror::mirror_composition;
use crate::output::{encode, EncodedComposition};
use crate::palette::{PaletteRecord, SpeciesId, SplitPalette};
use crate::params::{CompositionParams, Style, Surrounding};
use crate::terrain::{TerrainError, TerrainGenerator};

/// Minimum usable palette records per request
pub const MIN_PALETTE_LEN: usize = 3;

/// Compositions returned per request
const COMPOSITIONS_PER_REQUEST: usize = 3;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("plant palette needs at least {MIN_PALETTE_LEN} usable records, got {0}")]
    PaletteTooSmall(usize),

    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error(transparent)]
    Hatch(#[from] HatchError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// The composition request as posted by the caller. Unknown styles and
/// surroundings are rejected at deserialisation; nulls fall back to
/// defaults
#[derive(Debug, Deserialize)]
pub struct CompositionRequest {
    #[serde(default)]
    pub style: Option<Style>,
    #[serde(default)]
    pub surrounding: Option<Surrounding>,
    #[serde(default)]
    pub plant_palette: Vec<PaletteRecord>,
}

#[derive(Debug, Serialize)]
pub struct CompositionResponse {
    pub data: Vec<CompositionData>,
}

#[derive(Debug, Serialize)]
pub struct CompositionData {
    pub grid: Vec<Vec<u8>>,
    pub coordinates: BTreeMap<String, SpeciesId>,
    pub data_value: u8,
    pub surrounding_context: Surrounding,
}

/// Serve one request: three independently-seeded compositions, all derived
/// from the master seed in `params`
pub fn generate(
    request: CompositionRequest,
    params: &CompositionParams,
) -> Result<CompositionResponse, CompositionError> {
    let style = request.style.unwrap_or(Style::Naturalistic);
    let surrounding = request.surrounding.unwrap_or(Surrounding::Walkway);

    let palette = SplitPalette::split(request.plant_palette);
    if palette.usable_len() < MIN_PALETTE_LEN {
        return Err(CompositionError::PaletteTooSmall(palette.usable_len()));
    }

    info!(
        "generating compositions";
        "style" => ?style,
        "surrounding" => ?surrounding,
        "trees" => palette.trees.len(),
        "shrubs" => palette.shrubs.len(),
    );

    let mut rando = SmallRng::seed_from_u64(params.seed());

    let mut data = Vec::with_capacity(COMPOSITIONS_PER_REQUEST);
    for index in 0..COMPOSITIONS_PER_REQUEST {
        let octave = rando.gen_range(1.0, 2.0);
        let sub_seed = rando.gen();

        let encoded = compose_one(octave, sub_seed, style, surrounding, &palette, params)?;
        data.push(CompositionData {
            grid: grid_rows(&encoded),
            coordinates: encoded.coordinates,
            data_value: index as u8,
            surrounding_context: surrounding,
        });
    }

    Ok(CompositionResponse { data })
}

/// One full pipeline run: terrain, type allocation, hatching, optional
/// mirroring, output encoding
pub fn compose_one(
    octave: f64,
    seed: u64,
    style: Style,
    surrounding: Surrounding,
    palette: &SplitPalette,
    params: &CompositionParams,
) -> Result<EncodedComposition, CompositionError> {
    let mut rando = SmallRng::seed_from_u64(seed);

    let generator = TerrainGenerator::new(
        octave,
        None,
        params.grid_size(),
        params.candidate_spacing,
        params.padded_boundary,
        params.min_candidate_coverage,
    );
    let terrain = generator.generate(&mut rando)?;

    let mut policy: Box<dyn PlacementPolicy> = match &params.policy {
        Some(path) => Box::new(LinearPolicy::load(path)?),
        None => Box::new(GreedyPolicy),
    };

    let placement = allocate(
        &terrain,
        surrounding,
        !palette.trees.is_empty(),
        !palette.shrubs.is_empty(),
        params,
        policy.as_mut(),
    );

    let mut outcome = hatch(&placement, palette, params, &mut rando)?;

    if style == Style::Manicured {
        mirror_composition(&mut outcome);
    }

    Ok(encode(&placement, &outcome, palette))
}

/// Row-major rows for the json body, `grid[y][x]`
fn grid_rows(encoded: &EncodedComposition) -> Vec<Vec<u8>> {
    let [w, h] = encoded.grid.dimensions();
    (0..h)
        .map(|y| (0..w).map(|x| encoded.grid[[x, y]]).collect())
        .collect()
}
