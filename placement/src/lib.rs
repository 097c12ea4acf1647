#![deny(unused_must_use)]

mod allocation;
mod compose;
mod fields;
mod hatching;
mod mirror;
mod output;
mod palette;
mod params;
mod terrain;

pub mod render;

pub use allocation::{
    allocate, Action, ActionRow, CandidateEmbedding, GreedyPolicy, LinearPolicy, PlacementPolicy,
    PlacementRecord, PlantClass, PolicyError, StepOutcome, TypeAllocationEnv,
};
pub use compose::{
    compose_one, generate, CompositionData, CompositionError, CompositionRequest,
    CompositionResponse, MIN_PALETTE_LEN,
};
pub use hatching::{
    hatch, HatchError, HatchOutcome, RegionLabel, SeedEntry, SeedMapping, ShrubCategory,
    TreeInstance,
};
pub use mirror::{mirror_composition, SplitAxis};
pub use output::EncodedComposition;
pub use palette::{PaletteRecord, SpeciesId, SplitPalette};
pub use params::{CompositionParams, CompositionParamsRef, Style, Surrounding};
pub use terrain::{Cell, Terrain, TerrainError, TerrainGenerator};

/// https://rosettacode.org/wiki/Map_range#Rust
#[inline]
pub(crate) fn map_range<F: common::num_traits::Float>(
    from_range: (F, F),
    to_range: (F, F),
    s: F,
) -> F {
    to_range.0 + (s - from_range.0) * (to_range.1 - to_range.0) / (from_range.1 - from_range.0)
}
