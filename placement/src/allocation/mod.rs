mod env;
mod policy;

pub use env::{
    Action, ActionRow, CandidateEmbedding, PlacementRecord, PlantClass, StepOutcome,
    TypeAllocationEnv, FORBIDDEN,
};
pub use policy::{GreedyPolicy, LinearPolicy, PlacementPolicy, PolicyError};

use common::*;

use crate::params::{CompositionParams, Surrounding};
use crate::terrain::Terrain;

/// Stage A: classify every candidate as tree, shrub or skip by running the
/// policy against the allocation environment until the table is exhausted
/// or the step budget runs out
pub fn allocate(
    terrain: &Terrain,
    surrounding: Surrounding,
    has_trees: bool,
    has_shrubs: bool,
    params: &CompositionParams,
    policy: &mut dyn PlacementPolicy,
) -> PlacementRecord {
    let mut env = TypeAllocationEnv::new(terrain, surrounding, has_trees, has_shrubs, params);

    debug!(
        "allocating candidate types";
        "candidates" => env.candidates().len(),
        "surrounding" => ?surrounding,
    );

    while !env.is_done() {
        match policy.decide(&env) {
            Some(action) => {
                env.step(action);
            }
            None => break,
        }
    }

    env.into_placement()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::euclidean;
    use crate::terrain::Cell;
    use grid::DynamicGrid;

    /// A synthetic square plot with a lattice of candidates, no noise
    /// involved, so every expectation below is exact
    fn flat_terrain() -> Terrain {
        let dims = [100, 100];

        let mut filled = DynamicGrid::new(dims);
        for ([x, y], value) in filled.iter_coords_mut() {
            *value = (5..95).contains(&x) && (5..95).contains(&y);
        }

        let mut candidates = Vec::new();
        for y in (15..=85).step_by(10) {
            for x in (15..=85).step_by(10) {
                candidates.push([x, y]);
            }
        }

        let mut candidate_grid = DynamicGrid::new(dims);
        for &pos in &candidates {
            candidate_grid[pos] = true;
        }

        Terrain {
            boundary: DynamicGrid::new(dims),
            filled,
            candidates,
            candidate_grid,
            seed: 0,
        }
    }

    #[test]
    fn greedy_walkway_respects_all_invariants() {
        let terrain = flat_terrain();
        let params = CompositionParams::dummy();

        let placement = allocate(
            &terrain,
            Surrounding::Walkway,
            true,
            true,
            &params,
            &mut GreedyPolicy,
        );

        // every candidate got classified within budget
        let placed = placement.trees.len() + placement.shrubs.len() + placement.skipped.len();
        assert_eq!(placed, terrain.candidates.len());

        // placements come from the candidate set
        for pos in placement.trees.iter().chain(&placement.shrubs) {
            assert!(terrain.candidate_grid[*pos]);
        }

        // tree exclusion radius
        for (i, &a) in placement.trees.iter().enumerate() {
            for &b in &placement.trees[i + 1..] {
                assert!(
                    euclidean(a, b) >= params.tree_distance,
                    "trees {:?} and {:?} too close",
                    a,
                    b
                );
            }
        }

        // occupancy mirrors the coordinate lists
        for &pos in &placement.trees {
            assert_eq!(placement.occupancy[pos], Cell::Tree);
        }
        for &pos in &placement.shrubs {
            assert_eq!(placement.occupancy[pos], Cell::Shrub);
        }

        // density shaping keeps the shrub:skip split near 0.65:0.35
        let shrubs = placement.shrubs.len() as f64;
        let skipped = placement.skipped.len() as f64;
        let fraction = shrubs / (shrubs + skipped);
        assert!(
            (fraction - 0.65).abs() <= 0.1,
            "shrub fraction {} strayed from the target",
            fraction
        );
    }

    #[test]
    fn treeless_palette_never_places_trees() {
        let terrain = flat_terrain();
        let params = CompositionParams::dummy();

        let placement = allocate(
            &terrain,
            Surrounding::Road,
            false,
            true,
            &params,
            &mut GreedyPolicy,
        );

        assert!(placement.trees.is_empty());
        assert!(!placement.shrubs.is_empty());
    }

    #[test]
    fn shrubless_palette_never_places_shrubs() {
        let terrain = flat_terrain();
        let params = CompositionParams::dummy();

        let placement = allocate(
            &terrain,
            Surrounding::Walkway,
            true,
            false,
            &params,
            &mut GreedyPolicy,
        );

        assert!(placement.shrubs.is_empty());
    }

    #[test]
    fn forbidden_step_consumes_budget_without_mutation() {
        let terrain = flat_terrain();
        let params = CompositionParams::dummy();
        let mut env = TypeAllocationEnv::new(&terrain, Surrounding::Walkway, true, true, &params);

        // a candidate on the border ring is too close to the edge for a tree
        let forbidden = (0..env.candidates().len())
            .map(|candidate| Action {
                candidate,
                class: PlantClass::Tree,
            })
            .find(|&action| env.score_action(action) < 0.0)
            .expect("lattice should have tree-forbidden candidates");

        let outcome = env.step(forbidden);
        assert_eq!(outcome.reward, FORBIDDEN);
        assert_eq!(env.current_step(), 1);
        assert_eq!(env.class_density(PlantClass::Tree), 0.0);
        assert_eq!(env.class_density(PlantClass::Shrub), 0.0);
    }

    #[test]
    fn near_curve_tree_scores_are_boosted() {
        let terrain = flat_terrain();
        let params = CompositionParams::dummy();
        let env = TypeAllocationEnv::new(&terrain, Surrounding::Walkway, true, true, &params);

        // the lattice is fully symmetric, every (contour, distance) pair
        // repeats, so nothing registers as a curve
        assert!(env.candidates().iter().all(|c| !c.near_curve));

        // and every legal tree row carries the ln headroom on top of its base
        for candidate in env.candidates() {
            if candidate.current.tree >= 0.0 {
                assert!(candidate.current.tree >= candidate.base.tree);
                assert_eq!(
                    candidate.current.tree,
                    candidate.base.tree + candidate.remaining_trees
                );
            }
        }
    }
}
