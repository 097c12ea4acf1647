use common::*;
use grid::{CoordType, DynamicGrid};
use std::collections::HashMap;

use crate::fields::{centroid_distance_field, distance_from_edge, euclidean, min_max};
use crate::params::{CompositionParams, Surrounding};
use crate::terrain::{Cell, Terrain};

pub const FORBIDDEN: f64 = -1.0;

/// Candidate classification outcomes, in action order
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlantClass {
    Tree,
    Shrub,
    /// Leave the spot empty
    Skip,
}

impl PlantClass {
    pub const ALL: [PlantClass; 3] = [PlantClass::Tree, PlantClass::Shrub, PlantClass::Skip];

    fn index(self) -> usize {
        match self {
            PlantClass::Tree => 0,
            PlantClass::Shrub => 1,
            PlantClass::Skip => 2,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Action {
    pub candidate: usize,
    pub class: PlantClass,
}

/// One row of the reward table. Negative means forbidden
#[derive(Clone, Copy, Debug)]
pub struct ActionRow {
    pub tree: f64,
    pub shrub: f64,
    pub skip: f64,
}

impl ActionRow {
    fn get(&self, class: PlantClass) -> f64 {
        match class {
            PlantClass::Tree => self.tree,
            PlantClass::Shrub => self.shrub,
            PlantClass::Skip => self.skip,
        }
    }

    fn forbid_all(&mut self) {
        self.tree = FORBIDDEN;
        self.shrub = FORBIDDEN;
        self.skip = FORBIDDEN;
    }

    fn all_forbidden(&self) -> bool {
        self.tree < 0.0 && self.shrub < 0.0 && self.skip < 0.0
    }
}

/// The nine scalars the policy sees per candidate, plus bookkeeping
#[derive(Clone, Debug)]
pub struct CandidateEmbedding {
    pub pos: CoordType,
    /// Reference-field distance, rounded like the rest of the table
    pub ref_distance: f64,
    pub border_distance: f64,
    /// Unique (contour, distance) pair among all candidates
    pub near_curve: bool,
    /// ln of how many candidates could still take a tree
    pub remaining_trees: f64,
    /// Scores fixed at initialisation
    pub base: ActionRow,
    /// Live reward row
    pub current: ActionRow,
}

impl CandidateEmbedding {
    /// Observation vector consumed by serialised policies
    pub fn observation(&self) -> [f64; 9] {
        [
            self.pos[0] as f64,
            self.pos[1] as f64,
            self.ref_distance,
            self.border_distance,
            self.remaining_trees,
            self.base.tree,
            self.current.tree,
            self.current.shrub,
            self.current.skip,
        ]
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StepOutcome {
    pub reward: f64,
    pub done: bool,
}

/// Ordered coordinate lists produced by stage A
pub struct PlacementRecord {
    pub trees: Vec<CoordType>,
    pub shrubs: Vec<CoordType>,
    pub skipped: Vec<CoordType>,
    pub occupancy: DynamicGrid<Cell>,
}

/// Deterministic MDP-shaped environment over the candidate set. The
/// policy chooses (candidate, class) pairs; the environment scores and
/// applies them
pub struct TypeAllocationEnv {
    candidates: Vec<CandidateEmbedding>,
    candidate_positions: Vec<CoordType>,

    trees: Vec<CoordType>,
    shrubs: Vec<CoordType>,
    skipped: Vec<CoordType>,
    class_counts: [usize; 3],

    occupancy: DynamicGrid<Cell>,

    current_step: usize,
    max_steps: usize,
    tree_distance: f64,
    density_targets: [f64; 2],
}

impl TypeAllocationEnv {
    pub fn new(
        terrain: &Terrain,
        surrounding: Surrounding,
        has_trees: bool,
        has_shrubs: bool,
        params: &CompositionParams,
    ) -> Self {
        let border_field = distance_from_edge(&terrain.filled);
        let reference = match surrounding {
            Surrounding::Road => centroid_distance_field(&terrain.filled),
            Surrounding::Walkway => border_field.clone(),
        };

        let (ref_min, ref_max) = min_max(&reference);
        let min_tree_distance = (ref_max - ref_min) * 0.3 + ref_min;

        let bucket = |d: f64| -> i64 {
            let step = params.contour_distance;
            (d / step).floor() as i64 + if d.rem_euclid(step) > step / 2.0 { 1 } else { 0 }
        };

        let mut candidates = Vec::with_capacity(terrain.candidates.len());
        let mut curve_pairs = Vec::with_capacity(terrain.candidates.len());

        for &pos in &terrain.candidates {
            let coord_dist = reference[pos];
            let (border_contour, border_dist) = match surrounding {
                Surrounding::Road => (bucket(border_field[pos]), border_field[pos]),
                Surrounding::Walkway => (bucket(coord_dist), coord_dist),
            };
            curve_pairs.push((border_contour, OrderedFloat(border_dist)));

            let tree_score = if coord_dist >= min_tree_distance {
                2.0
            } else {
                FORBIDDEN
            };
            let mut shrub_score = 2.0;
            let mut skip_score = 1.0;

            match surrounding {
                Surrounding::Road => {
                    // shrubs belong near the centre, not against the kerb
                    if border_contour <= 1 {
                        shrub_score = 0.0;
                        skip_score = 3.0;
                    } else if coord_dist <= min_tree_distance {
                        shrub_score = 3.0;
                    }
                }
                Surrounding::Walkway => {
                    // shrubs line the walkway edge
                    if border_contour <= 2 {
                        shrub_score = 3.0;
                        skip_score = 0.0;
                    }
                }
            }

            let base = ActionRow {
                tree: tree_score,
                shrub: shrub_score,
                skip: skip_score,
            };

            candidates.push(CandidateEmbedding {
                pos,
                ref_distance: coord_dist.round(),
                border_distance: border_dist,
                near_curve: false,
                remaining_trees: 0.0,
                base,
                current: base,
            });
        }

        // a candidate sharing its (contour, distance) pair with another
        // sits on a straight iso-line; a unique pair means a curve
        let mut pair_counts = HashMap::new();
        for pair in &curve_pairs {
            *pair_counts.entry(*pair).or_insert(0usize) += 1;
        }
        for (candidate, pair) in candidates.iter_mut().zip(curve_pairs.iter()) {
            candidate.near_curve = pair_counts[pair] == 1;
            if candidate.near_curve && candidate.base.tree == 2.0 {
                candidate.base.tree = 3.0;
                candidate.current.tree = 3.0;
            }
        }

        let mut occupancy = DynamicGrid::new(terrain.filled.dimensions());
        for (pos, &filled) in terrain.filled.iter_coords() {
            if filled {
                occupancy[pos] = Cell::Plantable;
            }
        }

        let candidate_positions = terrain.candidates.clone();

        let mut env = Self {
            candidates,
            candidate_positions,
            trees: Vec::new(),
            shrubs: Vec::new(),
            skipped: Vec::new(),
            class_counts: [0; 3],
            occupancy,
            current_step: 0,
            max_steps: params.max_steps,
            tree_distance: params.tree_distance,
            density_targets: [params.shrub_density_target, params.skip_density_target],
        };

        // a palette without trees (or shrubs) forbids the class outright
        for candidate in &mut env.candidates {
            if !has_trees {
                candidate.base.tree = FORBIDDEN;
                candidate.current.tree = FORBIDDEN;
            }
            if !has_shrubs {
                candidate.base.shrub = FORBIDDEN;
                candidate.current.shrub = FORBIDDEN;
            }
        }

        // fold the remaining-tree headroom into every legal tree action
        for i in 0..env.candidates.len() {
            let remaining = env.remaining_tree_count(env.candidates[i].pos);
            let candidate = &mut env.candidates[i];
            candidate.remaining_trees = remaining;
            if candidate.current.tree >= 0.0 {
                candidate.current.tree = candidate.base.tree + remaining;
            }
        }

        env
    }

    pub fn candidates(&self) -> &[CandidateEmbedding] {
        &self.candidates
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Pure lookup of the live reward for one action
    pub fn score_action(&self, action: Action) -> f64 {
        self.candidates[action.candidate].current.get(action.class)
    }

    /// Applies an action assumed to be legal; the caller checks the score
    pub fn apply(&mut self, action: Action) {
        let pos = self.candidates[action.candidate].pos;

        match action.class {
            PlantClass::Tree => {
                self.trees.push(pos);
                self.occupancy[pos] = Cell::Tree;
            }
            PlantClass::Shrub => {
                self.shrubs.push(pos);
                self.occupancy[pos] = Cell::Shrub;
            }
            PlantClass::Skip => {
                self.skipped.push(pos);
            }
        }

        self.class_counts[action.class.index()] += 1;

        if action.class == PlantClass::Tree {
            self.update_tree_exclusion();
        }

        self.candidates[action.candidate].current.forbid_all();
        self.update_density_shaping();
    }

    /// One environment step. Forbidden actions consume budget but leave
    /// the state untouched
    pub fn step(&mut self, action: Action) -> StepOutcome {
        self.current_step += 1;

        let reward = self.score_action(action);
        if reward >= 0.0 {
            self.apply(action);
        } else {
            trace!("policy chose a forbidden action"; "candidate" => action.candidate);
        }

        StepOutcome {
            reward,
            done: self.is_done(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.current_step >= self.max_steps
            || self
                .candidates
                .iter()
                .all(|candidate| candidate.current.all_forbidden())
    }

    pub fn class_density(&self, class: PlantClass) -> f64 {
        let total: usize = self.class_counts.iter().sum();
        if total == 0 {
            0.0
        } else {
            self.class_counts[class.index()] as f64 / total as f64
        }
    }

    pub fn into_placement(self) -> PlacementRecord {
        info!(
            "type allocation finished";
            "steps" => self.current_step,
            "trees" => self.trees.len(),
            "shrubs" => self.shrubs.len(),
            "skipped" => self.skipped.len(),
        );

        PlacementRecord {
            trees: self.trees,
            shrubs: self.shrubs,
            skipped: self.skipped,
            occupancy: self.occupancy,
        }
    }

    /// ln of the number of candidates that could still take a tree if one
    /// were planted at `probe`
    fn remaining_tree_count(&self, probe: CoordType) -> f64 {
        let count = self
            .candidate_positions
            .iter()
            .filter(|&&candidate| {
                self.trees
                    .iter()
                    .chain(once(&probe))
                    .map(|&tree| euclidean(candidate, tree))
                    .fold(f64::MAX, f64::min)
                    >= self.tree_distance
            })
            .count();

        if count > 0 {
            (count as f64).ln()
        } else {
            0.0
        }
    }

    /// Forbid tree actions inside the exclusion radius of any tree, then
    /// refresh the headroom term of the rows still legal
    fn update_tree_exclusion(&mut self) {
        for i in 0..self.candidates.len() {
            let pos = self.candidates[i].pos;
            let min_distance = self
                .trees
                .iter()
                .map(|&tree| euclidean(pos, tree))
                .fold(f64::MAX, f64::min);

            if min_distance < self.tree_distance {
                let candidate = &mut self.candidates[i];
                candidate.base.tree = FORBIDDEN;
                candidate.current.tree = FORBIDDEN;
            }
        }

        for i in 0..self.candidates.len() {
            if self.candidates[i].current.tree >= 0.0 {
                let remaining = self.remaining_tree_count(self.candidates[i].pos);
                let candidate = &mut self.candidates[i];
                candidate.remaining_trees = remaining;
                candidate.current.tree = candidate.base.tree + remaining;
            }
        }
    }

    /// Rescale shrub and skip rewards towards the density targets.
    /// Tree rows are untouched
    fn update_density_shaping(&mut self) {
        let shrub_density = self.class_density(PlantClass::Shrub);
        let skip_density = self.class_density(PlantClass::Skip);

        for candidate in &mut self.candidates {
            if candidate.current.shrub >= 0.0 {
                let factor = (-(shrub_density) / self.density_targets[0]).exp().powi(3);
                candidate.current.shrub = candidate.base.shrub * factor;
            }
            if candidate.current.skip >= 0.0 {
                let factor = (-(skip_density) / self.density_targets[1]).exp().powi(3);
                candidate.current.skip = candidate.base.skip * factor;
            }
        }
    }
}
