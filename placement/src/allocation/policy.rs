use common::*;
use serde::Deserialize;
use std::path::Path;

use super::env::{Action, PlantClass, TypeAllocationEnv};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy artefact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse policy artefact: {0}")]
    Parse(String),
}

/// Decides the next (candidate, class) action given the current
/// environment state. Returning None ends the episode early
pub trait PlacementPolicy {
    fn decide(&mut self, env: &TypeAllocationEnv) -> Option<Action>;
}

/// Fallback policy: take the highest reward in the current table.
/// Ties resolve to the lowest candidate index, then tree < shrub < skip
pub struct GreedyPolicy;

impl PlacementPolicy for GreedyPolicy {
    fn decide(&mut self, env: &TypeAllocationEnv) -> Option<Action> {
        let mut best: Option<(f64, Action)> = None;

        for (index, _) in env.candidates().iter().enumerate() {
            for &class in &PlantClass::ALL {
                let action = Action {
                    candidate: index,
                    class,
                };
                let reward = env.score_action(action);
                if reward < 0.0 {
                    continue;
                }

                match best {
                    Some((top, _)) if reward <= top => {}
                    _ => best = Some((reward, action)),
                }
            }
        }

        best.map(|(_, action)| action)
    }
}

/// A serialised policy artefact: one weight vector per class over the
/// 9-scalar candidate embedding. Scores every legal action by dot product
/// and takes the argmax
#[derive(Debug, Clone, Deserialize)]
pub struct LinearPolicy {
    tree: [f64; 9],
    shrub: [f64; 9],
    skip: [f64; 9],
}

impl LinearPolicy {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let policy = ron::de::from_str(&raw).map_err(|e| PolicyError::Parse(e.to_string()))?;
        info!("loaded policy artefact"; "path" => %path.as_ref().display());
        Ok(policy)
    }

    fn weights(&self, class: PlantClass) -> &[f64; 9] {
        match class {
            PlantClass::Tree => &self.tree,
            PlantClass::Shrub => &self.shrub,
            PlantClass::Skip => &self.skip,
        }
    }
}

impl PlacementPolicy for LinearPolicy {
    fn decide(&mut self, env: &TypeAllocationEnv) -> Option<Action> {
        let mut best: Option<(f64, Action)> = None;

        for (index, candidate) in env.candidates().iter().enumerate() {
            let observation = candidate.observation();

            for &class in &PlantClass::ALL {
                let action = Action {
                    candidate: index,
                    class,
                };

                // forbidden actions are never chosen, whatever the weights say
                if env.score_action(action) < 0.0 {
                    continue;
                }

                let score = observation
                    .iter()
                    .zip(self.weights(class).iter())
                    .map(|(o, w)| o * w)
                    .sum::<f64>();

                match best {
                    Some((top, _)) if score <= top => {}
                    _ => best = Some((score, action)),
                }
            }
        }

        best.map(|(_, action)| action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_policy_parses_ron() {
        let raw = r#"(
            tree:  (0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0),
            shrub: (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0),
            skip:  (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0),
        )"#;

        let policy: LinearPolicy = ron::de::from_str(raw).unwrap();
        assert_eq!(policy.tree[2], 1.0);
        assert_eq!(policy.shrub[7], 1.0);
    }
}
