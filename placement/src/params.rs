use common::*;
use serde::{Deserialize, Serialize};

use std::path::PathBuf;
use std::sync::Arc;

use structopt::StructOpt;
use strum::{EnumIter, EnumString};

pub type CompositionParamsRef = Arc<CompositionParams>;

/// Which kind of thoroughfare surrounds the plot. Picks the reference
/// distance field used while classifying planting candidates.
#[derive(Debug, Copy, Clone, EnumString, Serialize, Deserialize, PartialEq, Eq)]
pub enum Surrounding {
    Road,
    Walkway,
}

/// Caller-chosen landscape style. Only `Manicured` changes pipeline
/// behaviour (mirror symmetrisation); the rest are carried through for the
/// caller's benefit.
#[derive(Debug, Copy, Clone, EnumString, EnumIter, Serialize, Deserialize, PartialEq, Eq)]
pub enum Style {
    Naturalistic,
    Manicured,
    Meadow,
    Ornamental,
    Minimalist,
    Formal,
    Picturesque,
    Rustic,
    Plantation,
}

#[derive(Debug, StructOpt)]
#[structopt(rename_all = "kebab-case")]
pub struct CompositionParams {
    /// Random if not specified
    #[structopt(long)]
    seed: Option<u64>,

    #[structopt(long, default_value = "100")]
    pub grid_width: usize,

    #[structopt(long, default_value = "100")]
    pub grid_height: usize,

    /// Minimum euclidean distance between any two planting candidates
    #[structopt(long, default_value = "10.0")]
    pub candidate_spacing: f64,

    /// No two trees may stand closer than this
    #[structopt(long, default_value = "50.0")]
    pub tree_distance: f64,

    /// Frame around the grid edge that stays free of candidates
    #[structopt(long, default_value = "5")]
    pub padded_boundary: usize,

    /// Minimum fraction of cells that must dither to candidates before an
    /// unseeded terrain is accepted
    #[structopt(long, default_value = "0.075")]
    pub min_candidate_coverage: f64,

    /// Width of one contour bucket of the reference distance field
    #[structopt(long, default_value = "5.0")]
    pub contour_distance: f64,

    /// Allocation step budget
    #[structopt(long, default_value = "250")]
    pub max_steps: usize,

    #[structopt(long, default_value = "0.65")]
    pub shrub_density_target: f64,

    #[structopt(long, default_value = "0.35")]
    pub skip_density_target: f64,

    /// Regions smaller than this are merged into a neighbour
    #[structopt(long, default_value = "50")]
    pub region_min_size: usize,

    /// Minimum spacing between region seeds after jitter
    #[structopt(long, default_value = "7.0")]
    pub seed_spacing: f64,

    /// Minimum distance a region seed keeps from its region boundary
    #[structopt(long, default_value = "5.0")]
    pub seed_boundary_margin: f64,

    /// Iteration cap for the seed spacing hill climb
    #[structopt(long, default_value = "100")]
    pub jitter_iterations: usize,

    /// Maximum influence difference at which the top two species tie
    #[structopt(long, default_value = "0.1")]
    pub dominance_threshold: f64,

    /// Hard-threshold border fields instead of gradients
    #[structopt(long, parse(try_from_str), default_value)]
    pub binary_scale: bool,

    #[structopt(long, default_value = "20")]
    pub worley_points: usize,

    /// Fraction of shrub placements used to anchor influence radiation
    #[structopt(long, default_value = "0.8")]
    pub starter_fraction: f64,

    /// Exponential decay rate of radiated seed influence
    #[structopt(long, default_value = "0.1")]
    pub influence_decay: f64,

    /// Fraction of the maximum border distance scoring full marks for
    /// border-loving species
    #[structopt(long, default_value = "0.6")]
    pub border_constant_zone: f64,

    /// Fraction of the grid interior preferred by not-border species
    #[structopt(long, default_value = "0.4")]
    pub interior_band: f64,

    /// Optional serialised policy for the type allocator; greedy fallback
    /// when absent
    #[structopt(long)]
    pub policy: Option<PathBuf>,

    #[structopt(long, default_value = "Naturalistic")]
    pub style: Style,

    #[structopt(long, default_value = "Walkway")]
    pub surrounding: Surrounding,

    /// Plant palette json, only read by the binary
    #[structopt(long)]
    pub palette_file: Option<PathBuf>,

    #[structopt(long, default_value = "placement.json")]
    pub output: PathBuf,

    /// Also write a png per composition
    #[structopt(long)]
    pub render: bool,

    /// Image scale per axis
    #[structopt(long, default_value = "4")]
    pub render_scale: u32,
}

impl CompositionParams {
    /// File path on disk. Missing file is not an error, args still apply
    pub fn load_file_with_args(
        config_path: impl AsRef<std::path::Path>,
    ) -> BoxedResult<CompositionParamsRef> {
        use std::io::ErrorKind;

        let cfg = match std::fs::read_to_string(config_path.as_ref()) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // no file, no problem
                warn!(
                    "couldn't find config file '{}', continuing with defaults",
                    config_path.as_ref().display()
                );
                String::new()
            }
            other => other?,
        };

        Self::load(&cfg, std::env::args())
    }

    /// Args must be at least len 1, where first elem is binary name
    fn load(cfg: &str, mut args: impl Iterator<Item = String>) -> BoxedResult<CompositionParamsRef> {
        let mut params = {
            let binary_name = args.next().expect("no 0th arg");
            let mut config_params = vec![binary_name];

            for line in cfg.lines().filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            }) {
                config_params.extend(line.split(' ').map(str::to_owned));
            }

            // binary name || args from file || args from cmdline
            Self::from_iter_safe(config_params.into_iter().chain(args))?
        };

        // generate random seed
        if params.seed.is_none() {
            params.seed = Some(thread_rng().gen())
        }

        Ok(CompositionParamsRef::new(params))
    }

    #[cfg(test)]
    pub fn dummy() -> CompositionParams {
        Self::default().with_seed(0x5eed)
    }

    pub fn seed(&self) -> u64 {
        self.seed.expect("seed should have been initialized")
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn grid_size(&self) -> [usize; 2] {
        [self.grid_width, self.grid_height]
    }

    /// Upper bound on how many candidates the spacing rule admits
    pub fn maximum_planting_spots(&self) -> usize {
        let usable = self.grid_width.saturating_sub(2 * self.padded_boundary);
        let per_axis = usable / self.candidate_spacing.max(1.0) as usize + 1;
        per_axis * per_axis
    }
}

impl Default for CompositionParams {
    /// Documented defaults for every knob, with a freshly randomised seed
    fn default() -> Self {
        let mut params =
            Self::from_iter_safe(once("placement")).expect("default params are parseable");
        params.seed = Some(thread_rng().gen());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_knobs() {
        let params = CompositionParams::dummy();
        assert_eq!(params.grid_size(), [100, 100]);
        assert_eq!(params.padded_boundary, 5);
        assert!((params.candidate_spacing - 10.0).abs() < f64::EPSILON);
        assert!((params.tree_distance - 50.0).abs() < f64::EPSILON);
        assert_eq!(params.max_steps, 250);
        assert_eq!(params.region_min_size, 50);
        assert!(!params.binary_scale);

        // ((100 - 2*5) / 10 + 1)^2
        assert_eq!(params.maximum_planting_spots(), 100);
    }

    #[test]
    fn surrounding_parses_from_cli_names() {
        use std::str::FromStr;
        assert_eq!(Surrounding::from_str("Road").unwrap(), Surrounding::Road);
        assert_eq!(Style::from_str("Manicured").unwrap(), Style::Manicured);
        assert!(Style::from_str("Brutalist").is_err());
    }
}
