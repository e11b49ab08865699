//! Step realizations and the factory that picks one.
//!
//! A [`StepMethod`] advances a whole [`Scene`] by one time step: it runs a
//! calculator over every grid, then the grids' actions, then swaps buffers.
//! Four realizations exist:
//!
//! | Kind | Realization |
//! |------|-------------|
//! | `Scalar` | One [`ScalarCalculator`] on the calling thread |
//! | `Batch` | One [`BatchCalculator`] on the calling thread |
//! | `ThreadPool` | Row bands spread over a rayon pool (feature `parallel`) |
//! | `Device` | Tensor kernel on a burn backend (feature `burn`) |
//!
//! [`build_with_fallback`] walks the chain `Device -> ThreadPool -> Batch ->
//! Scalar` from the requested kind and returns the first realization that
//! sets up, together with the failures it skipped.
//!
//! # Example
//!
//! ```
//! use swe_flux::dispatch::{SolverConfig, SolverKind, build_with_fallback};
//! use swe_flux::grid::{Grid, Scene};
//! use swe_flux::solver::GlobalParameters;
//!
//! let mut scene = Scene::new(GlobalParameters::default()).unwrap();
//! scene.add_grid(Grid::new(16, 16, 1.0, 1.0).unwrap());
//!
//! let config = SolverConfig::new(SolverKind::Batch);
//! let (mut method, skipped) = build_with_fallback(&config, &scene).unwrap();
//! assert!(skipped.is_empty());
//! method.step(&mut scene, 0.01).unwrap();
//! assert!((scene.time() - 0.01).abs() < 1e-15);
//! ```

#[cfg(feature = "burn")]
pub mod device;
mod partition;
mod serial;
#[cfg(feature = "parallel")]
mod threaded;

pub use partition::{calc_job_range, job_ranges};
pub use serial::SerialMethod;
#[cfg(feature = "parallel")]
pub use threaded::ThreadPoolMethod;

use std::fmt;
use std::str::FromStr;

use crate::grid::Scene;
use crate::solver::{BatchCalculator, ScalarCalculator, SolverError};

/// A realization of one explicit step over a scene.
pub trait StepMethod {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Advance `scene` by `dt`: update every grid, run actions, swap buffers.
    fn step(&mut self, scene: &mut Scene, dt: f64) -> Result<(), SolverError>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Which realization to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolverKind {
    Scalar,
    #[default]
    Batch,
    ThreadPool,
    Device,
}

impl SolverKind {
    /// Fallback order, fastest first.
    pub const CHAIN: [SolverKind; 4] = [Self::Device, Self::ThreadPool, Self::Batch, Self::Scalar];

    /// This kind followed by every slower kind of [`CHAIN`](Self::CHAIN).
    pub fn fallback_chain(self) -> &'static [SolverKind] {
        let start = Self::CHAIN.iter().position(|k| *k == self).unwrap_or(0);
        &Self::CHAIN[start..]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Batch => "batch",
            Self::ThreadPool => "thread_pool",
            Self::Device => "device",
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverKind {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" => Ok(Self::Scalar),
            "batch" | "simd" => Ok(Self::Batch),
            "thread_pool" | "threadpool" | "threads" => Ok(Self::ThreadPool),
            "device" | "gpu" => Ok(Self::Device),
            other => Err(SolverError::InvalidParameter(format!("unknown solver kind '{other}'"))),
        }
    }
}

/// Device class for the `Device` realization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DeviceTarget {
    /// Host CPU through the ndarray backend.
    Cpu,
    IntegratedGpu,
    #[default]
    DiscreteGpu,
}

/// Factory settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    pub kind: SolverKind,
    /// Device kernels multiply by reciprocals and flush subnormals.
    pub relaxed_math: bool,
    pub device_target: DeviceTarget,
    /// Worker count for `ThreadPool`; 0 means one per available core.
    pub num_threads: usize,
    /// Walk the fallback chain when the requested kind fails to set up.
    pub fallback: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::default(),
            relaxed_math: false,
            device_target: DeviceTarget::default(),
            num_threads: 0,
            fallback: true,
        }
    }
}

impl SolverConfig {
    pub fn new(kind: SolverKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_relaxed_math(mut self, relaxed: bool) -> Self {
        self.relaxed_math = relaxed;
        self
    }

    pub fn with_device_target(mut self, target: DeviceTarget) -> Self {
        self.device_target = target;
        self
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Build exactly the realization `config.kind`, without fallback.
pub fn build_method(config: &SolverConfig, scene: &Scene) -> Result<Box<dyn StepMethod>, SolverError> {
    match config.kind {
        SolverKind::Scalar => Ok(Box::new(SerialMethod::<ScalarCalculator>::new(scene))),
        SolverKind::Batch => Ok(Box::new(SerialMethod::<BatchCalculator>::new(scene))),
        SolverKind::ThreadPool => build_thread_pool(config, scene),
        SolverKind::Device => build_device(config, scene),
    }
}

#[cfg(feature = "parallel")]
fn build_thread_pool(config: &SolverConfig, scene: &Scene) -> Result<Box<dyn StepMethod>, SolverError> {
    let method = ThreadPoolMethod::<BatchCalculator>::new(scene, config.num_threads)?;
    Ok(Box::new(method))
}

#[cfg(not(feature = "parallel"))]
fn build_thread_pool(_config: &SolverConfig, _scene: &Scene) -> Result<Box<dyn StepMethod>, SolverError> {
    Err(SolverError::Unavailable(
        "thread pool realization needs the `parallel` feature".into(),
    ))
}

#[cfg(feature = "burn")]
fn build_device(config: &SolverConfig, scene: &Scene) -> Result<Box<dyn StepMethod>, SolverError> {
    device::build_device_method(config, scene)
}

#[cfg(not(feature = "burn"))]
fn build_device(_config: &SolverConfig, _scene: &Scene) -> Result<Box<dyn StepMethod>, SolverError> {
    Err(SolverError::Unavailable("device realization needs the `burn` feature".into()))
}

/// Build `config.kind`, falling back to slower kinds on setup failure.
///
/// Returns the realization and the errors of the kinds that were skipped.
/// Caller errors (bad parameters) are not skipped past.
pub fn build_with_fallback(
    config: &SolverConfig,
    scene: &Scene,
) -> Result<(Box<dyn StepMethod>, Vec<SolverError>), SolverError> {
    let chain: &[SolverKind] = if config.fallback {
        config.kind.fallback_chain()
    } else {
        std::slice::from_ref(&config.kind)
    };

    let mut skipped = Vec::new();
    for &kind in chain {
        let attempt = SolverConfig {
            kind,
            ..config.clone()
        };
        match build_method(&attempt, scene) {
            Ok(method) => {
                if skipped.is_empty() {
                    log::info!("step method: {}", method.name());
                } else {
                    log::info!(
                        "step method: {} (requested {}, {} fallback(s))",
                        method.name(),
                        config.kind,
                        skipped.len()
                    );
                }
                return Ok((method, skipped));
            }
            Err(e) if config.fallback && e.is_setup_failure() => {
                log::warn!("{kind} realization unavailable, falling back: {e}");
                skipped.push(e);
            }
            Err(e) => return Err(e),
        }
    }
    // Scalar never fails to set up, so this is only reached without fallback.
    Err(skipped
        .pop()
        .unwrap_or_else(|| SolverError::Unavailable(format!("no realization for {}", config.kind))))
}
