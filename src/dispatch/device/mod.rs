//! Device realization on a burn backend.
//!
//! The whole interior of each grid is updated by one tensor kernel (see
//! [`kernel`]), then read back so the grid's actions run on the host as in
//! every other realization.
//!
//! | Target | Backend | Feature |
//! |--------|---------|---------|
//! | `Cpu` | `NdArray<f64>` | `burn-ndarray` |
//! | `IntegratedGpu`, `DiscreteGpu` | `Wgpu` | `burn-wgpu` |
//!
//! Results match the host calculators to the backend's float precision;
//! `Wgpu` computes in `f32`.

mod backend;
mod kernel;
mod program;

pub use backend::FluxBackend;
pub use program::{BuildVariant, FluxProgram};

use crate::grid::Scene;
use crate::solver::{CalculatorPars, SolverError};

use super::{DeviceTarget, SolverConfig, StepMethod};

/// Steps a scene with a [`FluxProgram`] on backend `B`.
pub struct DeviceMethod<B: FluxBackend> {
    device: B::Device,
    variant: BuildVariant,
    program: Option<FluxProgram<B>>,
}

impl<B: FluxBackend> DeviceMethod<B> {
    pub fn new(target: DeviceTarget, relaxed_math: bool) -> Result<Self, SolverError> {
        let device = B::device_for(target)?;
        let variant = BuildVariant::from_relaxed(relaxed_math);
        let program = FluxProgram::build(&device, variant)?;
        log::info!("device realization on {} ({target:?}, {variant:?})", B::label());
        Ok(Self {
            device,
            variant,
            program: Some(program),
        })
    }

    pub fn variant(&self) -> BuildVariant {
        self.variant
    }

    /// Whether a usable program is loaded.
    pub fn is_ready(&self) -> bool {
        self.program.is_some()
    }

    /// Switch arithmetic variant, rebuilding the program if it changes.
    pub fn set_relaxed_math(&mut self, relaxed: bool) -> Result<(), SolverError> {
        let variant = BuildVariant::from_relaxed(relaxed);
        if variant == self.variant && self.program.is_some() {
            return Ok(());
        }
        self.variant = variant;
        self.rebuild()
    }

    /// Replace the program: wait for the device, release the old program,
    /// then build a new one. On failure no program is loaded and every
    /// following step fails with [`SolverError::Unavailable`].
    pub fn rebuild(&mut self) -> Result<(), SolverError> {
        B::sync(&self.device);
        drop(self.program.take());
        self.build_program()
    }

    /// Rebuild for another variant and device target.
    pub fn rebuild_with(&mut self, variant: BuildVariant, target: DeviceTarget) -> Result<(), SolverError> {
        B::sync(&self.device);
        drop(self.program.take());
        self.variant = variant;
        self.device = B::device_for(target).inspect_err(|e| {
            log::warn!("cannot move flux program to {target:?}: {e}");
        })?;
        self.build_program()
    }

    fn build_program(&mut self) -> Result<(), SolverError> {
        log::warn!("rebuilding {:?} flux program on {}", self.variant, B::label());
        match FluxProgram::build(&self.device, self.variant) {
            Ok(program) => {
                self.program = Some(program);
                Ok(())
            }
            Err(e) => {
                log::error!("flux program rebuild failed: {e}");
                Err(e)
            }
        }
    }
}

impl<B: FluxBackend> StepMethod for DeviceMethod<B> {
    fn name(&self) -> &'static str {
        "device"
    }

    fn step(&mut self, scene: &mut Scene, dt: f64) -> Result<(), SolverError> {
        let program = self
            .program
            .as_mut()
            .ok_or_else(|| SolverError::Unavailable("no flux program loaded".into()))?;
        let pars = CalculatorPars::new(scene.time(), dt)?;
        let globals = *scene.globals();
        globals.validate()?;
        for (i, grid) in scene.grids_mut().iter_mut().enumerate() {
            program.run(i, grid, &pars, &globals)?;
        }
        scene.run_actions(&pars);
        scene.proceed_to_next_step(dt);
        Ok(())
    }
}

/// Build the device realization for `config.device_target`.
pub fn build_device_method(config: &SolverConfig, _scene: &Scene) -> Result<Box<dyn StepMethod>, SolverError> {
    match config.device_target {
        DeviceTarget::Cpu => cpu_method(config),
        DeviceTarget::IntegratedGpu | DeviceTarget::DiscreteGpu => gpu_method(config),
    }
}

#[cfg(feature = "burn-ndarray")]
fn cpu_method(config: &SolverConfig) -> Result<Box<dyn StepMethod>, SolverError> {
    let method = DeviceMethod::<burn_ndarray::NdArray<f64>>::new(DeviceTarget::Cpu, config.relaxed_math)?;
    Ok(Box::new(method))
}

#[cfg(not(feature = "burn-ndarray"))]
fn cpu_method(_config: &SolverConfig) -> Result<Box<dyn StepMethod>, SolverError> {
    Err(SolverError::Unavailable(
        "CPU device target needs the `burn-ndarray` feature".into(),
    ))
}

#[cfg(feature = "burn-wgpu")]
fn gpu_method(config: &SolverConfig) -> Result<Box<dyn StepMethod>, SolverError> {
    let method = DeviceMethod::<burn_wgpu::Wgpu>::new(config.device_target, config.relaxed_math)?;
    Ok(Box::new(method))
}

#[cfg(not(feature = "burn-wgpu"))]
fn gpu_method(_config: &SolverConfig) -> Result<Box<dyn StepMethod>, SolverError> {
    Err(SolverError::Unavailable(
        "GPU device targets need the `burn-wgpu` feature".into(),
    ))
}
