//! The device-side program: backend device, kernel variant and resident
//! bottom tensors.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use burn::prelude::*;

use crate::grid::{Bottom, Grid};
use crate::solver::{CalculatorPars, Coefficients, GlobalParameters, SolverError};
use crate::types::Field2;

use super::backend::{FluxBackend, download, upload};
use super::kernel::{PaddedBottom, PaddedState, flux_step};

/// Arithmetic variant the kernel is built with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildVariant {
    /// Plain division.
    #[default]
    Standard,
    /// Reciprocal multiplication with subnormal results flushed to zero.
    Relaxed,
}

impl BuildVariant {
    pub fn from_relaxed(relaxed: bool) -> Self {
        if relaxed { Self::Relaxed } else { Self::Standard }
    }
}

/// Bottom of one grid as uploaded, with the host copy it came from.
struct ResidentBottom<B: Backend> {
    source: Bottom,
    tensors: PaddedBottom<B>,
}

impl<B: Backend> ResidentBottom<B> {
    fn matches(&self, bottom: &Bottom) -> bool {
        self.source.gravity() == bottom.gravity()
            && self.source.height() == bottom.height()
            && self.source.precomputed() == bottom.precomputed()
    }
}

/// A built kernel bound to a device.
///
/// Owns every device buffer it allocated; dropping it releases them.
pub struct FluxProgram<B: FluxBackend> {
    device: B::Device,
    variant: BuildVariant,
    bottoms: Vec<Option<ResidentBottom<B>>>,
}

impl<B: FluxBackend> FluxProgram<B> {
    /// Build the kernel for `variant` on `device`.
    ///
    /// A one-cell warm-up step runs first so backend start-up failures
    /// (missing adapter, shader compilation) surface here. Backends report
    /// device start-up failures by panicking; those panics become
    /// [`SolverError::BackendInit`]. A warm-up that runs but returns garbage
    /// is a [`SolverError::KernelBuild`].
    pub fn build(device: &B::Device, variant: BuildVariant) -> Result<Self, SolverError> {
        catch_unwind(AssertUnwindSafe(|| warm_up::<B>(device, variant)))
            .map_err(backend_init_error)??;
        log::debug!("built {variant:?} flux program on {} ({device:?})", B::label());
        Ok(Self {
            device: device.clone(),
            variant,
            bottoms: Vec::new(),
        })
    }

    pub fn variant(&self) -> BuildVariant {
        self.variant
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Upload the bottom of grid `index` unless the resident copy is current.
    fn bottom_for(
        &mut self,
        index: usize,
        bottom: &Bottom,
        dims: (usize, usize),
    ) -> Result<PaddedBottom<B>, SolverError> {
        if self.bottoms.len() <= index {
            self.bottoms.resize_with(index + 1, || None);
        }
        let slot = &mut self.bottoms[index];
        if let Some(resident) = slot.as_ref().filter(|r| r.matches(bottom)) {
            return Ok(resident.tensors.clone());
        }
        let (rows, cols) = (dims.1 + 2, dims.0 + 2);
        let tensors = PaddedBottom {
            height: upload(padded("bottom", bottom.height(), dims)?, rows, cols, &self.device),
            precomputed: upload(padded("bottom term", bottom.precomputed(), dims)?, rows, cols, &self.device),
        };
        log::trace!("uploaded bottom of grid {index} ({}x{})", dims.0, dims.1);
        *slot = Some(ResidentBottom {
            source: bottom.clone(),
            tensors: tensors.clone(),
        });
        Ok(tensors)
    }

    /// Update the whole interior of `grid` into its destination surface.
    pub fn run(
        &mut self,
        index: usize,
        grid: &mut Grid,
        pars: &CalculatorPars,
        globals: &GlobalParameters,
    ) -> Result<(), SolverError> {
        let (w, h) = (grid.domain_width(), grid.domain_height());
        let gravity = grid.bottom().gravity();
        if gravity != globals.gravity {
            return Err(SolverError::BottomGravityMismatch {
                bottom: gravity,
                params: globals.gravity,
            });
        }
        let bottom = self.bottom_for(index, grid.bottom(), (w, h))?;
        let co = Coefficients::new(globals, pars, grid.rcp_step_w(), grid.rcp_step_h());

        let (input, dest) = grid.split_for_step();
        input.current.check_shape()?;
        dest.check_shape()?;
        if dest.dims() != (w, h) {
            return Err(SolverError::dimension_mismatch(
                format!("destination {w}x{h}"),
                format!("{}x{}", dest.dims().0, dest.dims().1),
            ));
        }
        let (rows, cols) = (h + 2, w + 2);
        let current = input.current;
        let state = PaddedState {
            h: upload(padded("h", &current.h, (w, h))?, rows, cols, &self.device),
            u: upload(padded("u", &current.u, (w, h))?, rows, cols, &self.device),
            v: upload(padded("v", &current.v, (w, h))?, rows, cols, &self.device),
        };
        let out = flux_step(&co, self.variant, &state, &bottom, (w, h));

        let fields = [
            (download(out.h)?, &mut dest.h),
            (download(out.u)?, &mut dest.u),
            (download(out.v)?, &mut dest.v),
        ];
        for (values, field) in fields {
            if values.len() != w * h {
                return Err(SolverError::dimension_mismatch(
                    format!("{} values", w * h),
                    format!("{}", values.len()),
                ));
            }
            for (y, chunk) in values.chunks_exact(w).enumerate() {
                field.row_mut(y as isize).copy_from_slice(chunk);
            }
        }
        Ok(())
    }
}

impl<B: FluxBackend> Drop for FluxProgram<B> {
    fn drop(&mut self) {
        log::debug!(
            "releasing {:?} flux program ({} resident bottoms)",
            self.variant,
            self.bottoms.iter().flatten().count()
        );
    }
}

/// Backing store of `field`, which must be `dims` with a one-cell border, the
/// padded layout the kernel indexes.
fn padded<'f>(name: &str, field: &'f Field2, dims: (usize, usize)) -> Result<&'f [f64], SolverError> {
    if field.dims() != dims || field.border() != 1 {
        return Err(SolverError::dimension_mismatch(
            format!("{name} field {}x{} with a 1-cell border", dims.0, dims.1),
            format!("{}x{} with a {}-cell border", field.width(), field.height(), field.border()),
        ));
    }
    Ok(field.as_slice())
}

/// Turn a panic raised while starting the backend into an error.
fn backend_init_error(payload: Box<dyn Any + Send>) -> SolverError {
    let msg = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "backend panicked".to_string());
    SolverError::BackendInit(msg)
}

/// Run the kernel once on a single wet cell and read the result back.
fn warm_up<B: Backend>(device: &B::Device, variant: BuildVariant) -> Result<(), SolverError> {
    let globals = GlobalParameters::default();
    let pars = CalculatorPars::new(0.0, 0.01)?;
    let co = Coefficients::new(&globals, &pars, 1.0, 1.0);
    let ones = [1.0; 9];
    let zeros = [0.0; 9];
    let state = PaddedState {
        h: upload::<B>(&ones, 3, 3, device),
        u: upload::<B>(&zeros, 3, 3, device),
        v: upload::<B>(&zeros, 3, 3, device),
    };
    let bottom = PaddedBottom {
        height: upload::<B>(&zeros, 3, 3, device),
        precomputed: upload::<B>(&zeros, 3, 3, device),
    };
    let out = flux_step(&co, variant, &state, &bottom, (1, 1));
    let h = download(out.h)?;
    if h.len() != 1 || !h[0].is_finite() {
        return Err(SolverError::KernelBuild(format!("warm-up produced {h:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_up_panic_is_backend_init() {
        let e = backend_init_error(Box::new("no compatible adapter"));
        assert_eq!(e, SolverError::BackendInit("no compatible adapter".into()));
        assert!(e.is_setup_failure());

        let e = backend_init_error(Box::new(String::from("device lost")));
        assert_eq!(e, SolverError::BackendInit("device lost".into()));

        let e = backend_init_error(Box::new(7_u32));
        assert_eq!(e, SolverError::BackendInit("backend panicked".into()));
    }

    #[test]
    fn test_padded_requires_one_cell_border() {
        let ok = Field2::new(4, 3);
        assert_eq!(padded("h", &ok, (4, 3)).unwrap().len(), 6 * 5);

        let wide = Field2::with_border(4, 3, 2);
        assert!(matches!(
            padded("h", &wide, (4, 3)),
            Err(SolverError::DimensionMismatch { .. })
        ));
        assert!(padded("h", &ok, (5, 3)).is_err());
    }
}
