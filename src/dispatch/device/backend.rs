//! Backends usable by the device realization.

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::dispatch::DeviceTarget;
use crate::solver::SolverError;

/// A burn backend that can resolve a [`DeviceTarget`] to one of its devices.
pub trait FluxBackend: Backend {
    /// Backend name for logging.
    fn label() -> &'static str;

    fn device_for(target: DeviceTarget) -> Result<Self::Device, SolverError>;
}

#[cfg(feature = "burn-ndarray")]
impl FluxBackend for burn_ndarray::NdArray<f64> {
    fn label() -> &'static str {
        "ndarray"
    }

    fn device_for(target: DeviceTarget) -> Result<Self::Device, SolverError> {
        match target {
            DeviceTarget::Cpu => Ok(burn_ndarray::NdArrayDevice::Cpu),
            other => Err(SolverError::Unavailable(format!(
                "ndarray backend only drives the CPU, requested {other:?}"
            ))),
        }
    }
}

#[cfg(feature = "burn-wgpu")]
impl FluxBackend for burn_wgpu::Wgpu {
    fn label() -> &'static str {
        "wgpu"
    }

    fn device_for(target: DeviceTarget) -> Result<Self::Device, SolverError> {
        Ok(match target {
            DeviceTarget::Cpu => burn_wgpu::WgpuDevice::Cpu,
            DeviceTarget::IntegratedGpu => burn_wgpu::WgpuDevice::IntegratedGpu(0),
            DeviceTarget::DiscreteGpu => burn_wgpu::WgpuDevice::DiscreteGpu(0),
        })
    }
}

/// Upload a row-major `rows x cols` array.
pub(super) fn upload<B: Backend>(data: &[f64], rows: usize, cols: usize, device: &B::Device) -> Tensor<B, 2> {
    let data = TensorData::new(data.to_vec(), [rows, cols]).convert::<B::FloatElem>();
    Tensor::from_data(data, device)
}

/// Download a 2D tensor as row-major `f64`.
pub(super) fn download<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<f64>, SolverError> {
    tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| SolverError::DataTransfer(format!("{e:?}")))
}

#[cfg(all(test, feature = "burn-ndarray"))]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    #[test]
    fn test_round_trip() {
        let device = NdArray::<f64>::device_for(DeviceTarget::Cpu).unwrap();
        let t = upload::<NdArray<f64>>(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3, &device);
        assert_eq!(t.dims(), [2, 3]);
        assert_eq!(download(t).unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_ndarray_rejects_gpu_target() {
        assert!(matches!(
            NdArray::<f64>::device_for(DeviceTarget::DiscreteGpu),
            Err(SolverError::Unavailable(_))
        ));
    }
}
