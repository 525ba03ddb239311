use candle_core::Device;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
enum GpuBackend {
    #[cfg(feature = "metal")]
    Metal,
    #[cfg(feature = "cuda")]
    Cuda,
}

impl GpuBackend {
    /// Compiled-in backends, in preference order.
    const COMPILED: &'static [GpuBackend] = &[
        #[cfg(feature = "metal")]
        GpuBackend::Metal,
        #[cfg(feature = "cuda")]
        GpuBackend::Cuda,
    ];

    fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "metal")]
            GpuBackend::Metal => "metal",
            #[cfg(feature = "cuda")]
            GpuBackend::Cuda => "cuda",
        }
    }

    fn open(self) -> candle_core::Result<Device> {
        match self {
            #[cfg(feature = "metal")]
            GpuBackend::Metal => Device::new_metal(0),
            #[cfg(feature = "cuda")]
            GpuBackend::Cuda => Device::new_cuda(0),
        }
    }
}

/// Selects the compute device: the first compiled GPU backend that opens, else CPU.
pub fn select_device() -> Device {
    if GpuBackend::COMPILED.is_empty() {
        debug!("No GPU backend compiled, using CPU device");
        return Device::Cpu;
    }

    let mut failures: Vec<String> = Vec::new();
    for &backend in GpuBackend::COMPILED {
        match backend.open() {
            Ok(device) => {
                info!(backend = backend.name(), "Using GPU acceleration");
                return device;
            }
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "GPU device unavailable");
                failures.push(format!("{} failed: {e}", backend.name()));
            }
        }
    }

    warn!(reason = %failures.join("; "), "Falling back to CPU device");
    Device::Cpu
}
