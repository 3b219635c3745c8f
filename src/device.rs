//! Accelerator synchronization barrier
//!
//! Work queued on an accelerator runs asynchronously, so the host clock can
//! read "done" while kernels are still in flight. A `DeviceSync` forces all
//! outstanding device work to complete. The tracker calls it immediately
//! before capturing the start timestamp and again before capturing the end
//! timestamp.
//!
//! Synchronization blocks for as long as the device needs and cannot fail
//! from the tracker's point of view. A machine without an accelerator uses
//! `NoDevice`, which turns the barrier into a no-op.

/// Blocking barrier over asynchronous device work
pub trait DeviceSync: Send + Sync {
    /// Whether a device is actually attached
    fn is_present(&self) -> bool {
        true
    }

    /// Block until all queued device work has completed
    fn synchronize(&self);
}

/// No accelerator attached
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

impl DeviceSync for NoDevice {
    fn is_present(&self) -> bool {
        false
    }

    fn synchronize(&self) {}
}

/// Pick the best available device backend
///
/// Returns the CUDA backend when the `cuda` feature is enabled and a device
/// is found, `NoDevice` otherwise.
pub fn detect() -> Box<dyn DeviceSync> {
    #[cfg(feature = "cuda")]
    {
        if let Some(device) = cuda::CudaDevice::detect(0) {
            return Box::new(device);
        }
    }
    tracing::debug!("No accelerator detected, device synchronization disabled");
    Box::new(NoDevice)
}

#[cfg(feature = "cuda")]
pub use cuda::CudaDevice;

#[cfg(feature = "cuda")]
mod cuda {
    use super::DeviceSync;
    use cudarc::driver::CudaContext;
    use std::sync::Arc;

    /// CUDA context synchronization (feature `cuda`)
    pub struct CudaDevice {
        ordinal: usize,
        context: Arc<CudaContext>,
    }

    impl std::fmt::Debug for CudaDevice {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("CudaDevice")
                .field("ordinal", &self.ordinal)
                .finish()
        }
    }

    impl CudaDevice {
        /// Open the CUDA device with the given ordinal, if there is one
        pub fn detect(ordinal: usize) -> Option<Self> {
            match CudaContext::new(ordinal) {
                Ok(context) => {
                    tracing::debug!(ordinal, "CUDA device attached for synchronization");
                    Some(CudaDevice { ordinal, context })
                }
                Err(e) => {
                    tracing::debug!(ordinal, error = %e, "CUDA device unavailable");
                    None
                }
            }
        }
    }

    impl DeviceSync for CudaDevice {
        fn synchronize(&self) {
            // A failed barrier must not abort the measured program
            if let Err(e) = self.context.synchronize() {
                tracing::warn!(ordinal = self.ordinal, error = %e, "CUDA synchronize failed");
            }
        }
    }
}
