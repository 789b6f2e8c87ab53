//! Device memory strategy: allocation and copies across memory spaces
//!
//! The backend is chosen once at startup and handed to consumers through
//! [`DeviceContext`](crate::device::DeviceContext) as an explicit argument,
//! never read from process globals. Copies are blocking; a failed allocation
//! or copy surfaces as a [`BufferError`] and is not retried.

use crate::error::BufferError;

/// One allocated region of device memory.
///
/// Dropping the region releases the allocation in its backend.
pub trait DeviceRegion: Send {
    /// Region size in bytes.
    fn len(&self) -> usize;

    /// True when the region holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the whole region with `bytes`. Blocking.
    fn write(&mut self, bytes: &[u8]) -> Result<(), BufferError>;

    /// Copy the whole region into `out`. Blocking.
    fn read(&self, out: &mut [u8]) -> Result<(), BufferError>;
}

/// A device memory backend.
pub trait DeviceMemory: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Allocate a zeroed region of `len` bytes.
    fn alloc(&self, len: usize) -> Result<Box<dyn DeviceRegion>, BufferError>;
}

/// Device backend that stores regions in ordinary process memory.
///
/// Stands in for a real accelerator so the accelerated pipeline layout runs
/// on machines without one (CI, the test suite). Regions are distinct
/// allocations and all traffic goes through explicit whole-region copies,
/// the same discipline a real backend enforces.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmulatedMemory;

impl EmulatedMemory {
    /// Create the emulated backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DeviceMemory for EmulatedMemory {
    fn name(&self) -> &'static str {
        "emulated"
    }

    fn alloc(&self, len: usize) -> Result<Box<dyn DeviceRegion>, BufferError> {
        Ok(Box::new(EmulatedRegion {
            bytes: vec![0u8; len].into_boxed_slice(),
        }))
    }
}

struct EmulatedRegion {
    bytes: Box<[u8]>,
}

impl DeviceRegion for EmulatedRegion {
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        if bytes.len() != self.bytes.len() {
            return Err(BufferError::Transfer {
                len: bytes.len(),
                reason: format!("source size does not match region size {}", self.bytes.len()),
            });
        }
        self.bytes.copy_from_slice(bytes);
        Ok(())
    }

    fn read(&self, out: &mut [u8]) -> Result<(), BufferError> {
        if out.len() != self.bytes.len() {
            return Err(BufferError::Transfer {
                len: out.len(),
                reason: format!(
                    "destination size does not match region size {}",
                    self.bytes.len()
                ),
            });
        }
        out.copy_from_slice(&self.bytes);
        Ok(())
    }
}

/// CUDA-backed device memory via `cudarc`.
#[cfg(feature = "cuda")]
pub mod cuda {
    use std::sync::Arc;

    use cudarc::driver::{CudaDevice, CudaSlice, DeviceSlice};

    use super::{DeviceMemory, DeviceRegion};
    use crate::error::{BufferError, PipelineError};

    /// Device memory on one CUDA device.
    pub struct CudaMemory {
        device: Arc<CudaDevice>,
    }

    impl CudaMemory {
        /// Open the CUDA device with the given ordinal.
        pub fn new(ordinal: usize) -> Result<Self, PipelineError> {
            let device = CudaDevice::new(ordinal).map_err(|e| {
                PipelineError::Configuration(format!("failed to open CUDA device {ordinal}: {e}"))
            })?;
            Ok(Self { device })
        }
    }

    impl DeviceMemory for CudaMemory {
        fn name(&self) -> &'static str {
            "cuda"
        }

        fn alloc(&self, len: usize) -> Result<Box<dyn DeviceRegion>, BufferError> {
            let slice = self
                .device
                .alloc_zeros::<u8>(len)
                .map_err(|e| BufferError::Allocation {
                    len,
                    reason: e.to_string(),
                })?;
            Ok(Box::new(CudaRegion {
                device: Arc::clone(&self.device),
                slice,
            }))
        }
    }

    struct CudaRegion {
        device: Arc<CudaDevice>,
        slice: CudaSlice<u8>,
    }

    impl DeviceRegion for CudaRegion {
        fn len(&self) -> usize {
            self.slice.len()
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
            if bytes.len() != self.slice.len() {
                return Err(BufferError::Transfer {
                    len: bytes.len(),
                    reason: format!("source size does not match region size {}", self.slice.len()),
                });
            }
            self.device
                .htod_sync_copy_into(bytes, &mut self.slice)
                .map_err(|e| BufferError::Transfer {
                    len: bytes.len(),
                    reason: e.to_string(),
                })
        }

        fn read(&self, out: &mut [u8]) -> Result<(), BufferError> {
            if out.len() != self.slice.len() {
                return Err(BufferError::Transfer {
                    len: out.len(),
                    reason: format!(
                        "destination size does not match region size {}",
                        self.slice.len()
                    ),
                });
            }
            self.device
                .dtoh_sync_copy_into(&self.slice, out)
                .map_err(|e| BufferError::Transfer {
                    len: out.len(),
                    reason: e.to_string(),
                })
        }
    }
}
