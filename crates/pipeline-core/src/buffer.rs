//! Owned buffer handles across host and device memory spaces

use std::fmt;

use crate::error::BufferError;
use crate::memory::{DeviceMemory, DeviceRegion};

/// Memory space a pipeline buffer resides in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySpace {
    Host,
    Device,
}

/// An owned host-memory byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBuffer {
    data: Vec<u8>,
}

impl HostBuffer {
    /// Take ownership of raw host bytes.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Pack `values` as native-endian 32-bit floats.
    #[must_use]
    pub fn from_f32s(values: &[f32]) -> Self {
        let mut data = Vec::with_capacity(values.len() * std::mem::size_of::<f32>());
        for value in values {
            data.extend_from_slice(&value.to_ne_bytes());
        }
        Self { data }
    }

    /// Buffer size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Unwrap into the underlying bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Move this buffer into device memory.
    ///
    /// Allocates a device region of the same size, copies the bytes across,
    /// and yields the device handle. Consuming `self` invalidates the host
    /// handle; its allocation is released when the copy completes, on the
    /// success path and on every failure path alike, so both copies never
    /// outlive the call together.
    pub fn relocate(self, memory: &dyn DeviceMemory) -> Result<DeviceBuffer, BufferError> {
        let mut region = memory.alloc(self.data.len())?;
        region.write(&self.data)?;
        Ok(DeviceBuffer { region })
    }
}

/// An owned device-memory buffer.
pub struct DeviceBuffer {
    region: Box<dyn DeviceRegion>,
}

impl DeviceBuffer {
    /// Buffer size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.region.len()
    }

    /// True when the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Copy the contents back into host memory for inspection.
    pub fn read_to_vec(&self) -> Result<Vec<u8>, BufferError> {
        let mut out = vec![0u8; self.region.len()];
        self.region.read(&mut out)?;
        Ok(out)
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("len", &self.region.len())
            .finish()
    }
}

/// A buffer in whichever memory space the pipeline placed it.
///
/// Whoever receives this value is its sole owner and is responsible for the
/// eventual release, which happens in the matching memory space on drop.
#[derive(Debug)]
pub enum PipelineBuffer {
    Host(HostBuffer),
    Device(DeviceBuffer),
}

impl PipelineBuffer {
    /// Memory space the buffer resides in.
    #[must_use]
    pub fn space(&self) -> MemorySpace {
        match self {
            PipelineBuffer::Host(_) => MemorySpace::Host,
            PipelineBuffer::Device(_) => MemorySpace::Device,
        }
    }

    /// Buffer size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            PipelineBuffer::Host(buffer) => buffer.len(),
            PipelineBuffer::Device(buffer) => buffer.len(),
        }
    }

    /// True when the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contents as host bytes, copying back from the device when needed.
    pub fn to_host_vec(&self) -> Result<Vec<u8>, BufferError> {
        match self {
            PipelineBuffer::Host(buffer) => Ok(buffer.as_bytes().to_vec()),
            PipelineBuffer::Device(buffer) => buffer.read_to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::EmulatedMemory;

    fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    #[test]
    fn test_from_f32s_packs_native_endian() {
        let buffer = HostBuffer::from_f32s(&[480.0, 640.0, 1.0]);
        assert_eq!(buffer.len(), 12);
        assert_eq!(decode_f32s(buffer.as_bytes()), vec![480.0, 640.0, 1.0]);
    }

    #[test]
    fn test_relocate_moves_bytes_to_device() {
        let memory = EmulatedMemory::new();
        let host = HostBuffer::from_f32s(&[480.0, 640.0, 1.0]);
        let expected = host.as_bytes().to_vec();

        let device = host.relocate(&memory).unwrap();
        assert_eq!(device.len(), 12);
        assert_eq!(device.read_to_vec().unwrap(), expected);
    }

    #[test]
    fn test_relocate_propagates_allocation_failure() {
        struct ExhaustedMemory;

        impl DeviceMemory for ExhaustedMemory {
            fn name(&self) -> &'static str {
                "exhausted"
            }

            fn alloc(&self, len: usize) -> Result<Box<dyn DeviceRegion>, BufferError> {
                Err(BufferError::Allocation {
                    len,
                    reason: "out of memory".to_string(),
                })
            }
        }

        let host = HostBuffer::from_f32s(&[1.0]);
        let err = host.relocate(&ExhaustedMemory).unwrap_err();
        assert!(matches!(err, BufferError::Allocation { len: 4, .. }));
    }

    #[test]
    fn test_pipeline_buffer_spaces() {
        let memory = EmulatedMemory::new();
        let host = PipelineBuffer::Host(HostBuffer::from_f32s(&[1.0, 2.0]));
        assert_eq!(host.space(), MemorySpace::Host);
        assert_eq!(host.len(), 8);

        let device = PipelineBuffer::Device(
            HostBuffer::from_f32s(&[1.0, 2.0]).relocate(&memory).unwrap(),
        );
        assert_eq!(device.space(), MemorySpace::Device);
        assert_eq!(device.to_host_vec().unwrap(), host.to_host_vec().unwrap());
    }
}
