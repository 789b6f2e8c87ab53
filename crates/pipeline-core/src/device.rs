//! Device placement: compute device and decoder selection
//!
//! The original build-time branch between host and accelerated
//! configurations is a runtime decision here: a preference plus a probe-once
//! capability flag resolve to one of exactly two supported pairs, so both
//! configurations can run in one binary.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineError;
use crate::memory::DeviceMemory;

/// Environment override for the device preference (`auto`, `gpu`, `cpu`).
pub const DEVICE_ENV_VAR: &str = "VIDEO_PIPELINE_DEVICE";

/// Compute device a stage or buffer is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Cpu,
    Gpu,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Cpu => f.write_str("cpu"),
            DeviceType::Gpu => f.write_str("gpu"),
        }
    }
}

/// Decoder implementation paired with the compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderType {
    /// Software decode in host memory.
    Software,
    /// NVDEC hardware decode into device memory.
    Nvdec,
}

/// A consistent `(device, decoder)` pair.
///
/// Exactly two pairings exist: software decode with CPU compute, or NVDEC
/// decode with GPU compute. Fields are private so no other combination can
/// be constructed, and the pair is fixed for the lifetime of one assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSelection {
    device: DeviceType,
    decoder: DecoderType,
}

impl DeviceSelection {
    /// The host pair: CPU compute, software decode.
    #[must_use]
    pub fn host() -> Self {
        Self {
            device: DeviceType::Cpu,
            decoder: DecoderType::Software,
        }
    }

    /// The accelerated pair: GPU compute, NVDEC decode.
    #[must_use]
    pub fn accelerated() -> Self {
        Self {
            device: DeviceType::Gpu,
            decoder: DecoderType::Nvdec,
        }
    }

    /// Compute device of the pair.
    #[must_use]
    pub fn device(&self) -> DeviceType {
        self.device
    }

    /// Decoder implementation of the pair.
    #[must_use]
    pub fn decoder(&self) -> DecoderType {
        self.decoder
    }

    /// Resolve the pair from a preference and the probed capability flag.
    ///
    /// Requesting accelerated compute in an environment without it is a
    /// fatal configuration error; there is no fallback to the host pair and
    /// no retry.
    pub fn resolve(
        preference: DevicePreference,
        caps: &DeviceCapabilities,
    ) -> Result<Self, PipelineError> {
        match preference {
            DevicePreference::Host => Ok(Self::host()),
            DevicePreference::Accelerated => {
                if caps.accelerated {
                    Ok(Self::accelerated())
                } else {
                    Err(PipelineError::Configuration(
                        "accelerated compute requested but no supported device is available"
                            .to_string(),
                    ))
                }
            }
            DevicePreference::Auto => Ok(if caps.accelerated {
                Self::accelerated()
            } else {
                Self::host()
            }),
        }
    }
}

/// Requested device placement, before capability resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Accelerated when available, host otherwise.
    #[default]
    Auto,
    /// Accelerated compute, failing when unavailable.
    Accelerated,
    /// Host compute.
    Host,
}

impl DevicePreference {
    /// Read the preference from [`DEVICE_ENV_VAR`], defaulting to `Auto`.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(DEVICE_ENV_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for DevicePreference {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "gpu" | "cuda" | "accelerated" => Ok(DevicePreference::Accelerated),
            "cpu" | "host" => Ok(DevicePreference::Host),
            other => Err(PipelineError::Configuration(format!(
                "unknown device preference: {other}"
            ))),
        }
    }
}

/// Capability flag for the runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Whether accelerated compute is available.
    pub accelerated: bool,
}

impl DeviceCapabilities {
    /// Probe the environment; the probe runs once per process and later
    /// calls return the cached flag. There is no reconfiguration after the
    /// first assembly consumes it.
    pub fn detect() -> Self {
        static CAPS: OnceCell<DeviceCapabilities> = OnceCell::new();
        *CAPS.get_or_init(|| {
            let accelerated = probe_accelerated();
            info!(accelerated, "device capabilities probed");
            DeviceCapabilities { accelerated }
        })
    }
}

#[cfg(feature = "cuda")]
fn probe_accelerated() -> bool {
    crate::memory::cuda::CudaMemory::new(0).is_ok()
}

#[cfg(not(feature = "cuda"))]
fn probe_accelerated() -> bool {
    false
}

/// Resolved placement handed to stage factories and buffer builders.
///
/// Accelerated placement always carries the device-memory strategy backing
/// it, so a consumer can never hold a GPU placement without a way to
/// allocate on it.
#[derive(Clone)]
pub enum DeviceContext {
    /// Buffers stay in host memory.
    Host,
    /// Buffers are relocated into the given device memory.
    Accelerated(Arc<dyn DeviceMemory>),
}

impl DeviceContext {
    /// The compute device this context places buffers on.
    #[must_use]
    pub fn device(&self) -> DeviceType {
        match self {
            DeviceContext::Host => DeviceType::Cpu,
            DeviceContext::Accelerated(_) => DeviceType::Gpu,
        }
    }
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceContext::Host => f.write_str("DeviceContext::Host"),
            DeviceContext::Accelerated(memory) => {
                write!(f, "DeviceContext::Accelerated({})", memory.name())
            }
        }
    }
}
