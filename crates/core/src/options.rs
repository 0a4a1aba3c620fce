//! Options for the [`aspect`](crate::aspect) entry point

use crate::chunked::ProcessingMode;
use crate::device::DevicePolicy;
use serde::{Deserialize, Serialize};

/// Default name given to the output raster
pub const DEFAULT_OUTPUT_NAME: &str = "aspect";

/// Caller-facing configuration
///
/// Every field has a default, so partial configurations deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AspectOptions {
    /// Name of the output raster
    pub name: String,
    /// Behaviour when a device-stored raster meets a machine without a GPU
    pub device: DevicePolicy,
    /// Scheduling of blocks for chunked rasters
    pub chunks: ProcessingMode,
}

impl Default for AspectOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_OUTPUT_NAME.to_string(),
            device: DevicePolicy::RequireGpu,
            chunks: ProcessingMode::Parallel,
        }
    }
}

impl AspectOptions {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_device_policy(mut self, device: DevicePolicy) -> Self {
        self.device = device;
        self
    }

    pub fn with_chunk_mode(mut self, chunks: ProcessingMode) -> Self {
        self.chunks = chunks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_never_fall_back_silently() {
        let options = AspectOptions::default();
        assert_eq!(options.name, "aspect");
        assert_eq!(options.device, DevicePolicy::RequireGpu);
        assert_eq!(options.chunks, ProcessingMode::Parallel);
    }

    #[test]
    fn builder_overrides() {
        let options = AspectOptions::default()
            .with_name("facing")
            .with_device_policy(DevicePolicy::AllowHost)
            .with_chunk_mode(ProcessingMode::Sequential);
        assert_eq!(options.name, "facing");
        assert_eq!(options.device, DevicePolicy::AllowHost);
        assert_eq!(options.chunks, ProcessingMode::Sequential);
    }
}
