//! Adapter discovery and device creation for the aspect kernel
//!
//! A machine without any adapter and a machine whose adapter refuses to open
//! a device are reported separately. The first is normal on headless hosts,
//! the second usually points at a driver problem.

/// Outcome of `GpuContext::new`
#[derive(Debug)]
pub enum GpuInitResult {
    #[cfg(feature = "gpu")]
    Success(GpuContext),
    /// No adapter on this machine
    NoGpuFound,
    /// An adapter exists but `request_device` failed
    InitFailed { adapter_name: String, error: String },
}

#[cfg(feature = "gpu")]
mod gpu_impl {
    use super::GpuInitResult;
    use tracing::{debug, info};

    /// GPU context owning the wgpu device and queue
    #[derive(Debug)]
    pub struct GpuContext {
        device: wgpu::Device,
        queue: wgpu::Queue,
        adapter_info: wgpu::AdapterInfo,
    }

    impl GpuContext {
        /// Pick the highest-performance adapter and open a device on it
        #[allow(clippy::new_ret_no_self)]
        pub fn new() -> GpuInitResult {
            let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            let Some(adapter) = request_adapter(&instance) else {
                debug!("No GPU adapter found");
                return GpuInitResult::NoGpuFound;
            };
            let adapter_info = adapter.get_info();
            debug!(
                "Found GPU adapter: {} ({:?})",
                adapter_info.name, adapter_info.backend
            );

            let descriptor = wgpu::DeviceDescriptor {
                label: Some("Aspect GPU"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::Performance,
            };
            match pollster::block_on(adapter.request_device(&descriptor, None)) {
                Ok((device, queue)) => {
                    info!("Aspect kernel device ready on {}", adapter_info.name);
                    GpuInitResult::Success(Self {
                        device,
                        queue,
                        adapter_info,
                    })
                }
                Err(e) => GpuInitResult::InitFailed {
                    adapter_name: adapter_info.name,
                    error: e.to_string(),
                },
            }
        }

        /// Adapter name for logging (e.g. "NVIDIA `GeForce` GTX 1660")
        #[must_use]
        pub fn adapter_name(&self) -> &str {
            &self.adapter_info.name
        }

        /// Check if a `rows × cols` grid fits the device
        ///
        /// The kernel needs one `f32` input and one `f32` output buffer plus a
        /// staging copy of the output, each `rows × cols × 4` bytes.
        #[must_use]
        pub fn can_allocate(&self, rows: usize, cols: usize) -> bool {
            let cells = (rows as u64).saturating_mul(cols as u64);
            let buffer_bytes = cells.saturating_mul(4);
            let limits = self.device.limits();

            if buffer_bytes > limits.max_buffer_size
                || buffer_bytes > u64::from(limits.max_storage_buffer_binding_size)
            {
                return false;
            }

            // One invocation per cell with 16x16 workgroups
            let groups_x = (cols as u64).div_ceil(16);
            let groups_y = (rows as u64).div_ceil(16);
            let max_groups = u64::from(limits.max_compute_workgroups_per_dimension);
            groups_x <= max_groups && groups_y <= max_groups
        }

        #[must_use]
        pub fn device(&self) -> &wgpu::Device {
            &self.device
        }

        #[must_use]
        pub fn queue(&self) -> &wgpu::Queue {
            &self.queue
        }
    }

    fn request_adapter(instance: &wgpu::Instance) -> Option<wgpu::Adapter> {
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_gpu_init_returns_valid_result() {
            // Which variant comes back depends on the machine
            match GpuContext::new() {
                GpuInitResult::Success(ctx) => {
                    assert!(!ctx.adapter_name().is_empty());
                    assert!(ctx.can_allocate(512, 512));
                }
                GpuInitResult::NoGpuFound => {}
                GpuInitResult::InitFailed {
                    adapter_name,
                    error,
                } => {
                    assert!(!adapter_name.is_empty());
                    assert!(!error.is_empty());
                }
            }
        }

        #[test]
        fn test_can_allocate_rejects_huge_grid() {
            if let GpuInitResult::Success(ctx) = GpuContext::new() {
                assert!(!ctx.can_allocate(1 << 20, 1 << 20));
            }
        }
    }
}

#[cfg(feature = "gpu")]
pub use gpu_impl::GpuContext;
