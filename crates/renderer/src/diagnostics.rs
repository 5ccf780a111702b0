//! GPU API error reporting.
//!
//! Errors raised inside an explicit error scope are returned to the caller as
//! values. Everything else reaches the device's uncaptured-error handler,
//! where [`GpuErrorPolicy`] decides between asserting and logging.

use crate::types::GpuErrorPolicy;

/// Routes uncaptured device errors through `policy`.
pub(crate) fn install_error_handler(device: &wgpu::Device, policy: GpuErrorPolicy) {
    device.on_uncaptured_error(Box::new(move |error: wgpu::Error| {
        report_uncaptured(policy, &error.to_string());
    }));
    tracing::debug!(%policy, "installed GPU error handler");
}

fn report_uncaptured(policy: GpuErrorPolicy, message: &str) {
    tracing::error!(%policy, "uncaptured GPU error: {message}");
    if policy == GpuErrorPolicy::Fatal {
        panic!("GPU error: {message}");
    }
}

/// Runs `f` inside a validation error scope and returns whatever the scope
/// caught alongside its result.
pub(crate) fn capture_validation<T>(
    device: &wgpu::Device,
    f: impl FnOnce() -> T,
) -> (T, Option<wgpu::Error>) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let error = pollster::block_on(device.pop_error_scope());
    (value, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_policy_keeps_running() {
        report_uncaptured(GpuErrorPolicy::Log, "Validation Error: test");
    }

    #[test]
    #[should_panic(expected = "GPU error")]
    fn fatal_policy_asserts() {
        report_uncaptured(GpuErrorPolicy::Fatal, "Validation Error: test");
    }
}
