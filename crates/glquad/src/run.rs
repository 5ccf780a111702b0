use anyhow::Result;
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::paths::resolve_resource_dir;

pub fn run(cli: Cli) -> Result<()> {
    let config = renderer_config(&cli);
    tracing::debug!(
        resources = %config.resource_dir.display(),
        shader = %config.shader_name,
        size = ?config.surface_size,
        gpu_errors = %config.gpu_errors,
        diagnostics = config.shader_diagnostics,
        "resolved glquad configuration"
    );

    let mut renderer = Renderer::new(config);
    if cli.check {
        renderer.build_program()?;
        tracing::info!("shader program check passed");
        return Ok(());
    }
    renderer.run()
}

pub fn renderer_config(cli: &Cli) -> RendererConfig {
    let defaults = RendererConfig::default();
    RendererConfig {
        surface_size: cli.size,
        resource_dir: resolve_resource_dir(cli.resources.as_deref()),
        shader_name: cli.shader.clone(),
        power: cli.power,
        gpu_errors: cli.gpu_errors,
        shader_diagnostics: cli
            .shader_diagnostics
            .unwrap_or(defaults.shader_diagnostics),
        fixed_time: cli.time,
    }
}

pub fn initialise_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::*;

    #[test]
    fn cli_flags_flow_into_renderer_config() {
        let cli = Cli::try_parse_from([
            "glquad",
            "--resources",
            "/srv/shaders",
            "--size",
            "1024x768",
            "--time",
            "0.25",
            "--shader-diagnostics",
            "true",
        ])
        .unwrap();
        let config = renderer_config(&cli);
        assert_eq!(config.resource_dir, PathBuf::from("/srv/shaders"));
        assert_eq!(config.surface_size, (1024, 768));
        assert_eq!(config.fixed_time, Some(0.25));
        assert!(config.shader_diagnostics);
        assert_eq!(config.shader_name, "Shader");
    }
}
