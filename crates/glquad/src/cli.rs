use std::path::PathBuf;

use clap::Parser;
use renderer::{GpuErrorPolicy, GpuPowerPreference};

#[derive(Parser, Debug)]
#[command(
    name = "glquad",
    author,
    version,
    about = "Renders a shader-driven quad once per display refresh"
)]
pub struct Cli {
    /// Directory holding the `<NAME>.vsh` / `<NAME>.fsh` shader pair.
    #[arg(long, value_name = "DIR", env = "GLQUAD_RESOURCES")]
    pub resources: Option<PathBuf>,

    /// Base name of the shader pair.
    #[arg(long, value_name = "NAME", default_value = "Shader")]
    pub shader: String,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "800x600")]
    pub size: (u32, u32),

    /// Adapter power preference: `low` or `high`.
    #[arg(long, value_name = "PREFERENCE", value_parser = parse_power, default_value = "high")]
    pub power: GpuPowerPreference,

    /// Freeze the animation clock at this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub time: Option<f32>,

    /// What to do with GPU API errors: `fatal` (default in debug builds) or `log`.
    #[arg(
        long,
        value_name = "POLICY",
        value_parser = parse_gpu_errors,
        default_value_t = GpuErrorPolicy::default()
    )]
    pub gpu_errors: GpuErrorPolicy,

    /// Log shader compile and link diagnostics (on by default in debug builds).
    #[arg(long, value_name = "BOOL")]
    pub shader_diagnostics: Option<bool>,

    /// Build the shader program and exit without opening a window.
    #[arg(long)]
    pub check: bool,

    /// Raise the default log level to `debug`.
    #[arg(long, short)]
    pub verbose: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT, e.g. 800x600".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in size specification".to_string())?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" | "discrete" => Ok(GpuPowerPreference::High),
        other => Err(format!("unknown power preference '{other}'; expected low or high")),
    }
}

pub fn parse_gpu_errors(value: &str) -> Result<GpuErrorPolicy, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fatal" | "assert" | "panic" => Ok(GpuErrorPolicy::Fatal),
        "log" | "warn" | "ignore" => Ok(GpuErrorPolicy::Log),
        other => Err(format!("unknown GPU error policy '{other}'; expected fatal or log")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_sizes() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size(" 640 X 480 ").unwrap(), (640, 480));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x480").is_err());
        assert!(parse_size("widexhigh").is_err());
    }

    #[test]
    fn parses_power_preferences() {
        assert_eq!(parse_power("LOW").unwrap(), GpuPowerPreference::Low);
        assert_eq!(parse_power("discrete").unwrap(), GpuPowerPreference::High);
        assert!(parse_power("medium").is_err());
    }

    #[test]
    fn parses_gpu_error_policies() {
        assert_eq!(parse_gpu_errors("fatal").unwrap(), GpuErrorPolicy::Fatal);
        assert_eq!(parse_gpu_errors("log").unwrap(), GpuErrorPolicy::Log);
        assert!(parse_gpu_errors("retry").is_err());
    }

    #[test]
    fn defaults_match_the_demo() {
        let cli = Cli::try_parse_from(["glquad"]).unwrap();
        assert_eq!(cli.shader, "Shader");
        assert_eq!(cli.size, (800, 600));
        assert_eq!(cli.power, GpuPowerPreference::High);
        assert!(!cli.check);
        assert!(cli.time.is_none());
    }

    #[test]
    fn accepts_explicit_flags() {
        let cli = Cli::try_parse_from([
            "glquad",
            "--resources",
            "/tmp/res",
            "--shader",
            "Other",
            "--size",
            "320x200",
            "--time",
            "1.5",
            "--gpu-errors",
            "log",
            "--shader-diagnostics",
            "false",
            "--check",
        ])
        .unwrap();
        assert_eq!(cli.resources, Some(PathBuf::from("/tmp/res")));
        assert_eq!(cli.shader, "Other");
        assert_eq!(cli.size, (320, 200));
        assert_eq!(cli.time, Some(1.5));
        assert_eq!(cli.gpu_errors, GpuErrorPolicy::Log);
        assert_eq!(cli.shader_diagnostics, Some(false));
        assert!(cli.check);
    }
}
