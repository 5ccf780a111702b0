use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const VERTEX: &str = r#"#version 450
layout(location = 0) in vec4 position;
layout(location = 1) in vec4 color;
layout(location = 0) out vec4 colorV;
void main() {
    colorV = color;
    gl_Position = position;
}
"#;

const FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec4 colorV;
layout(location = 0) out vec4 fragColor;
void main() {
    fragColor = colorV;
}
"#;

fn workspace_shaders() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../shaders")
}

fn check(resources: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_glquad"))
        .arg("--check")
        .arg("--resources")
        .arg(resources)
        .args(extra)
        .env_remove("RUST_LOG")
        .env_remove("GLQUAD_RESOURCES")
        .output()
        .expect("failed to run glquad")
}

fn write_pair(dir: &Path, name: &str, vertex: &str, fragment: &str) {
    fs::write(dir.join(format!("{name}.vsh")), vertex).expect("write vertex shader");
    fs::write(dir.join(format!("{name}.fsh")), fragment).expect("write fragment shader");
}

#[test]
fn bundled_shaders_pass_the_check() {
    let output = check(&workspace_shaders(), &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn custom_shader_name_is_resolved_in_the_resource_dir() {
    let dir = TempDir::new().expect("tempdir");
    write_pair(dir.path(), "Plain", VERTEX, FRAGMENT);

    let output = check(dir.path(), &["--shader", "Plain"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn missing_shader_pair_fails() {
    let dir = TempDir::new().expect("tempdir");

    let output = check(dir.path(), &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Shader.vsh"), "stderr: {stderr}");
}

#[test]
fn broken_fragment_shader_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_pair(
        dir.path(),
        "Shader",
        VERTEX,
        "#version 450\nlayout(location = 0) out vec4 fragColor;\nvoid main() { fragColor = ; }\n",
    );

    let output = check(dir.path(), &["--shader-diagnostics", "true"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("shader program setup failed"), "stderr: {stderr}");
}

#[test]
fn mismatched_interface_fails_to_link() {
    let dir = TempDir::new().expect("tempdir");
    write_pair(
        dir.path(),
        "Shader",
        VERTEX,
        r#"#version 450
layout(location = 0) in vec4 colorV;
layout(location = 3) in vec2 uv;
layout(location = 0) out vec4 fragColor;
void main() {
    fragColor = colorV * uv.x;
}
"#,
    );

    let output = check(dir.path(), &[]);
    assert!(!output.status.success());
}
