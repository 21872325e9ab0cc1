//! Command-line interface tests.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_livesync-patcher"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let www = dir.path().join("platforms/ios/www");
    fs::create_dir_all(&www).unwrap();
    fs::write(
        www.join("index.html"),
        r#"<html><head><meta http-equiv="Content-Security-Policy" content="default-src 'self'"></head></html>"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("platforms/ios/config.xml"),
        r#"<widget><content src="index.html"/></widget>"#,
    )
    .unwrap();
    dir
}

fn root_arg(dir: &Path) -> &str {
    dir.to_str().unwrap()
}

#[test]
fn test_help_lists_commands() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("prepatch"));
    assert!(stdout.contains("patch"));
    assert!(stdout.contains("web-root"));
}

#[test]
fn test_web_root() {
    let output = run(&["web-root", "android"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        Path::new("platforms/android/app/src/main/assets/www")
            .display()
            .to_string()
    );

    let output = run(&["web-root", "palm"]);
    assert!(!output.status.success());
}

#[test]
fn test_prepatch_and_patch() {
    let project = setup_project();
    let root = root_arg(project.path());

    let output = run(&["--root", root, "--platforms", "ios", "prepatch"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Summary:"));
    assert!(project
        .path()
        .join("platforms/ios/www/browser-sync-start.html")
        .is_file());

    let output = run(&[
        "--root",
        root,
        "--platforms",
        "ios",
        "patch",
        "--server",
        "local=http://localhost:3000",
        "--server",
        "external",
        "--force-load",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let start = fs::read_to_string(project.path().join("platforms/ios/www/browser-sync-start.html"))
        .unwrap();
    assert!(start.contains(r#"{"local":"http://localhost:3000/ios/www/index.html"}"#));
    let index = fs::read_to_string(project.path().join("platforms/ios/www/index.html")).unwrap();
    assert!(index.contains("script-src 'self' 'unsafe-inline' http://localhost:3000"));
}

#[test]
fn test_config_file_and_unknown_platform() {
    let project = setup_project();
    let config = project.path().join("livesync.toml");
    fs::write(
        &config,
        format!(
            "root = {:?}\nplatforms = \"ios\"\n\n[patch]\nindex = \"app.html\"\n\n[patch.servers]\nlocal = \"http://localhost:3000\"\n",
            project.path().to_str().unwrap()
        ),
    )
    .unwrap();

    let output = run(&["--config", config.to_str().unwrap(), "patch"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let start = fs::read_to_string(project.path().join("platforms/ios/www/browser-sync-start.html"))
        .unwrap();
    assert!(start.contains("http://localhost:3000/ios/www/app.html"));

    let output = run(&["--root", root_arg(project.path()), "--platforms", "ios,wp8", "prepatch"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("wp8"));
}
