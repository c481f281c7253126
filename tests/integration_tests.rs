mod common;

use assert_cmd::Command;
use assert_fs::prelude::*;
use common::{gradient_png, INKSCAPE_SVG};
use predicates::prelude::*;

const INPUT_KEYS: [&str; 11] = [
    "INPUT_COMPRESS-SVG",
    "INPUT_COMPRESS-PNG",
    "INPUT_COMPRESS-JPG",
    "INPUT_COMPRESS-GIF",
    "INPUT_COMPRESS-WEBP",
    "INPUT_COMPRESS-AVIF",
    "INPUT_EXPORT-WEBP",
    "INPUT_EXPORT-AVIF",
    "INPUT_REPLACE-ORIGINAL-AFTER-EXPORT-WEBP",
    "INPUT_IGNORE-PATHS",
    "INPUT_GITHUB-TOKEN",
];

fn img_sweep() -> Command {
    let mut cmd = Command::cargo_bin("img-sweep").unwrap();
    for key in INPUT_KEYS {
        cmd.env_remove(key);
    }
    cmd.env_remove("GITHUB_EVENT_NAME");
    cmd
}

#[test]
fn test_cli_help() {
    img_sweep()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("optimize"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn test_optimize_help() {
    img_sweep().args(["optimize", "--help"]).assert().success();
}

#[test]
fn test_unknown_subcommand() {
    img_sweep().arg("squeeze").assert().failure();
}

#[test]
fn test_optimize_missing_root_fails() {
    img_sweep()
        .args(["optimize", "--root", "/definitely/not/a/real/root"])
        .assert()
        .failure();
}

#[test]
fn test_optimize_minifies_svg() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("icons/logo.svg").write_str(INKSCAPE_SVG).unwrap();
    temp.child("README.md").write_str("# site").unwrap();
    let report = temp.child("report.md");

    img_sweep()
        .args(["optimize", "--root"])
        .arg(temp.path())
        .arg("--markdown")
        .arg(report.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("icons/logo.svg"))
        .stdout(predicate::str::contains("Optimized 1 image"));

    let minified = std::fs::read_to_string(temp.child("icons/logo.svg").path()).unwrap();
    assert!(minified.len() < INKSCAPE_SVG.len());
    assert!(minified.contains(r#"viewBox="0 0 48 48""#));
    assert!(!minified.contains("inkscape"));
    report.assert(predicate::str::contains("| icons/logo.svg |"));
    temp.child("README.md").assert("# site");
}

#[test]
fn test_optimize_twice_is_quiet() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("logo.svg").write_str(INKSCAPE_SVG).unwrap();

    img_sweep()
        .args(["optimize", "logo.svg", "--root"])
        .arg(temp.path())
        .assert()
        .success();
    let first = std::fs::read(temp.child("logo.svg").path()).unwrap();

    img_sweep()
        .args(["optimize", "logo.svg", "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert_eq!(std::fs::read(temp.child("logo.svg").path()).unwrap(), first);
}

#[test]
fn test_optimize_respects_disabled_format() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("logo.svg").write_str(INKSCAPE_SVG).unwrap();

    img_sweep()
        .env("INPUT_COMPRESS-SVG", "false")
        .args(["optimize", "logo.svg", "--root"])
        .arg(temp.path())
        .assert()
        .success();

    temp.child("logo.svg").assert(INKSCAPE_SVG);
}

#[test]
fn test_optimize_keeps_png_decodable() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("hero.png").write_binary(&gradient_png(128, 128)).unwrap();

    img_sweep()
        .args(["optimize", "hero.png", "--root"])
        .arg(temp.path())
        .assert()
        .success();

    let bytes = std::fs::read(temp.child("hero.png").path()).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), 128);
}

#[test]
fn test_plan_lists_exports_without_writing() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a.png").write_binary(&gradient_png(16, 16)).unwrap();
    temp.child("b.svg").write_str(INKSCAPE_SVG).unwrap();

    img_sweep()
        .env("INPUT_EXPORT-WEBP", "true")
        .args(["plan", "a.png", "b.svg", "notes.md", "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-> a.webp [WEBP]"))
        .stdout(predicate::str::contains("b.svg"))
        .stdout(predicate::str::contains("notes.md").not());

    temp.child("a.webp").assert(predicate::path::missing());
    temp.child("b.svg").assert(INKSCAPE_SVG);
}

#[test]
fn test_plan_reports_collisions() {
    let temp = assert_fs::TempDir::new().unwrap();

    img_sweep()
        .env("INPUT_EXPORT-WEBP", "true")
        .args(["plan", "a.jpg", "a.jpeg", "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Collision: a.webp is claimed by a.jpg, export from a.jpeg skipped",
        ));
}

#[test]
fn test_plan_keeps_existing_export_target() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("a.png").write_binary(&gradient_png(16, 16)).unwrap();
    temp.child("a.webp").write_str("hand-tuned").unwrap();

    img_sweep()
        .env("INPUT_EXPORT-WEBP", "true")
        .env("INPUT_COMPRESS-WEBP", "false")
        .args(["plan", "a.png", "a.webp", "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Collision: a.webp already exists, export from a.png skipped",
        ))
        .stdout(predicate::str::contains("-> a.webp").not());
}

#[test]
fn test_action_pull_request_without_token_fails() {
    let temp = assert_fs::TempDir::new().unwrap();

    img_sweep()
        .env("GITHUB_EVENT_NAME", "pull_request")
        .env("GITHUB_HEAD_REF", "feature")
        .env("GITHUB_REF", "refs/pull/3/merge")
        .args(["action", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("GitHub token is required"));
}
