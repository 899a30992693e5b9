use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn cargo_bin() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_qr-badges"));
    command.env_remove("QR_BADGES_UPDATE_URL");
    command
}

fn output_dir() -> &'static Path {
    Path::new("tests/output")
}

fn setup() {
    fs::create_dir_all(output_dir()).expect("Failed to create output directory");
}

fn cleanup_file(name: &str) {
    let path = output_dir().join(name);
    if path.exists() {
        fs::remove_file(&path).ok();
    }
}

fn write_roster(name: &str, content: &str) -> PathBuf {
    let path = output_dir().join(name);
    fs::write(&path, content).expect("Failed to write roster");
    path
}

fn roster(rows: usize) -> String {
    let mut csv = String::from("Preferred,Last,Code\n");
    for i in 1..=rows {
        csv.push_str(&format!(
            "Person{},Surname{},https://example.com/checkin/{}\n",
            i, i, i
        ));
    }
    csv
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_default_output_beside_csv() {
    setup();
    let docx = "test-default_nametags.docx";
    cleanup_file(docx);
    let input = write_roster("test-default.csv", &roster(10));

    let output = cargo_bin()
        .args(["-i", input.to_str().unwrap(), "--no-open", "--no-update-check"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);

    let path = output_dir().join(docx);
    assert!(path.exists(), "Document was not created");

    let metadata = fs::metadata(&path).expect("Failed to get file metadata");
    assert!(metadata.len() > 1000, "Document is too small, likely empty or corrupt");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("test-default_nametags.docx"), "{}", stdout);
    assert!(stdout.contains("10 badges on 2 pages"), "{}", stdout);
}

#[test]
fn test_explicit_output_path() {
    setup();
    let docx = "test-explicit-badges.docx";
    cleanup_file(docx);
    let input = write_roster("test-explicit.csv", &roster(3));

    let output = cargo_bin()
        .args([
            "-i", input.to_str().unwrap(),
            "-o", &format!("tests/output/{}", docx),
            "--no-open",
            "--no-update-check",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_dir().join(docx).exists(), "Document was not created");
    assert!(!output_dir().join("test-explicit_nametags.docx").exists());
}

#[test]
fn test_with_yaml_config() {
    setup();
    let docx = "test-yaml-config.docx";
    cleanup_file(docx);
    let input = write_roster("test-yaml-config.csv", &roster(5));
    let config = output_dir().join("test-yaml-config.yml");
    fs::write(&config, "font_family: Arial\nnameFontSize: 20\nqr_size: 1in\n")
        .expect("Failed to write config");

    let output = cargo_bin()
        .args([
            "-i", input.to_str().unwrap(),
            "-c", config.to_str().unwrap(),
            "-o", &format!("tests/output/{}", docx),
            "--no-open",
            "--no-update-check",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_dir().join(docx).exists());
}

#[test]
fn test_empty_roster_still_writes_document() {
    setup();
    let docx = "test-empty_nametags.docx";
    cleanup_file(docx);
    let input = write_roster("test-empty.csv", "Preferred,Last,Code\n");

    let output = cargo_bin()
        .args(["-i", input.to_str().unwrap(), "--no-open", "--no-update-check"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_dir().join(docx).exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("0 badges on 0 pages"));
}

#[test]
fn test_missing_columns() {
    setup();
    let docx = "test-missing-columns_nametags.docx";
    cleanup_file(docx);
    let input = write_roster("test-missing-columns.csv", "Preferred,Code\nAda,x\n");

    let output = cargo_bin()
        .args(["-i", input.to_str().unwrap(), "--no-open", "--no-update-check"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Should fail without a Last column");
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Error: "), "{}", err);
    assert!(err.contains("Last"), "{}", err);
    assert!(!output_dir().join(docx).exists());
}

#[test]
fn test_empty_code_reports_row() {
    setup();
    let docx = "test-empty-code_nametags.docx";
    cleanup_file(docx);
    let input = write_roster(
        "test-empty-code.csv",
        "Preferred,Last,Code\nAda,Lovelace,https://x.test/1\nAlan,Turing,\n",
    );

    let output = cargo_bin()
        .args(["-i", input.to_str().unwrap(), "--no-open", "--no-update-check"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Should fail on an empty Code");
    let err = stderr(&output);
    assert!(err.contains("Row 2"), "{}", err);
    assert!(!output_dir().join(docx).exists());
}

#[test]
fn test_invalid_roster_file() {
    let output = cargo_bin()
        .args(["-i", "nonexistent-file.csv", "--no-open", "--no-update-check"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Should fail with nonexistent roster file");
}

#[test]
fn test_unknown_config_key() {
    setup();
    let input = write_roster("test-bad-config.csv", &roster(1));
    let config = output_dir().join("test-bad-config.json");
    fs::write(&config, r#"{ "cell_widht": 3.5 }"#).expect("Failed to write config");

    let output = cargo_bin()
        .args([
            "-i", input.to_str().unwrap(),
            "-c", config.to_str().unwrap(),
            "--no-open",
            "--no-update-check",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Should reject an unknown config key");
    assert!(stderr(&output).contains("Configuration error"));
}

#[test]
fn test_missing_config_file() {
    setup();
    let docx = "test-missing-config_nametags.docx";
    cleanup_file(docx);
    let input = write_roster("test-missing-config.csv", &roster(1));

    let output = cargo_bin()
        .args([
            "-i", input.to_str().unwrap(),
            "-c", "tests/output/no-such-config.yml",
            "--no-open",
            "--no-update-check",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Should fail with a missing config file");
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("no-such-config.yml"), "{}", err);
    assert!(!err.contains("Configuration error"), "{}", err);
    assert!(!output_dir().join(docx).exists());
}

#[test]
fn test_landscape_with_portrait_grid_fails() {
    setup();
    let input = write_roster("test-landscape.csv", &roster(1));

    let output = cargo_bin()
        .args([
            "-i", input.to_str().unwrap(),
            "--landscape",
            "--no-open",
            "--no-update-check",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "A 2x4 grid does not fit a landscape page");
    assert!(stderr(&output).contains("content height"));
}

#[test]
fn test_output_in_missing_directory() {
    setup();
    let input = write_roster("test-missing-dir.csv", &roster(2));

    let output = cargo_bin()
        .args([
            "-i", input.to_str().unwrap(),
            "-o", "tests/output/no-such-dir/badges.docx",
            "--no-open",
            "--no-update-check",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Should fail when the output directory is missing");
    assert!(stderr(&output).contains("no-such-dir"));
    assert!(!Path::new("tests/output/no-such-dir").exists());
}

#[test]
fn test_demo_configs() {
    setup();
    for (config, docx) in [
        ("../demos/config.yml", "test-demo-yaml.docx"),
        ("../demos/config.json", "test-demo-json.docx"),
    ] {
        cleanup_file(docx);

        let output = cargo_bin()
            .args([
                "-i", "../demos/attendees.csv",
                "-c", config,
                "-o", &format!("tests/output/{}", docx),
                "--no-open",
                "--no-update-check",
            ])
            .output()
            .expect("Failed to execute command");

        assert!(output.status.success(), "{} failed: {:?}", config, output);
        assert!(output_dir().join(docx).exists(), "{} produced no document", config);
    }
}
