//! Integration tests for the cosmac-dasm binary
//!
//! These run the built executable against the images under tests/fixtures and
//! compare the complete listing, so they cover the loaders, argument handling
//! and both disassembly passes together.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cosmac-dasm"))
        .args(args)
        .output()
        .expect("Failed to run disassembler")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

/// Annotated hex image: user labels, a discovered loop label, a zero-filled
/// gap decoded as IDL, and a trailing data area
#[test]
fn test_annotated_hex_listing() {
    let image = fixture("blink.hex");
    let notes = fixture("blink.toml");
    let output = run(&["-a", notes.to_str().unwrap(), image.to_str().unwrap()]);
    assert!(output.status.success(), "Disassembler failed: {:?}", output);

    let mut expected = vec![
        "START:",
        "    LDI  #00",
        "    PHI  3",
        "    LDI  #10",
        "    PLO  3",
        "    SEP  3",
    ];
    expected.extend(std::iter::repeat("    IDL").take(9));
    expected.extend([
        "LOOP:",
        "    SEQ",
        "    LDI  #20",
        "L0013:",
        "    SMI  #01",
        "    BNZ  L0013",
        "    REQ",
        "    BR  LOOP",
        "MSG:",
        "    #48,#49,#00",
        "    END",
    ]);
    assert_eq!(stdout_lines(&output), expected);
}

/// Raw binary at a base address with no annotations is all code
#[test]
fn test_raw_binary_at_base() {
    let image = fixture("branch.bin");
    let output = run(&["--base", "0x2000", image.to_str().unwrap()]);
    assert!(output.status.success(), "Disassembler failed: {:?}", output);
    assert_eq!(
        stdout_lines(&output),
        vec![
            "L2000:",
            "    LDI  #05",
            "    BNZ  L2000",
            "    LBR  L1234",
            "    END"
        ]
    );
}

#[test]
fn test_repeated_runs_identical() {
    let image = fixture("blink.hex");
    let notes = fixture("blink.toml");
    let args = ["-a", notes.to_str().unwrap(), image.to_str().unwrap()];
    let first = run(&args);
    let second = run(&args);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_output_file() {
    let image = fixture("branch.bin");
    let mut out = std::env::temp_dir();
    out.push(format!("cosmac-dasm-test-{}.lst", std::process::id()));
    let output = run(&[
        "-b",
        "8192",
        "-o",
        out.to_str().unwrap(),
        image.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Disassembler failed: {:?}", output);
    assert!(output.stdout.is_empty());

    let written = std::fs::read_to_string(&out).expect("listing file");
    std::fs::remove_file(&out).ok();
    assert!(written.starts_with("L2000:\n"));
    assert!(written.ends_with("    END\n"));
}

#[test]
fn test_bad_checksum_fails() {
    let image = fixture("bad_checksum.hex");
    let output = run(&[image.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("checksum"), "stderr was: {}", stderr);
}

#[test]
fn test_missing_image_argument() {
    let output = run(&[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}
