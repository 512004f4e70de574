//! Black-box integration tests: shell out to the built `forth6502` binary with a short source
//! snippet and assert on substrings of the emitted assembly text (or, for error cases, on the
//! stderr diagnostic and exit code). Mirrors the scenarios in spec.md §8.

use std::io::Write;
use std::process::{Command, Output};

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_forth6502")
}

struct Run {
    status: i32,
    stdout: String,
    stderr: String,
}

fn run_source(source: &str, extra_args: &[&str]) -> Run {
    let mut file = tempfile::Builder::new().suffix(".f").tempfile().unwrap();
    file.write_all(source.as_bytes()).unwrap();

    let output: Output = Command::new(bin())
        .arg(file.path())
        .args(extra_args)
        .output()
        .expect("failed to run forth6502");

    Run {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

#[test]
fn constant_push_scenario() {
    let run = run_source("$230 constant dladr : main dladr ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains("main\n dta a(enter)\n dta a(const_dladr)\n dta a(exit)\n"));
    assert!(run.stdout.contains("dladr equ $230\n"));
}

#[test]
fn branching_scenario_resolves_offsets() {
    let run = run_source(": main 0= if 1 else 2 then ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains("_if\n dta a(*+8)\n"));
    assert!(run.stdout.contains("branch\n dta a(*+4)\n"));
}

#[test]
fn counted_loop_scenario() {
    let run = run_source(": main 10 0 do i loop ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains(" dta a(do)\n"));
    assert!(run.stdout.contains(" dta a(loop)\n"));
    assert!(run.stdout.contains("*-"));
}

#[test]
fn leave_scenario() {
    let run = run_source(": main 10 0 do i 5 = if leave then loop ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains(" dta a(unloop)\n"));
}

#[test]
fn dead_code_elimination_scenario() {
    let run = run_source(": unused 1 ; : main 0 ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(!run.stdout.contains("unused"));
}

#[test]
fn stack_not_empty_is_a_fatal_error_with_no_stdout() {
    let run = run_source("1 2 : main ;", &[]);
    assert_ne!(run.status, 0);
    assert!(run.stdout.is_empty());
    assert!(run.stderr.starts_with("error: "));
}

#[test]
fn unknown_word_is_a_fatal_error() {
    let run = run_source(": main bogus-word-not-in-dictionary ;", &[]);
    assert_ne!(run.status, 0);
    assert!(run.stdout.is_empty());
    assert!(run.stderr.contains("bogus-word-not-in-dictionary"));
}

#[test]
fn self_reference_requires_recursive() {
    let without = run_source(": main main ;", &[]);
    assert_ne!(without.status, 0);

    let with = run_source(": main recursive main ;", &[]);
    assert_eq!(with.status, 0, "stderr: {}", with.stderr);
    assert!(with.stdout.contains("main\n dta a(main)\n dta a(exit)\n"));
}

#[test]
fn redefinition_shadows_but_old_reference_stays_bound() {
    let run = run_source(": helper 1 ; : old helper ; : helper 2 ; : main helper old ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains("old"));
    assert!(run.stdout.contains("main"));
}

#[test]
fn base_words_are_reachable_from_a_user_word() {
    let run = run_source(": main 1 2 + dup swap ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains(" dta a(plus)\n"));
    assert!(run.stdout.contains(" dta a(dup)\n"));
    assert!(run.stdout.contains(" dta a(swap)\n"));
}

#[test]
fn unused_base_words_are_eliminated() {
    let run = run_source(": main 0 ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    // `mod` is never referenced by `main`, so it should not be rendered at all.
    assert!(!run.stdout.contains("\nmod\n"));
}

#[test]
fn sections_flag_controls_emission_order() {
    let run = run_source(": main 0 ;", &["--sections=data,text,boot,init"]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);

    let data_pos = run.stdout.find("; section data").unwrap();
    let text_pos = run.stdout.find("; section text").unwrap();
    let boot_pos = run.stdout.find("; section boot").unwrap();
    let init_pos = run.stdout.find("; section init").unwrap();

    assert!(data_pos < text_pos);
    assert!(text_pos < boot_pos);
    assert!(boot_pos < init_pos);
}

#[test]
fn pstack_flags_are_substituted_into_the_runtime() {
    let run = run_source(": main 0 ;", &["--pstack-bottom=$6000", "--pstack-size=64"]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains("pstack_bottom equ $6000"));
    assert!(run.stdout.contains("pstack_size   equ 64"));
}

#[test]
fn unlisted_section_is_appended_rather_than_dropped() {
    let run = run_source("[data-section] scratch : main 0 ;", &[]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stdout.contains("; section scratch"));
}

#[test]
fn include_directive_pulls_in_a_second_file() {
    let dir = tempfile::tempdir().unwrap();
    let included_path = dir.path().join("helper.f");
    std::fs::write(&included_path, ": helper 42 ;").unwrap();

    let main_path = dir.path().join("main.f");
    std::fs::write(&main_path, "[include] \"helper.f\" : main helper ;").unwrap();

    let output = Command::new(bin())
        .arg(&main_path)
        .output()
        .expect("failed to run forth6502");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("helper"));
}

#[test]
fn missing_include_target_is_a_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let main_path = dir.path().join("main.f");
    std::fs::write(&main_path, "[include] \"does-not-exist.f\" : main ;").unwrap();

    let output = Command::new(bin())
        .arg(&main_path)
        .output()
        .expect("failed to run forth6502");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn help_flag_exits_zero() {
    let output = Command::new(bin()).arg("--help").output().expect("failed to run forth6502");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("SOURCE_FILE"));
}

#[test]
fn version_flag_exits_zero() {
    let output = Command::new(bin()).arg("--version").output().expect("failed to run forth6502");
    assert!(output.status.success());
}

#[test]
fn dump_flag_prints_thread_listing_to_stderr_only() {
    let run = run_source(": main 1 + ;", &["--dump"]);
    assert_eq!(run.status, 0, "stderr: {}", run.stderr);
    assert!(run.stderr.contains("main (main):"));
    assert!(!run.stdout.contains("main (main):"));
}
