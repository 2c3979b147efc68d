use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

// Helper function to set up a test Command instance rooted in a scratch directory
fn set_up_command(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("daybook").unwrap();
    cmd.env_clear()
        .env("HOME", workdir)
        .env("PATH", std::env::var_os("PATH").unwrap_or_default())
        .current_dir(workdir);
    cmd
}

fn journal_dir() -> (TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let journal = dir.path().join("journal");
    (dir, journal)
}

#[test]
fn test_new_creates_entry_and_prints_path() {
    let (dir, journal) = journal_dir();

    set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .args(["new", "--date", "2024-03-05"])
        .assert()
        .success()
        .stdout(format!("{}\n", journal.join("2024-03-05.md").display()));

    let content = fs::read_to_string(journal.join("2024-03-05.md")).unwrap();
    assert_eq!(content, "# 2024-03-05\n");

    // A second run leaves the entry alone and prints the same path
    fs::write(journal.join("2024-03-05.md"), "already written").unwrap();
    set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .args(["new", "--date", "2024-03-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-03-05.md"));
    assert_eq!(
        fs::read_to_string(journal.join("2024-03-05.md")).unwrap(),
        "already written"
    );
}

#[test]
fn test_new_invalid_date_fails() {
    let (dir, journal) = journal_dir();

    set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .args(["new", "--date", "2024-13-01"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Invalid date \"2024-13-01\""));

    assert!(!journal.exists());
}

#[test]
fn test_new_uses_config_file_layout() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(".daybook.toml"),
        "[common]\nbase_directory = \"notes\"\npath_format = \"2006/01/02.md\"\n\n[new]\nfile_template = \"## {{ .Date }}\"\n",
    )
    .unwrap();

    set_up_command(dir.path())
        .args(["new", "-d", "2024-07-09"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("notes/2024/07/09.md\n"));

    let content = fs::read_to_string(dir.path().join("notes/2024/07/09.md")).unwrap();
    assert_eq!(content, "## 2024-07-09\n");
}

#[test]
fn test_path_check() {
    let (dir, journal) = journal_dir();
    fs::create_dir_all(&journal).unwrap();

    set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .args(["path", "--date", "2024-01-01"])
        .assert()
        .success()
        .stdout(format!("{}\n", journal.join("2024-01-01.md").display()));

    set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .args(["path", "--date", "2024-01-01", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));

    set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .args(["path", "--base", "--check"])
        .assert()
        .success()
        .stdout(format!("{}\n", journal.display()));
}

#[test]
fn test_list_prints_sorted_entries() {
    let (dir, journal) = journal_dir();
    fs::create_dir_all(journal.join("2024")).unwrap();
    fs::write(journal.join("2024-01-02.md"), "b").unwrap();
    fs::write(journal.join("2024/2024-01-01.md"), "a").unwrap();
    fs::write(journal.join("notes.md"), "undated").unwrap();

    let expected = format!(
        "2024-01-01\t{}\n2024-01-02\t{}\n",
        journal.join("2024/2024-01-01.md").display(),
        journal.join("2024-01-02.md").display()
    );
    set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .args(["list", "--sort", "asc"])
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_build_writes_index() {
    let (dir, journal) = journal_dir();
    fs::create_dir_all(&journal).unwrap();
    fs::write(journal.join("2024-01-01.md"), "first day").unwrap();
    fs::write(journal.join("2024-01-02.md"), "second day").unwrap();
    let out = dir.path().join("out");

    set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .arg("build")
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("index.html"));

    let html = fs::read_to_string(out.join("index.html")).unwrap();
    let second = html.find("second day").unwrap();
    let first = html.find("first day").unwrap();
    assert!(second < first);
}

#[test]
fn test_open_runs_configured_command() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(".daybook.toml"),
        "[open]\ncommand = 'echo opening {{ .File }}'\n",
    )
    .unwrap();

    set_up_command(dir.path())
        .args(["open", "--date", "2024-02-29"])
        .assert()
        .success()
        .stdout(predicate::str::contains("opening").and(predicate::str::contains("2024-02-29.md")));

    assert!(dir.path().join("2024-02-29.md").exists());
}

#[test]
fn test_open_failing_command_exits_non_zero() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".daybook.toml"), "[open]\ncommand = 'exit 4'\n").unwrap();

    set_up_command(dir.path())
        .args(["open", "--date", "2024-02-29"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-zero status code: 4"));
}

#[test]
fn test_search_passes_pattern() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(".daybook.toml"),
        "[search]\ncommand = 'echo searching for {{ .Pattern }}'\n",
    )
    .unwrap();

    set_up_command(dir.path())
        .args(["search", "coffee"])
        .assert()
        .success()
        .stdout("searching for coffee\n");
}

#[test]
fn test_init_then_refuse_then_force() {
    let dir = tempdir().unwrap();

    set_up_command(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains(".daybook.toml"));
    assert!(dir.path().join(".daybook.toml").exists());

    set_up_command(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    set_up_command(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_init_ignores_broken_config() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("custom.toml");
    fs::write(dir.path().join(".daybook.toml"), "not = [valid").unwrap();

    set_up_command(dir.path())
        .arg("init")
        .arg("--config")
        .arg(&target)
        .assert()
        .success();
    assert!(target.exists());
}

#[test]
fn test_config_shows_effective_values() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".daybook.toml"), "[serve]\nport = 9191\n").unwrap();

    set_up_command(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("# ConfigFile: .daybook.toml")
                .and(predicate::str::contains("port = 9191"))
                .and(predicate::str::contains("sort = \"desc\"")),
        );
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = tempdir().unwrap();

    set_up_command(dir.path())
        .args(["--config", "nope.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(".daybook.toml"),
        "[common]\npath_format = \"2006-01.md\"\n",
    )
    .unwrap();

    set_up_command(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_version_output() {
    let dir = tempdir().unwrap();

    set_up_command(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "daybook {} (Built on ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_logs_go_to_stderr_as_json() {
    let (dir, journal) = journal_dir();

    let output = set_up_command(dir.path())
        .env("DAYBOOK_DIR", &journal)
        .args(["--log-format", "json", "new", "--date", "2024-03-05"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.lines().any(|l| l.starts_with('{') && l.contains("created entry")));
}
