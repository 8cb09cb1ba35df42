// Command-line surface checks against the built binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn crewdesk(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("crewdesk").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("CREWDESK_ACCESS_TOKEN")
        .env_remove("SUPABASE_ACCESS_TOKEN")
        .env("RUST_LOG", "error");
    cmd
}

fn local_crewdesk(dir: &TempDir) -> Command {
    let mut cmd = crewdesk(dir);
    cmd.env("CREWDESK__BACKEND__KIND", "local")
        .env("CREWDESK__BACKEND__LOCAL_STAFF_EMAIL", "pro@example.com");
    cmd
}

#[test]
fn test_no_arguments_explains_daily_commands() {
    let dir = TempDir::new().unwrap();

    crewdesk(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("crewdesk - on-site job companion"))
        .stdout(predicate::str::contains("crewdesk jobs"))
        .stdout(predicate::str::contains("crewdesk work <id>"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();

    crewdesk(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("availability"))
        .stdout(predicate::str::contains("work"));
}

#[test]
fn test_history_rejects_unknown_sort() {
    let dir = TempDir::new().unwrap();

    crewdesk(&dir)
        .args(["history", "--sort", "price"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("price"));
}

#[test]
fn test_init_writes_config_once() {
    let dir = TempDir::new().unwrap();

    crewdesk(&dir).arg("init").assert().success();
    assert!(dir.path().join("crewdesk.toml").exists());

    crewdesk(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_seeded_local_jobs_are_listed() {
    let dir = TempDir::new().unwrap();
    let seed = dir.path().join("bookings.json");
    std::fs::write(
        &seed,
        r#"[
            {"id": "b1", "customer_name": "Ada", "startotp": "123456", "endotp": "654321",
             "assigned_staff_email": "pro@example.com", "is_viewed": false},
            {"id": "b2", "customer_name": "Grace", "assigned_staff_email": "other@example.com"}
        ]"#,
    )
    .unwrap();

    local_crewdesk(&dir)
        .arg("seed")
        .arg(&seed)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 2 bookings"));

    local_crewdesk(&dir)
        .arg("jobs")
        .assert()
        .success()
        .stdout(predicate::str::contains("b1 | Ada"))
        .stdout(predicate::str::contains("Grace").not());
}

fn seed_visit(dir: &TempDir) {
    let seed = dir.path().join("visit.json");
    std::fs::write(
        &seed,
        r#"[{"id": "b1", "customer_name": "Ada", "startotp": "123456", "endotp": "654321",
             "assigned_staff_email": "pro@example.com", "phone_number": "+1 555 0100"}]"#,
    )
    .unwrap();
    local_crewdesk(dir).arg("seed").arg(&seed).assert().success();

    for name in ["before.png", "after.png"] {
        image::RgbImage::from_pixel(4, 4, image::Rgb([20, 160, 40]))
            .save(dir.path().join(name))
            .unwrap();
    }
}

#[test]
fn test_work_session_runs_visit_to_completion() {
    let dir = TempDir::new().unwrap();
    seed_visit(&dir);

    local_crewdesk(&dir)
        .args(["work", "b1"])
        .write_stdin("code 123456\nphoto before.png\nstart\ny\nstop\nphoto after.png\ncode 654321\ndone\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Code accepted"))
        .stdout(predicate::str::contains("Start the work timer now?"))
        .stdout(predicate::str::contains("Timer started at"))
        .stdout(predicate::str::contains("Worked 00:00:"))
        .stdout(predicate::str::contains("Job b1 completed"))
        .stdout(predicate::str::contains("Leaving").not());

    let raw = std::fs::read(dir.path().join(".crewdesk/bookings.json")).unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    let row = &rows[0];
    assert_eq!(row["work_status"], "COMPLETED");
    assert_eq!(row["start_photo_url"].as_array().unwrap().len(), 1);
    assert_eq!(row["end_photo_url"].as_array().unwrap().len(), 1);
    assert!(row["worked_duration"].is_u64());
}

#[test]
fn test_work_session_declined_start_and_quit_keeps_job_open() {
    let dir = TempDir::new().unwrap();
    seed_visit(&dir);

    local_crewdesk(&dir)
        .args(["work", "b1"])
        .write_stdin("stop\ncode 000000\ncode 123456\nphoto before.png\nstart\nn\ncode 654321\ncall\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid Start OTP"))
        .stdout(predicate::str::contains("Start the work timer now?"))
        .stdout(predicate::str::contains("Timer started").not())
        .stdout(predicate::str::contains("Invalid End OTP").not())
        .stdout(predicate::str::contains("tel:"))
        .stdout(predicate::str::contains("Leaving b1 at 'ready to start'"));

    let raw = std::fs::read(dir.path().join(".crewdesk/bookings.json")).unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(rows[0]["work_status"], "PENDING");
    assert!(rows[0]["work_started_at"].is_null());
}

#[test]
fn test_seed_requires_local_backend() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rows.json"), "[]").unwrap();

    crewdesk(&dir)
        .args(["seed", "rows.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("local backend"));
}
