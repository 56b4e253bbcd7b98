use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn script(home: &TempDir, input: &str) -> assert_cmd::assert::Assert {
    Command::cargo_bin("expense_tracker_cli")
        .unwrap()
        .env("EXPENSE_TRACKER_HOME", home.path())
        .env("EXPENSE_TRACKER_CLI_SCRIPT", "1")
        .env_remove("RUST_LOG")
        .write_stdin(input.to_string())
        .assert()
}

#[test]
fn script_mode_records_spending_and_raises_alerts() {
    let home = TempDir::new().unwrap();
    let input = "account list\n\
         budget add name=Dining scope=category target=\"Food & Dining\" amount=100\n\
         transaction add amount=85 category=\"Food & Dining\" account=Cash description=Dinner\n\
         budget alerts unread\n\
         exit\n";
    script(&home, input)
        .success()
        .stdout(contains("Checking Account"))
        .stdout(contains("Created budget #1 `Dining`."))
        .stdout(contains("Recorded expense #1"))
        .stdout(contains("Budget Alert"))
        .stdout(contains("1 unread"));
}

#[test]
fn script_mode_exports_json_backup() {
    let home = TempDir::new().unwrap();
    let exports = home.path().join("out");
    let input = format!(
        "transaction add type=income amount=2500 category=Salary account=\"Checking Account\" description=Payroll\n\
         export json {}\n\
         exit\n",
        exports.display()
    );
    script(&home, &input).success().stdout(contains("Exported json"));

    let backup = std::fs::read_dir(&exports)
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    let json = std::fs::read_to_string(backup).unwrap();
    assert!(json.contains("\"appVersion\""));
    assert!(json.contains("2500"));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = TempDir::new().unwrap();
    script(&home, "budgte list\nexit\n")
        .success()
        .stdout(contains("Did you mean `budget`?"));
}

#[test]
fn invalid_form_values_are_reported() {
    let home = TempDir::new().unwrap();
    script(&home, "budget add name=X amount=10\nexit\n")
        .success()
        .stderr(contains("name"));
}

#[test]
fn transactions_need_a_description() {
    let home = TempDir::new().unwrap();
    script(&home, "transaction add amount=12 category=Shopping account=Cash\nexit\n")
        .success()
        .stderr(contains("Description is required"));
}

#[test]
fn settings_persist_between_runs() {
    let home = TempDir::new().unwrap();
    script(&home, "settings set currency EUR\nexit\n")
        .success()
        .stdout(contains("Updated currency."));
    script(&home, "settings show\nexit\n")
        .success()
        .stdout(contains("EUR"));
}

#[test]
fn budget_scope_edits_keep_a_matching_target() {
    let home = TempDir::new().unwrap();
    let input = "budget add name=Dining scope=category target=\"Food & Dining\" amount=100\n\
         budget edit 1 scope=account\n\
         budget edit 1 scope=category target=-\n\
         budget show 1\n\
         exit\n";
    script(&home, input)
        .success()
        .stderr(contains("name the account this budget should follow"))
        .stderr(contains("a category budget needs a category"))
        .stdout(contains("Applies to : Food & Dining"));
}
