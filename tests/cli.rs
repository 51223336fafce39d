use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

fn crew(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crew").unwrap();
    cmd.current_dir(dir);
    cmd
}

/// `crew init`, then point the default registry at a local file tree so
/// tests never touch the network.
fn init_project(dir: &Path) {
    crew(dir).arg("init").assert().success();

    let state_path = dir.join("crew.json");
    let mut state: Value = serde_json::from_str(&fs::read_to_string(&state_path).unwrap()).unwrap();
    state["registries"]["@crew"] = json!("file://registry/{name}.json");
    fs::write(&state_path, serde_json::to_string_pretty(&state).unwrap()).unwrap();
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn backend_employee(version: &str) -> Value {
    json!({
        "name": "backend",
        "role": "Backend Engineer",
        "description": "API design and review",
        "version": version,
        "skills": [{
            "name": "api-design",
            "files": [{
                "path": "skills/api-design/SKILL.md",
                "type": "skill",
                "content": "---\nname: api-design\ndescription: Design APIs\n---\n\n# API Design\n"
            }]
        }],
        "commands": [{
            "name": "review",
            "files": [{
                "path": "commands/review.md",
                "type": "command",
                "content": "Review the latest changes.\n"
            }]
        }],
        "dependencies": ["@crew/_shared/code-review"]
    })
}

fn shared_code_review() -> Value {
    json!({
        "name": "code-review",
        "namespace": "_shared",
        "fullName": "@crew/_shared/code-review",
        "version": "1.0.0",
        "description": "Shared review checklist",
        "category": "shared",
        "files": [{
            "path": "SKILL.md",
            "type": "skill",
            "content": "---\nname: code-review\ndescription: Review checklist\n---\n\n# Code Review\n"
        }]
    })
}

fn pm_skill(name: &str, version: &str, dependencies: &[&str]) -> Value {
    json!({
        "name": name,
        "namespace": "pm",
        "fullName": format!("@crew/pm/{name}"),
        "version": version,
        "description": format!("{name} skill"),
        "category": "product",
        "dependencies": dependencies,
        "files": [{
            "path": "SKILL.md",
            "type": "skill",
            "content": format!("---\nname: {name}\ndescription: {name}\n---\n\n# {name} v{version}\n")
        }]
    })
}

/// Project with a populated local registry.
fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    init_project(dir.path());

    let registry = dir.path().join("registry");
    write_json(&registry.join("backend.json"), &backend_employee("1.2.0"));
    write_json(
        &registry.join("skills/crew/_shared/code-review.json"),
        &shared_code_review(),
    );
    write_json(
        &registry.join("skills/crew/pm/brainstorming.json"),
        &pm_skill("brainstorming", "1.0.0", &["@crew/pm/writing"]),
    );
    write_json(
        &registry.join("skills/crew/pm/writing.json"),
        &pm_skill("writing", "1.0.0", &[]),
    );
    write_json(
        &registry.join("index.json"),
        &json!({
            "employees": [{
                "name": "backend",
                "role": "Backend Engineer",
                "description": "API design and review"
            }],
            "skills": [{
                "name": "brainstorming",
                "fullName": "@crew/pm/brainstorming",
                "version": "1.0.0",
                "description": "Structured ideation"
            }]
        }),
    );
    dir
}

fn read_state(dir: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join("crew.json")).unwrap()).unwrap()
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("crew").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("crew").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_init_refuses_overwrite_without_force() {
    let dir = tempdir().unwrap();
    crew(dir.path()).arg("init").assert().success();
    crew(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_EXISTS"));
    crew(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn test_commands_require_init() {
    let dir = tempdir().unwrap();
    crew(dir.path())
        .args(["add", "backend"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOT_INITIALIZED"))
        .stderr(predicate::str::contains("crew init"));
}

#[test]
fn test_robot_error_is_json() {
    let dir = tempdir().unwrap();
    let output = crew(dir.path())
        .args(["--robot", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"], Value::Bool(true));
    assert_eq!(json["code"], "NOT_INITIALIZED");
    assert!(json["suggestion"].as_str().unwrap().contains("crew init"));
}

#[test]
fn test_add_employee_installs_files_and_shared_dependency() {
    let dir = fixture();
    crew(dir.path()).args(["add", "backend"]).assert().success();

    let skill_md = dir
        .path()
        .join(".claude/skills/crew-backend-api-design/SKILL.md");
    let content = fs::read_to_string(&skill_md).unwrap();
    assert!(content.contains("name: crew-backend-api-design"));
    assert!(content.contains("# API Design"));

    let command = dir.path().join(".claude/commands/backend.review.md");
    assert_eq!(
        fs::read_to_string(&command).unwrap(),
        "Review the latest changes.\n"
    );

    let shared_md = dir.path().join(".claude/skills/crew-code-review/SKILL.md");
    assert!(fs::read_to_string(&shared_md)
        .unwrap()
        .contains("name: crew-code-review"));

    let state = read_state(dir.path());
    assert_eq!(state["employees"]["backend"]["version"], "1.2.0");
    assert_eq!(
        state["sharedSkills"]["@crew/_shared/code-review"]["usedBy"],
        json!(["backend"])
    );
}

#[test]
fn test_remove_employee_sweeps_and_releases_shared_skill() {
    let dir = fixture();
    crew(dir.path()).args(["add", "backend"]).assert().success();
    crew(dir.path())
        .args(["remove", "backend"])
        .assert()
        .success();

    assert!(!dir
        .path()
        .join(".claude/skills/crew-backend-api-design")
        .exists());
    assert!(!dir.path().join(".claude/commands/backend.review.md").exists());
    // Last user gone: the shared skill comes out too.
    assert!(!dir.path().join(".claude/skills/crew-code-review").exists());

    let state = read_state(dir.path());
    assert!(state["employees"].get("backend").is_none());
    assert!(state["sharedSkills"]
        .get("@crew/_shared/code-review")
        .is_none());
}

#[test]
fn test_missing_shared_dependency_is_skipped_without_recording() {
    let dir = fixture();
    let mut employee = backend_employee("1.2.0");
    employee["dependencies"] = json!(["@crew/_shared/code-review", "@crew/_shared/ghost"]);
    write_json(&dir.path().join("registry/backend.json"), &employee);

    crew(dir.path())
        .args(["add", "backend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("could not install shared skill"));

    // The broken dependency leaves no trace: no files, no reference.
    assert!(!dir.path().join(".claude/skills/crew-ghost").exists());
    let state = read_state(dir.path());
    assert!(state["sharedSkills"].get("@crew/_shared/ghost").is_none());

    // The employee and its healthy dependency still went through.
    assert_eq!(state["employees"]["backend"]["version"], "1.2.0");
    assert_eq!(
        state["sharedSkills"]["@crew/_shared/code-review"]["usedBy"],
        json!(["backend"])
    );
    assert!(dir.path().join(".claude/skills/crew-code-review").exists());
}

#[test]
fn test_existing_shared_skill_dir_survives_add_without_overwrite() {
    let dir = fixture();
    let shared_md = dir.path().join(".claude/skills/crew-code-review/SKILL.md");
    fs::create_dir_all(shared_md.parent().unwrap()).unwrap();
    fs::write(&shared_md, "local version\n").unwrap();

    crew(dir.path()).args(["add", "backend"]).assert().success();
    assert_eq!(fs::read_to_string(&shared_md).unwrap(), "local version\n");

    // The files are present, so the reference is still recorded.
    let state = read_state(dir.path());
    assert_eq!(
        state["sharedSkills"]["@crew/_shared/code-review"]["usedBy"],
        json!(["backend"])
    );
}

#[test]
fn test_shared_skill_survives_while_still_referenced() {
    let dir = fixture();
    let mut frontend = backend_employee("1.0.0");
    frontend["name"] = json!("frontend");
    frontend["skills"][0]["name"] = json!("components");
    write_json(&dir.path().join("registry/frontend.json"), &frontend);

    crew(dir.path()).args(["add", "backend"]).assert().success();
    crew(dir.path()).args(["add", "frontend"]).assert().success();
    crew(dir.path())
        .args(["remove", "backend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kept shared skill"));

    assert!(dir.path().join(".claude/skills/crew-code-review").exists());
    let state = read_state(dir.path());
    assert_eq!(
        state["sharedSkills"]["@crew/_shared/code-review"]["usedBy"],
        json!(["frontend"])
    );
}

#[test]
fn test_add_skill_resolves_dependencies_in_order() {
    let dir = fixture();
    crew(dir.path())
        .args(["add", "@crew/pm/brainstorming"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@crew/pm/writing"));

    assert!(dir.path().join(".claude/skills/crew-pm-writing").exists());
    assert!(dir
        .path()
        .join(".claude/skills/crew-pm-brainstorming")
        .exists());

    let state = read_state(dir.path());
    assert_eq!(state["skills"]["@crew/pm/brainstorming"]["version"], "1.0.0");
    assert_eq!(state["skills"]["@crew/pm/writing"]["version"], "1.0.0");
}

#[test]
fn test_add_skill_cycle_is_reported() {
    let dir = fixture();
    write_json(
        &dir.path().join("registry/skills/crew/pm/writing.json"),
        &pm_skill("writing", "1.0.0", &["@crew/pm/brainstorming"]),
    );

    crew(dir.path())
        .args(["add", "@crew/pm/brainstorming"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CIRCULAR_DEPENDENCY"));
}

#[test]
fn test_add_skill_skips_existing_without_overwrite() {
    let dir = fixture();
    crew(dir.path())
        .args(["add", "@crew/pm/writing"])
        .assert()
        .success();

    // User edit that a plain re-add must not clobber.
    let skill_md = dir.path().join(".claude/skills/crew-pm-writing/SKILL.md");
    fs::write(&skill_md, "local edit\n").unwrap();

    crew(dir.path())
        .args(["add", "@crew/pm/writing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
    assert_eq!(fs::read_to_string(&skill_md).unwrap(), "local edit\n");

    crew(dir.path())
        .args(["add", "@crew/pm/writing", "--overwrite"])
        .assert()
        .success();
    assert!(fs::read_to_string(&skill_md)
        .unwrap()
        .contains("name: crew-pm-writing"));
}

#[test]
fn test_remove_skill_dry_run_keeps_files() {
    let dir = fixture();
    crew(dir.path())
        .args(["add", "@crew/pm/writing"])
        .assert()
        .success();

    crew(dir.path())
        .args(["remove", "@crew/pm/writing", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would remove"));
    assert!(dir.path().join(".claude/skills/crew-pm-writing").exists());

    crew(dir.path())
        .args(["remove", "@crew/pm/writing"])
        .assert()
        .success();
    assert!(!dir.path().join(".claude/skills/crew-pm-writing").exists());
    assert!(read_state(dir.path())["skills"]
        .get("@crew/pm/writing")
        .is_none());
}

#[test]
fn test_update_applies_newer_version() {
    let dir = fixture();
    crew(dir.path())
        .args(["add", "@crew/pm/writing"])
        .assert()
        .success();

    write_json(
        &dir.path().join("registry/skills/crew/pm/writing.json"),
        &pm_skill("writing", "1.1.0", &[]),
    );

    crew(dir.path())
        .args(["update", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.0.0 -> 1.1.0"));
    assert_eq!(
        read_state(dir.path())["skills"]["@crew/pm/writing"]["version"],
        "1.0.0"
    );

    crew(dir.path()).arg("update").assert().success();
    assert_eq!(
        read_state(dir.path())["skills"]["@crew/pm/writing"]["version"],
        "1.1.0"
    );
    assert!(fs::read_to_string(dir.path().join(".claude/skills/crew-pm-writing/SKILL.md"))
        .unwrap()
        .contains("v1.1.0"));
}

#[test]
fn test_update_up_to_date() {
    let dir = fixture();
    crew(dir.path())
        .args(["add", "@crew/pm/writing"])
        .assert()
        .success();
    crew(dir.path())
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_diff_detects_local_modification() {
    let dir = fixture();
    crew(dir.path()).args(["add", "backend"]).assert().success();

    crew(dir.path())
        .args(["diff", "backend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("in sync"));

    let skill_md = dir
        .path()
        .join(".claude/skills/crew-backend-api-design/SKILL.md");
    fs::write(&skill_md, "hand-edited\n").unwrap();

    crew(dir.path())
        .args(["diff", "backend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("~"));
}

#[test]
fn test_diff_unknown_employee_fails() {
    let dir = fixture();
    crew(dir.path())
        .args(["diff", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("EMPLOYEE_NOT_FOUND"));
}

#[test]
fn test_robot_list_emits_state_json() {
    let dir = fixture();
    crew(dir.path()).args(["add", "backend"]).assert().success();

    let output = crew(dir.path()).args(["--robot", "list"]).output().unwrap();
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["employees"]["backend"]["version"], "1.2.0");
    assert!(json["sharedSkills"]
        .get("@crew/_shared/code-review")
        .is_some());
}

#[test]
fn test_list_available_reads_registry_index() {
    let dir = fixture();
    crew(dir.path())
        .args(["list", "--available"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend Engineer"))
        .stdout(predicate::str::contains("@crew/pm/brainstorming"));
}

#[test]
fn test_list_skills_shows_frontmatter_description() {
    let dir = fixture();
    crew(dir.path())
        .args(["add", "@crew/pm/writing"])
        .assert()
        .success();
    crew(dir.path())
        .args(["list", "--skills"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@crew/pm/writing"))
        .stdout(predicate::str::contains("writing"));
}

#[test]
fn test_missing_employee_reports_code_and_suggestion() {
    let dir = fixture();
    crew(dir.path())
        .args(["add", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("EMPLOYEE_NOT_FOUND"));
}
