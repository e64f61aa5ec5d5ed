use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::path::Path;

fn darty(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("darty").unwrap();
    cmd.env("HOME", home).env_remove("DARTY_LOG");
    cmd
}

fn write_project(project: &assert_fs::TempDir, remote: &Path) {
    project
        .child("darty.yaml")
        .write_str(&format!(
            r#"
repositories:
  default:
    type: test
    root: main
    parameters:
      local_dir: {:?}
dependencies:
  - group: datasets
    artifact: reviews
    version: 1.0
    working-dir: data
"#,
            remote.to_string_lossy()
        ))
        .unwrap();
}

#[test]
fn publishes_and_downloads_a_package() {
    let home = assert_fs::TempDir::new().unwrap();
    let remote = assert_fs::TempDir::new().unwrap();
    let author = assert_fs::TempDir::new().unwrap();
    let consumer = assert_fs::TempDir::new().unwrap();

    write_project(&author, remote.path());
    author.child("data/train.csv").write_str("a,b\n1,2\n").unwrap();

    darty(home.path())
        .current_dir(author.path())
        .args(["publish", "--packages-dir"])
        .arg(home.child("author-packages").path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[+] Package \"datasets:reviews:1.0\" was successfully published.",
        ))
        .stdout(predicate::str::contains("train.csv"));

    write_project(&consumer, remote.path());
    darty(home.path())
        .current_dir(consumer.path())
        .args(["update", "--packages-dir"])
        .arg(home.child("consumer-packages").path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[+] The package was successfully downloaded",
        ))
        .stdout(predicate::str::contains(
            "[+] files copied to the \"data\" directory",
        ));

    consumer.child("data/train.csv").assert("a,b\n1,2\n");
}

#[test]
fn keeps_non_empty_working_dirs() {
    let home = assert_fs::TempDir::new().unwrap();
    let remote = assert_fs::TempDir::new().unwrap();
    let project = assert_fs::TempDir::new().unwrap();

    write_project(&project, remote.path());
    project.child("data/train.csv").write_str("v1").unwrap();

    darty(home.path())
        .current_dir(project.path())
        .args(["publish-local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("was successfully published locally."));

    darty(home.path())
        .current_dir(project.path())
        .args(["update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[+] It's a locally published package"))
        .stdout(predicate::str::contains(
            "[-] files not changed: directory \"data\" is not empty",
        ));

    darty(home.path())
        .current_dir(project.path())
        .args(["publish-local"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("already exists locally"));
}

#[test]
fn fails_when_a_package_cannot_be_downloaded() {
    let home = assert_fs::TempDir::new().unwrap();
    let remote = assert_fs::TempDir::new().unwrap();
    let project = assert_fs::TempDir::new().unwrap();
    write_project(&project, remote.path());

    darty(home.path())
        .current_dir(project.path())
        .args(["download", "--artifact", "reviews"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[-] Package not found"));
}

#[test]
fn fails_on_unknown_dependencies() {
    let home = assert_fs::TempDir::new().unwrap();
    let remote = assert_fs::TempDir::new().unwrap();
    let project = assert_fs::TempDir::new().unwrap();
    write_project(&project, remote.path());

    darty(home.path())
        .current_dir(project.path())
        .args(["download", "--artifact", "ratings"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Package with artifact=ratings not found"));
}

#[test]
fn fails_without_a_project_file() {
    let home = assert_fs::TempDir::new().unwrap();
    let project = assert_fs::TempDir::new().unwrap();

    darty(home.path())
        .current_dir(project.path())
        .args(["download"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("was not found"));
}

#[test]
fn saves_profiles() {
    let home = assert_fs::TempDir::new().unwrap();

    darty(home.path())
        .args(["configure", "--profile", "work", "--packages-dir", "/data/packages"])
        .assert()
        .success();

    home.child(".darty/config.json")
        .assert(predicate::str::contains("\"work\""))
        .assert(predicate::str::contains("/data/packages"));
}

#[test]
fn asks_for_the_packages_dir_only_on_a_terminal() {
    let home = assert_fs::TempDir::new().unwrap();

    darty(home.path())
        .args(["configure", "--profile", "work"])
        .assert()
        .failure();

    home.child(".darty/config.json")
        .assert(predicate::path::missing());
}
