#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn sg() -> Command {
    cargo_bin_cmd!("slotgrid")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{name}_slotgrid.sqlite"));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Fresh per-user HOME so config and session files never leak between tests
pub fn setup_home(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{name}_slotgrid_home"));
    fs::remove_dir_all(&path).ok();
    fs::create_dir_all(&path).expect("create test home");
    path.to_string_lossy().to_string()
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{name}_slotgrid_out.{ext}"));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// `slotgrid --db <db>` running with `home` as HOME
pub fn sg_in(home: &str, db: &str) -> Command {
    let mut cmd = sg();
    cmd.env("HOME", home).args(["--db", db]);
    cmd
}

/// One signed-in user working against a shared database file
pub struct TestUser {
    pub home: String,
    pub db: String,
}

impl TestUser {
    pub fn new(test: &str, user_id: &str, name: &str, db: &str) -> Self {
        let home = setup_home(&format!("{test}_{user_id}"));
        sg_in(&home, db)
            .args(["login", user_id, "--name", name])
            .assert()
            .success();
        Self {
            home,
            db: db.to_string(),
        }
    }

    pub fn cmd(&self) -> Command {
        sg_in(&self.home, &self.db)
    }

    /// `group create`; the id is the last line printed
    pub fn create_group(&self, name: &str) -> String {
        let out = self
            .cmd()
            .args(["group", "create", name])
            .output()
            .expect("run group create");
        assert!(out.status.success(), "group create failed: {out:?}");
        String::from_utf8_lossy(&out.stdout)
            .lines()
            .last()
            .expect("group id line")
            .trim()
            .to_string()
    }
}

/// Initialize a DB in test mode (no config file written)
pub fn init_db(home: &str, db: &str) {
    sg_in(home, db).args(["--test", "init"]).assert().success();
}
