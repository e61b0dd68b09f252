use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Write `contents` as `config.toml` inside `dir` and return its path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

/// The `chatkit` binary, isolated from any user config.
pub fn chatkit(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("chatkit").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("RUST_LOG");
    cmd
}
