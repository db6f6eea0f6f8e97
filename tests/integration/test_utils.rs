//! Shared test utilities for integration tests
//!
//! Configuration loading reads process-wide environment variables, so every test that
//! loads configuration goes through `with_mantra_env` to stay isolated from parallel tests
//! and from the developer's own user-level config.

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes environment variable access across all tests
static MANTRA_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with `vars` set and a private user config directory
///
/// Every variable touched is restored afterwards.
pub fn with_mantra_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = MANTRA_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let config_home = TempDir::new().unwrap();

    let mut names: Vec<&str> = vars.iter().map(|(name, _)| *name).collect();
    names.push("MANTRA_CONFIG_HOME");
    let saved: Vec<(String, Option<String>)> = names
        .iter()
        .map(|name| (name.to_string(), std::env::var(name).ok()))
        .collect();

    std::env::set_var("MANTRA_CONFIG_HOME", config_home.path());
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(&name, value),
            None => std::env::remove_var(&name),
        }
    }
    result
}

/// Write `contents` to `root/relative`, creating parent folders
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A small project: one model, one dataset with two dependency files, one task
pub fn sample_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "models/log_reg/model.py", "class LogisticRegression: pass\n");
    write_file(root, "models/log_reg/weights/layer1.txt", "0.5 0.25\n");
    write_file(root, "data/epl_data/data.py", "class EPLData: pass\n");
    write_file(root, "data/epl_data/raw/a.csv", "1,2\n");
    write_file(root, "data/epl_data/raw/b.csv", "3,4\n");
    write_file(root, "tasks/binary_crossent/task.py", "loss = 'bce'\n");
    write_file(
        root,
        "mantra.toml",
        "[datasets.epl_data]\nfiles = [\"a.csv\", \"b.csv\"]\n",
    );
    temp_dir
}
