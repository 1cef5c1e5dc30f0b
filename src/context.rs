// File: ./src/context.rs
/*! Application context abstraction for filesystem paths.

`AppContext` decides where the task file, the config file and the log file
live. Two implementations:

- `StandardContext`: platform directories from `directories::ProjectDirs`,
  or everything under an override root (`--root` on the command line).
- `TestContext`: a unique temporary directory removed on drop.

Code doing filesystem IO receives a `&dyn AppContext`; there is no global
path state.
*/

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub const TASKS_FILENAME: &str = "tasks.json";
pub const CONFIG_FILENAME: &str = "config.toml";
pub const LOG_FILENAME: &str = "taskflow.log";

/// Defines the file system context for the application.
///
/// The trait is object-safe so callers can hold `Rc<dyn AppContext>`.
pub trait AppContext: std::fmt::Debug {
    fn get_data_dir(&self) -> Result<PathBuf>;
    fn get_config_dir(&self) -> Result<PathBuf>;

    fn get_config_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_config_dir()?.join(CONFIG_FILENAME))
    }

    fn get_task_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_data_dir()?.join(TASKS_FILENAME))
    }

    fn get_log_file_path(&self) -> Result<PathBuf> {
        Ok(self.get_data_dir()?.join(LOG_FILENAME))
    }
}

// --- Production Implementation ---

#[derive(Clone, Debug)]
pub struct StandardContext {
    override_root: Option<PathBuf>,
}

impl StandardContext {
    /// When `override_root` is `Some(path)`, directories are created under it
    /// as `data` and `config`.
    pub fn new(override_root: Option<PathBuf>) -> Self {
        Self { override_root }
    }

    fn ensure_exists(path: PathBuf) -> Result<PathBuf> {
        if !path.exists() {
            std::fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(path)
    }

    fn get_proj_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "taskflow", "taskflow")
    }
}

impl AppContext for StandardContext {
    fn get_data_dir(&self) -> Result<PathBuf> {
        if let Some(root) = &self.override_root {
            return Self::ensure_exists(root.join("data"));
        }
        let proj = Self::get_proj_dirs().ok_or_else(|| anyhow::anyhow!("No home directory"))?;
        Self::ensure_exists(proj.data_dir().to_path_buf())
    }

    fn get_config_dir(&self) -> Result<PathBuf> {
        if let Some(root) = &self.override_root {
            return Self::ensure_exists(root.join("config"));
        }
        let proj = Self::get_proj_dirs().ok_or_else(|| anyhow::anyhow!("No home directory"))?;
        Self::ensure_exists(proj.config_dir().to_path_buf())
    }
}

// --- Test Implementation ---

#[derive(Clone, Debug)]
pub struct TestContext {
    pub root: PathBuf,
}

impl TestContext {
    /// A context rooted at a fresh, uniquely named temporary directory.
    ///
    /// Subdirectories are created on first use; the whole tree is removed on drop.
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("taskflow_test_{}", uuid::Uuid::new_v4()));
        Self { root }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext for TestContext {
    fn get_data_dir(&self) -> Result<PathBuf> {
        let p = self.root.join("data");
        std::fs::create_dir_all(&p)?;
        Ok(p)
    }

    fn get_config_dir(&self) -> Result<PathBuf> {
        let p = self.root.join("config");
        std::fs::create_dir_all(&p)?;
        Ok(p)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub type SharedContext = std::rc::Rc<dyn AppContext>;
