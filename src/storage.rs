// Manages local file storage for tasks.
//
// Changes to `TaskRecord` that older readers cannot handle require
// incrementing LOCAL_STORAGE_VERSION below.
use crate::context::AppContext;
use crate::model::{Priority, Recurrence, Task, TaskStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Version history:
// - v0: bare JSON array of task records, no wrapper
// - v1: `{ "version": 1, "tasks": [...] }`
const LOCAL_STORAGE_VERSION: u32 = 1;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Optional wall-clock timestamps as `%Y-%m-%dT%H:%M:%S`; null or "" reads as absent.
mod local_time {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// On-disk shape of one task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "local_time")]
    pub due_date_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub due_date_string: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Kept as text so an unknown name degrades to NONE instead of failing the load.
    #[serde(default)]
    pub recurrence_type: Option<String>,
    #[serde(default, with = "local_time")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "local_time")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default, with = "local_time")]
    pub reminder_time: Option<NaiveDateTime>,
}

fn to_local(ts: DateTime<Utc>) -> NaiveDateTime {
    ts.with_timezone(&Local).naive_local()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().to_string(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            due_date_time: task.due(),
            due_date_string: task.due_text().map(str::to_string),
            priority: task.priority(),
            status: task.status(),
            tags: task.tags().to_vec(),
            category: task.category().map(str::to_string),
            dependencies: task.dependencies().to_vec(),
            recurrence_type: Some(task.recurrence().to_string()),
            created_at: Some(to_local(task.created_at())),
            updated_at: Some(to_local(task.updated_at())),
            reminder_time: task.reminder(),
        }
    }
}

impl TaskRecord {
    /// Rebuilds the task. Stored created/updated timestamps are not carried over.
    pub fn into_task(self) -> Result<Task> {
        let mut task = Task::with_id(
            self.id.clone(),
            self.title,
            non_blank(self.description),
            self.due_date_time,
            self.priority,
            self.status,
            self.tags,
            self.reminder_time,
        )
        .with_context(|| format!("Invalid task record '{}'", self.id))?;

        if let Some(text) = non_blank(self.due_date_string) {
            task.set_due_text(Some(text));
        }
        if let Some(category) = non_blank(self.category) {
            task.set_category(Some(category));
        }
        if !self.dependencies.is_empty() {
            task.set_dependencies(self.dependencies);
        }
        let recurrence = self
            .recurrence_type
            .as_deref()
            .map(|name| {
                name.parse::<Recurrence>().unwrap_or_else(|_| {
                    log::warn!("Unknown recurrence '{}' on task {}, using NONE", name, self.id);
                    Recurrence::None
                })
            })
            .unwrap_or_default();
        task.set_recurrence(recurrence);
        Ok(task)
    }
}

/// Wrapper struct for versioned local storage
#[derive(Serialize, Deserialize)]
struct LocalStorageData {
    #[serde(default)]
    version: u32,
    tasks: Vec<TaskRecord>,
}

pub struct LocalStorage;

impl LocalStorage {
    /// Path of the task file for a context.
    pub fn get_path(ctx: &dyn AppContext) -> Result<PathBuf> {
        ctx.get_task_file_path()
    }

    /// Helper to get a sidecar lock file path
    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = lock_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Runs `f` while holding an exclusive lock on a sidecar `.lock` file.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    /// Serialises tasks into the current versioned document.
    pub fn to_json(tasks: &[Task]) -> Result<String> {
        let data = LocalStorageData {
            version: LOCAL_STORAGE_VERSION,
            tasks: tasks.iter().map(TaskRecord::from).collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Parses either the versioned document or a legacy bare array.
    /// Blank input yields no tasks.
    pub fn from_json(json: &str) -> Result<Vec<Task>> {
        if json.trim().is_empty() {
            return Ok(vec![]);
        }
        let records = match serde_json::from_str::<LocalStorageData>(json) {
            Ok(data) => {
                if data.version > LOCAL_STORAGE_VERSION {
                    log::warn!(
                        "Task file version {} is newer than supported {}",
                        data.version,
                        LOCAL_STORAGE_VERSION
                    );
                }
                data.tasks
            }
            Err(versioned_err) => {
                log::info!("Reading unversioned task list");
                serde_json::from_str::<Vec<TaskRecord>>(json).map_err(|legacy_err| {
                    anyhow::anyhow!(
                        "Unrecognised task file: {} (as legacy list: {})",
                        versioned_err,
                        legacy_err
                    )
                })?
            }
        };
        records.into_iter().map(TaskRecord::into_task).collect()
    }

    fn load_from_path(path: &Path) -> Result<Vec<Task>> {
        if !path.exists() {
            return Ok(vec![]);
        }
        Self::with_lock(path, || {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_json(&json).with_context(|| format!("Failed to parse {}", path.display()))
        })
    }

    fn save_to_path(path: &Path, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::with_lock(path, || {
            let json = Self::to_json(tasks)?;
            Self::atomic_write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))
        })
    }

    /// Load the task file of a context. A missing or blank file yields no tasks.
    pub fn load(ctx: &dyn AppContext) -> Result<Vec<Task>> {
        let path = Self::get_path(ctx)?;
        let tasks = Self::load_from_path(&path)?;
        log::info!("Loaded {} tasks from {}", tasks.len(), path.display());
        Ok(tasks)
    }

    /// Save the task file of a context.
    pub fn save(ctx: &dyn AppContext, tasks: &[Task]) -> Result<()> {
        let path = Self::get_path(ctx)?;
        Self::save_to_path(&path, tasks)?;
        log::debug!("Saved {} tasks to {}", tasks.len(), path.display());
        Ok(())
    }

    /// Write tasks to an arbitrary file.
    pub fn export_json(path: &Path, tasks: &[Task]) -> Result<()> {
        Self::save_to_path(path, tasks)
    }

    /// Read tasks from an arbitrary file.
    pub fn import_json(path: &Path) -> Result<Vec<Task>> {
        if !path.exists() {
            return Err(anyhow::anyhow!("File not found: {}", path.display()));
        }
        Self::load_from_path(path)
    }
}
