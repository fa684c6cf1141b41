use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use chores_core::{ChoresError, Device, Task};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TasksFile {
    tasks: Vec<Task>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DevicesFile {
    devices: Vec<Device>,
}

/// File-backed store for tasks and devices.
pub struct JsonStore {
    tasks_file: PathBuf,
    devices_file: PathBuf,
}

impl JsonStore {
    /// Open (and if necessary initialize) the store under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self, ChoresError> {
        fs::create_dir_all(data_dir)?;
        let store = Self {
            tasks_file: data_dir.join("tasks.json"),
            devices_file: data_dir.join("devices.json"),
        };
        if !store.tasks_file.exists() {
            store.write(&store.tasks_file, &TasksFile::default())?;
        }
        if !store.devices_file.exists() {
            store.write(&store.devices_file, &DevicesFile::default())?;
        }
        Ok(store)
    }

    fn read<T: DeserializeOwned + Default>(&self, path: &Path) -> T {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return T::default(),
        };
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Corrupt store file — treating as empty");
                T::default()
            }
        }
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), ChoresError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| ChoresError::Serialize(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    // ── Tasks ─────────────────────────────────────────────────────

    /// All tasks, in file order.
    pub fn tasks(&self) -> Vec<Task> {
        self.read::<TasksFile>(&self.tasks_file).tasks
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.tasks().into_iter().find(|t| t.id == id)
    }

    /// Insert or replace a task by ID.
    pub fn save_task(&self, task: &Task) -> Result<(), ChoresError> {
        let mut tasks = self.tasks();
        tasks.retain(|t| t.id != task.id);
        tasks.push(task.clone());
        self.write(&self.tasks_file, &TasksFile { tasks })
    }

    pub fn delete_task(&self, id: &str) -> Result<(), ChoresError> {
        let mut tasks = self.tasks();
        tasks.retain(|t| t.id != id);
        self.write(&self.tasks_file, &TasksFile { tasks })
    }

    // ── Devices ───────────────────────────────────────────────────

    pub fn devices(&self) -> Vec<Device> {
        self.read::<DevicesFile>(&self.devices_file).devices
    }

    pub fn device(&self, id: &str) -> Option<Device> {
        self.devices().into_iter().find(|d| d.id == id)
    }

    /// Insert or replace a device by ID.
    pub fn save_device(&self, device: &Device) -> Result<(), ChoresError> {
        let mut devices = self.devices();
        devices.retain(|d| d.id != device.id);
        devices.push(device.clone());
        self.write(&self.devices_file, &DevicesFile { devices })
    }

    pub fn delete_device(&self, id: &str) -> Result<(), ChoresError> {
        let mut devices = self.devices();
        devices.retain(|d| d.id != id);
        self.write(&self.devices_file, &DevicesFile { devices })
    }
}
