//! Scriptable stand-ins for the OS volume listing and device primitives.

use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::device::{DeviceApi, DevicePath, OpenOptions, OsError};
use crate::volume::{VolumeEntry, VolumeSource};

pub struct FakeVolumes {
    entries: Vec<VolumeEntry>,
    failure: Option<String>,
    queries: Cell<usize>,
}

impl FakeVolumes {
    pub fn new(entries: Vec<VolumeEntry>) -> Self {
        Self {
            entries,
            failure: None,
            queries: Cell::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            entries: Vec::new(),
            failure: Some(message.to_string()),
            queries: Cell::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl VolumeSource for FakeVolumes {
    fn volumes(&self) -> Result<Vec<VolumeEntry>> {
        self.queries.set(self.queries.get() + 1);
        match &self.failure {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(self.entries.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open { path: String, options: OpenOptions },
    Control { path: String, code: u32 },
    Close { path: String },
}

#[derive(Debug)]
pub struct FakeHandle {
    id: u64,
    path: String,
}

/// Devices succeed unless told otherwise, keyed by device path (`\\.\E:`).
#[derive(Default)]
pub struct FakeDevices {
    open_failures: HashMap<String, OsError>,
    control_failures: HashMap<String, OsError>,
    close_failures: HashMap<String, OsError>,
    bytes_returned: HashMap<String, u32>,
    calls: RefCell<Vec<Call>>,
    live: RefCell<HashSet<u64>>,
    next_id: Cell<u64>,
}

impl FakeDevices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_open(mut self, path: &str, code: u32) -> Self {
        self.open_failures.insert(path.to_string(), OsError(code));
        self
    }

    pub fn fail_control(mut self, path: &str, code: u32) -> Self {
        self.control_failures.insert(path.to_string(), OsError(code));
        self
    }

    pub fn fail_close(mut self, path: &str, code: u32) -> Self {
        self.close_failures.insert(path.to_string(), OsError(code));
        self
    }

    pub fn returning_bytes(mut self, path: &str, bytes: u32) -> Self {
        self.bytes_returned.insert(path.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn opens(&self) -> usize {
        self.count(|call| matches!(call, Call::Open { .. }))
    }

    pub fn controls(&self) -> usize {
        self.count(|call| matches!(call, Call::Control { .. }))
    }

    pub fn closes(&self) -> usize {
        self.count(|call| matches!(call, Call::Close { .. }))
    }

    /// Handles opened and not yet closed.
    pub fn live_handles(&self) -> usize {
        self.live.borrow().len()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|&call| pred(call)).count()
    }
}

impl DeviceApi for FakeDevices {
    type Handle = FakeHandle;

    fn open(&self, path: &DevicePath, options: OpenOptions) -> Result<FakeHandle, OsError> {
        let path = path.as_str().to_string();
        self.calls.borrow_mut().push(Call::Open {
            path: path.clone(),
            options,
        });
        if let Some(error) = self.open_failures.get(&path) {
            return Err(*error);
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.live.borrow_mut().insert(id);
        Ok(FakeHandle { id, path })
    }

    fn control(&self, handle: &FakeHandle, code: u32) -> Result<u32, OsError> {
        assert!(
            self.live.borrow().contains(&handle.id),
            "control on a closed handle for {}",
            handle.path
        );
        self.calls.borrow_mut().push(Call::Control {
            path: handle.path.clone(),
            code,
        });
        match self.control_failures.get(&handle.path) {
            Some(error) => Err(*error),
            None => Ok(self.bytes_returned.get(&handle.path).copied().unwrap_or(0)),
        }
    }

    fn close(&self, handle: FakeHandle) -> Result<(), OsError> {
        assert!(
            self.live.borrow_mut().remove(&handle.id),
            "handle for {} closed twice",
            handle.path
        );
        self.calls.borrow_mut().push(Call::Close {
            path: handle.path.clone(),
        });
        match self.close_failures.get(&handle.path) {
            Some(error) => Err(*error),
            None => Ok(()),
        }
    }
}
