use anyhow::Result;
use serde::Serialize;
use std::fmt;

/// Mount point name as reported by the OS, e.g. `E:\`.
///
/// Produced fresh by every enumeration. The device behind it may be gone by the
/// time it is ejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VolumeId(String);

impl VolumeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VolumeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Unknown,
    NoRootDir,
    Removable,
    Fixed,
    Remote,
    Optical,
    RamDisk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    pub name: String,
    pub kind: MediaKind,
    pub ready: bool,
}

impl VolumeEntry {
    pub fn is_ejectable(&self) -> bool {
        self.kind == MediaKind::Removable && self.ready
    }
}

/// OS volume listing facility.
pub trait VolumeSource {
    fn volumes(&self) -> Result<Vec<VolumeEntry>>;
}

impl<T: VolumeSource + ?Sized> VolumeSource for &T {
    fn volumes(&self) -> Result<Vec<VolumeEntry>> {
        (**self).volumes()
    }
}

pub fn list_removable_volumes(source: &impl VolumeSource) -> Result<Vec<VolumeId>> {
    let entries = source.volumes()?;
    let total = entries.len();
    let removable: Vec<VolumeId> = entries
        .into_iter()
        .filter(|entry| {
            let keep = entry.is_ejectable();
            if !keep {
                tracing::trace!(
                    volume = %entry.name,
                    kind = ?entry.kind,
                    ready = entry.ready,
                    "skipping volume"
                );
            }
            keep
        })
        .map(|entry| VolumeId::new(entry.name))
        .collect();
    tracing::debug!(total, removable = removable.len(), "enumerated volumes");
    Ok(removable)
}
