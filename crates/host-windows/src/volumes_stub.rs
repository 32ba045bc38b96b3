use anyhow::{anyhow, Result};
use safe_eject_core::{VolumeEntry, VolumeSource};

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVolumes;

impl VolumeSource for SystemVolumes {
    fn volumes(&self) -> Result<Vec<VolumeEntry>> {
        Err(anyhow!("volume enumeration requires Windows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safe_eject_core::list_removable_volumes;

    #[test]
    fn enumeration_fails_off_windows() {
        let err = list_removable_volumes(&SystemVolumes).unwrap_err();
        assert!(err.to_string().contains("requires Windows"));
    }
}
