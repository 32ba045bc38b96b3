use anyhow::{anyhow, Result};
use safe_eject_core::{VolumeEntry, VolumeSource};
use std::ffi::OsStr;
use std::os::windows::prelude::*;

use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::{GetDriveTypeW, GetLogicalDrives, GetVolumeInformationW};
use windows::Win32::System::Diagnostics::Debug::{
    SetThreadErrorMode, SEM_FAILCRITICALERRORS, THREAD_ERROR_MODE,
};

use crate::drives::{drive_letters, drive_root, media_kind, probe_readiness};

/// Logical drives as reported by kernel32.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVolumes;

fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

// A drive with no medium (empty card reader) fails the volume query.
// Critical-error dialogs are suppressed for the duration of the query.
fn is_ready(root: &[u16]) -> bool {
    let mut old_mode = THREAD_ERROR_MODE(0);
    let suppressed = unsafe {
        SetThreadErrorMode(
            SEM_FAILCRITICALERRORS,
            Some(&mut old_mode as *mut THREAD_ERROR_MODE as _),
        )
    };
    let ready = unsafe {
        GetVolumeInformationW(PCWSTR(root.as_ptr()), None, None, None, None, None)
    }
    .is_ok();
    if suppressed.is_ok() {
        let _ = unsafe { SetThreadErrorMode(old_mode, None) };
    }
    ready
}

impl VolumeSource for SystemVolumes {
    fn volumes(&self) -> Result<Vec<VolumeEntry>> {
        let mask = unsafe { GetLogicalDrives() };
        if mask == 0 {
            return Err(anyhow!(
                "GetLogicalDrives failed: {}",
                windows::core::Error::from_win32()
            ));
        }

        let mut entries = Vec::new();
        for letter in drive_letters(mask) {
            let root = drive_root(letter);
            let w = wide(&root);
            let kind = media_kind(unsafe { GetDriveTypeW(PCWSTR(w.as_ptr())) });
            let ready = probe_readiness(kind) && is_ready(&w);
            tracing::trace!(volume = %root, ?kind, ready, "logical drive");
            entries.push(VolumeEntry {
                name: root,
                kind,
                ready,
            });
        }
        Ok(entries)
    }
}
