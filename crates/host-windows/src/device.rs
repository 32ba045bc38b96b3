use safe_eject_core::{DeviceApi, DevicePath, OpenOptions, OsError};
use std::ffi::OsStr;
use std::os::windows::prelude::*;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Storage::FileSystem::{
    CreateFileW, FILE_CREATION_DISPOSITION, FILE_FLAGS_AND_ATTRIBUTES, FILE_SHARE_MODE,
};
use windows::Win32::System::IO::DeviceIoControl;

use crate::drives::create_flags;

const ERROR_INVALID_HANDLE: u32 = 6;

/// Raw `HANDLE` from `CreateFileW`. Only `SystemDevices::close` releases it.
#[derive(Debug)]
pub struct DeviceHandle(HANDLE);

/// Device primitives bound to kernel32.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDevices;

fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

// Win32 failures surface as HRESULT_FROM_WIN32(code).
fn os_error(err: &windows::core::Error) -> OsError {
    OsError((err.code().0 as u32) & 0xFFFF)
}

impl DeviceApi for SystemDevices {
    type Handle = DeviceHandle;

    fn open(&self, path: &DevicePath, options: OpenOptions) -> Result<DeviceHandle, OsError> {
        let w = wide(path.as_str());

        let flags = create_flags(options);

        let handle = unsafe {
            CreateFileW(
                PCWSTR(w.as_ptr()),
                flags.access,
                FILE_SHARE_MODE(flags.share),
                None,
                FILE_CREATION_DISPOSITION(flags.disposition),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                None,
            )
        }
        .map_err(|err| os_error(&err))?;

        if handle.is_invalid() {
            return Err(OsError(ERROR_INVALID_HANDLE));
        }
        Ok(DeviceHandle(handle))
    }

    fn control(&self, handle: &DeviceHandle, code: u32) -> Result<u32, OsError> {
        let mut returned = 0u32;
        unsafe {
            DeviceIoControl(
                handle.0,
                code,
                None,
                0,
                None,
                0,
                Some(&mut returned),
                None,
            )
        }
        .map_err(|err| os_error(&err))?;
        Ok(returned)
    }

    fn close(&self, handle: DeviceHandle) -> Result<(), OsError> {
        unsafe { CloseHandle(handle.0) }.map_err(|err| os_error(&err))
    }
}
