use safe_eject_core::{DeviceApi, DevicePath, OpenOptions, OsError};

const ERROR_NOT_SUPPORTED: u32 = 50;

/// Never constructed off Windows.
#[derive(Debug)]
pub struct DeviceHandle(());

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDevices;

impl DeviceApi for SystemDevices {
    type Handle = DeviceHandle;

    fn open(&self, path: &DevicePath, _options: OpenOptions) -> Result<DeviceHandle, OsError> {
        tracing::debug!(device = %path, "device access requires Windows");
        Err(OsError(ERROR_NOT_SUPPORTED))
    }

    fn control(&self, _handle: &DeviceHandle, _code: u32) -> Result<u32, OsError> {
        Err(OsError(ERROR_NOT_SUPPORTED))
    }

    fn close(&self, _handle: DeviceHandle) -> Result<(), OsError> {
        Ok(())
    }
}
