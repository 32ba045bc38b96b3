use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::volume::VolumeId;

/// IOCTL_STORAGE_EJECT_MEDIA
pub const EJECT_MEDIA_CONTROL_CODE: u32 = 0x2D4808;

const RAW_DEVICE_PREFIX: &str = r"\\.\";
const ERROR_INVALID_HANDLE: u32 = 6;

/// Raw device namespace path for a volume, e.g. `\\.\E:` for `E:\`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DevicePath(String);

impl DevicePath {
    pub fn for_volume(volume: &VolumeId) -> Self {
        let name = volume.as_str().trim_end_matches('\\');
        Self(format!("{}{}", RAW_DEVICE_PREFIX, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access requested when acquiring a device handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub share_read: bool,
    pub share_write: bool,
    pub must_exist: bool,
}

impl OpenOptions {
    /// Read+write access that leaves the device readable and writable by
    /// everyone else, and never creates anything.
    pub const EJECT: Self = Self {
        read: true,
        write: true,
        share_read: true,
        share_write: true,
        must_exist: true,
    };
}

/// Last-error code reported by the OS for a failed primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(transparent)]
#[error("error {}{}", .0, reason_suffix(.0))]
pub struct OsError(pub u32);

impl OsError {
    pub fn code(&self) -> u32 {
        self.0
    }

    pub fn reason(&self) -> Option<&'static str> {
        let reason = match self.0 {
            2 => "file not found",
            3 => "path not found",
            5 => "access denied",
            21 => "device not ready",
            32 => "device is in use by another process",
            50 => "not supported",
            1117 => "I/O device error",
            1167 => "device not connected",
            2404 => "device is in use",
            _ => return None,
        };
        Some(reason)
    }
}

fn reason_suffix(code: &u32) -> String {
    match OsError(*code).reason() {
        Some(reason) => format!(": {}", reason),
        None => String::new(),
    }
}

/// Device open/control/close primitives.
pub trait DeviceApi {
    type Handle;

    fn open(&self, path: &DevicePath, options: OpenOptions) -> Result<Self::Handle, OsError>;

    /// Sends `code` with empty input and output buffers. Returns the byte count
    /// the OS reports.
    fn control(&self, handle: &Self::Handle, code: u32) -> Result<u32, OsError>;

    fn close(&self, handle: Self::Handle) -> Result<(), OsError>;
}

impl<T: DeviceApi + ?Sized> DeviceApi for &T {
    type Handle = T::Handle;

    fn open(&self, path: &DevicePath, options: OpenOptions) -> Result<Self::Handle, OsError> {
        (**self).open(path, options)
    }

    fn control(&self, handle: &Self::Handle, code: u32) -> Result<u32, OsError> {
        (**self).control(handle, code)
    }

    fn close(&self, handle: Self::Handle) -> Result<(), OsError> {
        (**self).close(handle)
    }
}

/// An open device handle, closed exactly once when dropped.
pub struct OpenDevice<'a, A: DeviceApi + ?Sized> {
    api: &'a A,
    path: DevicePath,
    handle: Option<A::Handle>,
}

impl<'a, A: DeviceApi + ?Sized> OpenDevice<'a, A> {
    pub fn open(api: &'a A, path: DevicePath, options: OpenOptions) -> Result<Self, OsError> {
        let handle = api.open(&path, options)?;
        debug!(device = %path, "device opened");
        Ok(Self {
            api,
            path,
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &DevicePath {
        &self.path
    }

    pub fn control(&self, code: u32) -> Result<u32, OsError> {
        match &self.handle {
            Some(handle) => self.api.control(handle, code),
            None => Err(OsError(ERROR_INVALID_HANDLE)),
        }
    }
}

impl<A: DeviceApi + ?Sized> Drop for OpenDevice<'_, A> {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match self.api.close(handle) {
            Ok(()) => debug!(device = %self.path, "device closed"),
            Err(err) => warn!(device = %self.path, %err, "closing device handle failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EjectOutcome {
    Succeeded,
    /// The device could not be opened; no command was sent.
    AccessDenied { error: OsError },
    /// The device was opened but refused the eject command.
    CommandRejected { error: OsError },
}

impl EjectOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EjectOutcome::Succeeded)
    }

    pub fn error(&self) -> Option<OsError> {
        match self {
            EjectOutcome::Succeeded => None,
            EjectOutcome::AccessDenied { error } | EjectOutcome::CommandRejected { error } => {
                Some(*error)
            }
        }
    }
}

pub fn eject<A: DeviceApi + ?Sized>(api: &A, volume: &VolumeId) -> EjectOutcome {
    let path = DevicePath::for_volume(volume);
    let device = match OpenDevice::open(api, path, OpenOptions::EJECT) {
        Ok(device) => device,
        Err(error) => {
            warn!(%volume, %error, "could not open device");
            return EjectOutcome::AccessDenied { error };
        }
    };

    match device.control(EJECT_MEDIA_CONTROL_CODE) {
        Ok(bytes_returned) => {
            info!(%volume, device = %device.path(), bytes_returned, "media ejected");
            EjectOutcome::Succeeded
        }
        Err(error) => {
            warn!(%volume, device = %device.path(), %error, "eject command rejected");
            EjectOutcome::CommandRejected { error }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EjectReport {
    pub volume: VolumeId,
    pub device_path: DevicePath,
    pub outcome: EjectOutcome,
}

impl fmt::Display for EjectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            EjectOutcome::Succeeded => write!(f, "{} was ejected safely.", self.volume),
            EjectOutcome::AccessDenied { error } => {
                write!(f, "Could not access {} ({}).", self.volume, error)
            }
            EjectOutcome::CommandRejected { error } => {
                write!(f, "Could not eject {} ({}).", self.volume, error)
            }
        }
    }
}

/// Ejects each volume in order. A failure never stops the remaining volumes.
pub fn eject_batch<A: DeviceApi + ?Sized>(
    api: &A,
    volumes: &[VolumeId],
    mut on_report: impl FnMut(&EjectReport),
) -> Vec<EjectReport> {
    let mut reports = Vec::with_capacity(volumes.len());
    for volume in volumes {
        let report = EjectReport {
            volume: volume.clone(),
            device_path: DevicePath::for_volume(volume),
            outcome: eject(api, volume),
        };
        on_report(&report);
        reports.push(report);
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Call, FakeDevices};

    fn e_drive() -> VolumeId {
        VolumeId::from("E:\\")
    }

    #[test]
    fn device_path_strips_separator_and_adds_prefix() {
        assert_eq!(DevicePath::for_volume(&e_drive()).as_str(), r"\\.\E:");
        assert_eq!(DevicePath::for_volume(&VolumeId::from("e:\\")).as_str(), r"\\.\e:");
        assert_eq!(DevicePath::for_volume(&VolumeId::from("E:")).as_str(), r"\\.\E:");
        assert_eq!(
            DevicePath::for_volume(&VolumeId::from("C:\\Mounts\\Card\\")).as_str(),
            r"\\.\C:\Mounts\Card"
        );
    }

    #[test]
    fn successful_eject_opens_controls_and_closes() {
        let devices = FakeDevices::new();
        let outcome = eject(&devices, &e_drive());

        assert_eq!(outcome, EjectOutcome::Succeeded);
        assert_eq!(
            devices.calls(),
            vec![
                Call::Open {
                    path: r"\\.\E:".to_string(),
                    options: OpenOptions::EJECT,
                },
                Call::Control {
                    path: r"\\.\E:".to_string(),
                    code: EJECT_MEDIA_CONTROL_CODE,
                },
                Call::Close {
                    path: r"\\.\E:".to_string(),
                },
            ]
        );
        assert_eq!(devices.live_handles(), 0);
    }

    #[test]
    fn open_failure_is_access_denied_without_control_or_close() {
        let devices = FakeDevices::new().fail_open(r"\\.\E:", 5);
        let outcome = eject(&devices, &e_drive());

        assert_eq!(
            outcome,
            EjectOutcome::AccessDenied {
                error: OsError(5)
            }
        );
        assert_eq!(devices.controls(), 0);
        assert_eq!(devices.closes(), 0);
    }

    #[test]
    fn command_failure_still_closes_handle() {
        let devices = FakeDevices::new().fail_control(r"\\.\E:", 32);
        let outcome = eject(&devices, &e_drive());

        assert_eq!(
            outcome,
            EjectOutcome::CommandRejected {
                error: OsError(32)
            }
        );
        assert_eq!(devices.closes(), 1);
        assert_eq!(devices.live_handles(), 0);
    }

    #[test]
    fn close_failure_does_not_override_outcome() {
        let devices = FakeDevices::new().fail_close(r"\\.\E:", 6);
        assert_eq!(eject(&devices, &e_drive()), EjectOutcome::Succeeded);
        assert_eq!(devices.closes(), 1);

        let devices = FakeDevices::new()
            .fail_control(r"\\.\E:", 1117)
            .fail_close(r"\\.\E:", 6);
        assert_eq!(
            eject(&devices, &e_drive()),
            EjectOutcome::CommandRejected {
                error: OsError(1117)
            }
        );
    }

    #[test]
    fn returned_byte_count_is_ignored() {
        let devices = FakeDevices::new().returning_bytes(r"\\.\E:", 512);
        assert_eq!(eject(&devices, &e_drive()), EjectOutcome::Succeeded);
    }

    #[test]
    fn close_happens_once_iff_open_succeeded() {
        let cases = [
            (FakeDevices::new(), 1),
            (FakeDevices::new().fail_open(r"\\.\E:", 2), 0),
            (FakeDevices::new().fail_control(r"\\.\E:", 21), 1),
        ];
        for (devices, expected_closes) in cases {
            eject(&devices, &e_drive());
            assert_eq!(devices.closes(), expected_closes);
        }
    }

    #[test]
    fn batch_continues_past_failures() {
        let devices = FakeDevices::new().fail_control(r"\\.\F:", 1117);
        let volumes = vec![
            VolumeId::from("E:\\"),
            VolumeId::from("F:\\"),
            VolumeId::from("G:\\"),
        ];

        let mut seen = Vec::new();
        let reports = eject_batch(&devices, &volumes, |report| seen.push(report.volume.clone()));

        assert_eq!(seen, volumes);
        let outcomes: Vec<EjectOutcome> = reports.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                EjectOutcome::Succeeded,
                EjectOutcome::CommandRejected {
                    error: OsError(1117)
                },
                EjectOutcome::Succeeded,
            ]
        );
        assert_eq!(devices.closes(), 3);
    }

    #[test]
    fn batch_runs_attempts_sequentially() {
        let devices = FakeDevices::new();
        let volumes = vec![VolumeId::from("E:\\"), VolumeId::from("F:\\")];
        eject_batch(&devices, &volumes, |_| {});

        let kinds: Vec<&'static str> = devices
            .calls()
            .iter()
            .map(|call| match call {
                Call::Open { .. } => "open",
                Call::Control { .. } => "control",
                Call::Close { .. } => "close",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["open", "control", "close", "open", "control", "close"]
        );
    }

    #[test]
    fn report_messages_carry_error_codes() {
        let report = EjectReport {
            volume: e_drive(),
            device_path: DevicePath::for_volume(&e_drive()),
            outcome: EjectOutcome::CommandRejected {
                error: OsError(32),
            },
        };
        assert_eq!(
            report.to_string(),
            "Could not eject E:\\ (error 32: device is in use by another process)."
        );
        assert_eq!(OsError(4242).to_string(), "error 4242");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let value = serde_json::to_value(EjectOutcome::AccessDenied {
            error: OsError(5),
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({ "status": "access_denied", "error": 5 }));
    }
}
