mod drives;

#[cfg(windows)]
mod device;
#[cfg(not(windows))]
#[path = "device_stub.rs"]
mod device;

#[cfg(windows)]
mod volumes;
#[cfg(not(windows))]
#[path = "volumes_stub.rs"]
mod volumes;

pub use device::{DeviceHandle, SystemDevices};
pub use drives::{
    create_flags, drive_letters, drive_root, media_kind, probe_readiness, CreateFlags,
};
pub use volumes::SystemVolumes;
