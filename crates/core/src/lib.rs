pub mod device;
pub mod selection;
pub mod session;
pub mod volume;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use device::{
    eject, eject_batch, DeviceApi, DevicePath, EjectOutcome, EjectReport, OpenDevice,
    OpenOptions, OsError, EJECT_MEDIA_CONTROL_CODE,
};
pub use selection::{parse_selection, Selection, SelectionError};
pub use session::{run_interactive, Console, SessionSummary};
pub use volume::{list_removable_volumes, MediaKind, VolumeEntry, VolumeId, VolumeSource};
