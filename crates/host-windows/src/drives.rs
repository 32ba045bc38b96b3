use safe_eject_core::{MediaKind, OpenOptions};

const DRIVE_NO_ROOT_DIR: u32 = 1;
const DRIVE_REMOVABLE: u32 = 2;
const DRIVE_FIXED: u32 = 3;
const DRIVE_REMOTE: u32 = 4;
const DRIVE_CDROM: u32 = 5;
const DRIVE_RAMDISK: u32 = 6;

/// Maps a `GetDriveTypeW` result.
pub fn media_kind(drive_type: u32) -> MediaKind {
    match drive_type {
        DRIVE_NO_ROOT_DIR => MediaKind::NoRootDir,
        DRIVE_REMOVABLE => MediaKind::Removable,
        DRIVE_FIXED => MediaKind::Fixed,
        DRIVE_REMOTE => MediaKind::Remote,
        DRIVE_CDROM => MediaKind::Optical,
        DRIVE_RAMDISK => MediaKind::RamDisk,
        _ => MediaKind::Unknown,
    }
}

/// Letters present in a `GetLogicalDrives` bitmask, in A..Z order.
pub fn drive_letters(mask: u32) -> Vec<char> {
    ('A'..='Z')
        .enumerate()
        .filter(|(idx, _)| mask & (1u32 << idx) != 0)
        .map(|(_, letter)| letter)
        .collect()
}

pub fn drive_root(letter: char) -> String {
    format!("{}:\\", letter)
}

/// Only removable drives get the readiness query; it can block for a long
/// time on a disconnected network share.
pub fn probe_readiness(kind: MediaKind) -> bool {
    kind == MediaKind::Removable
}

const GENERIC_READ: u32 = 0x8000_0000;
const GENERIC_WRITE: u32 = 0x4000_0000;
const FILE_SHARE_READ: u32 = 0x1;
const FILE_SHARE_WRITE: u32 = 0x2;
const OPEN_EXISTING: u32 = 3;
const OPEN_ALWAYS: u32 = 4;

/// `CreateFileW` access, share mode and creation disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateFlags {
    pub access: u32,
    pub share: u32,
    pub disposition: u32,
}

pub fn create_flags(options: OpenOptions) -> CreateFlags {
    let mut access = 0;
    if options.read {
        access |= GENERIC_READ;
    }
    if options.write {
        access |= GENERIC_WRITE;
    }
    let mut share = 0;
    if options.share_read {
        share |= FILE_SHARE_READ;
    }
    if options.share_write {
        share |= FILE_SHARE_WRITE;
    }
    let disposition = if options.must_exist {
        OPEN_EXISTING
    } else {
        OPEN_ALWAYS
    };
    CreateFlags {
        access,
        share,
        disposition,
    }
}
