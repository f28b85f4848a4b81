//! Application Loaders
//!
//! Identifies a boot target and hands its image to the system. Only the
//! headers needed to pick a loader, a system mode and an entry point are
//! looked at; executable contents are the core's business.

mod homebrew;
mod ncch;

use std::fs;
use std::path::Path;
use tracing::{debug, error, warn};

use crate::system::{System, SystemMode};

pub use homebrew::{ElfLoader, ThreeDsxLoader};
pub use ncch::NcchLoader;

/// Offset of the NCCH/NCSD magic
const HEADER_MAGIC_OFFSET: usize = 0x100;

/// Boot target formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Unrecognised
    Unknown,
    /// Game card image (NCSD container)
    Cci,
    /// Executable content (NCCH)
    Cxi,
    /// Homebrew executable
    ThreeDsx,
    /// ELF executable
    Elf,
}

/// Outcome of loading an image (numeric codes are reported to the operator)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ResultStatus {
    Success = 0,
    Error = 1,
    ErrorInvalidFormat = 2,
    ErrorNotImplemented = 3,
    ErrorEncrypted = 4,
    ErrorAlreadyLoaded = 5,
    ErrorMemoryAllocationFailed = 6,
}

impl ResultStatus {
    /// Numeric status code
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Loader for one boot target
pub trait AppLoader {
    /// Format this loader handles
    fn file_type(&self) -> FileType;

    /// Kernel system mode the application requires, if it can be determined
    fn load_kernel_system_mode(&mut self) -> Option<SystemMode>;

    /// Load the application into `system`
    fn load(&mut self, system: &mut System<'_>) -> ResultStatus;
}

/// Identify a file from its contents
pub fn identify_file(data: &[u8]) -> FileType {
    if data.starts_with(b"\x7fELF") {
        FileType::Elf
    } else if data.starts_with(b"3DSX") {
        FileType::ThreeDsx
    } else {
        let magic = data.get(HEADER_MAGIC_OFFSET..HEADER_MAGIC_OFFSET + 4);
        if magic == Some(&b"NCCH"[..]) {
            FileType::Cxi
        } else if magic == Some(&b"NCSD"[..]) {
            FileType::Cci
        } else {
            FileType::Unknown
        }
    }
}

/// Guess a file type from the extension
pub fn guess_from_extension(path: &Path) -> FileType {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("elf") | Some("axf") => FileType::Elf,
        Some("3dsx") => FileType::ThreeDsx,
        Some("cxi") | Some("app") | Some("bin") => FileType::Cxi,
        Some("3ds") | Some("cci") => FileType::Cci,
        _ => FileType::Unknown,
    }
}

/// Pick the loader for a boot target; `None` if it can't be read or identified
pub fn get_loader(path: &Path) -> Option<Box<dyn AppLoader>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            error!("failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    let mut file_type = identify_file(&data);
    let extension_type = guess_from_extension(path);

    if file_type != extension_type {
        warn!(
            "{} looks like {:?} but its extension says {:?}",
            path.display(),
            file_type,
            extension_type
        );
    }
    if file_type == FileType::Unknown {
        file_type = extension_type;
    }

    debug!("loading {} as {:?}", path.display(), file_type);

    match file_type {
        FileType::Elf => Some(Box::new(ElfLoader::new(data))),
        FileType::ThreeDsx => Some(Box::new(ThreeDsxLoader::new(data))),
        FileType::Cxi => Some(Box::new(NcchLoader::new(data))),
        FileType::Cci => Some(Box::new(NcchLoader::from_cci(data))),
        FileType::Unknown => None,
    }
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}
