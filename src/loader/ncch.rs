//! NCCH executables, bare (CXI) or inside a game card image (CCI)

use tracing::debug;

use crate::loader::{read_u32, AppLoader, FileType, ResultStatus};
use crate::system::{LoadedImage, System, SystemMode};

/// NCCH header layout
const NCCH_HEADER_SIZE: usize = 0x200;
const NCCH_EXHEADER_SIZE: usize = 0x180;
const NCCH_FLAGS: usize = 0x188;
const NCCH_FLAG_NO_CRYPTO: u8 = 0x04;

/// Extended header layout (relative to its start, right after the NCCH header)
const EXHEADER_TEXT_ADDRESS: usize = 0x10;
const EXHEADER_ARM11_FLAGS: usize = 0x1CE;

/// First partition entry of the NCSD partition table
const NCSD_PARTITION0_OFFSET: usize = 0x120;
const MEDIA_UNIT_SIZE: usize = 0x200;

/// NCCH loader
pub struct NcchLoader {
    file_type: FileType,
    /// NCCH partition contents (empty if the container had none)
    data: Vec<u8>,
    loaded: bool,
}

impl NcchLoader {
    /// Loader for a bare NCCH
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            file_type: FileType::Cxi,
            data,
            loaded: false,
        }
    }

    /// Loader for the first partition of a CCI
    pub fn from_cci(data: Vec<u8>) -> Self {
        let partition = read_u32(&data, NCSD_PARTITION0_OFFSET)
            .and_then(|units| (units as usize).checked_mul(MEDIA_UNIT_SIZE))
            .and_then(|offset| data.get(offset..))
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        debug!("CCI partition 0: {} bytes", partition.len());

        Self {
            file_type: FileType::Cci,
            data: partition,
            loaded: false,
        }
    }

    fn is_ncch(&self) -> bool {
        self.data.get(0x100..0x104) == Some(&b"NCCH"[..])
    }

    fn exheader_size(&self) -> usize {
        read_u32(&self.data, NCCH_EXHEADER_SIZE).unwrap_or(0) as usize
    }

    fn exheader_byte(&self, offset: usize) -> Option<u8> {
        if self.exheader_size() <= offset {
            return None;
        }
        self.data.get(NCCH_HEADER_SIZE + offset).copied()
    }

    fn is_encrypted(&self) -> bool {
        self.data
            .get(NCCH_FLAGS + 7)
            .map_or(true, |flags| flags & NCCH_FLAG_NO_CRYPTO == 0)
    }
}

impl AppLoader for NcchLoader {
    fn file_type(&self) -> FileType {
        self.file_type
    }

    fn load_kernel_system_mode(&mut self) -> Option<SystemMode> {
        if !self.is_ncch() {
            return None;
        }
        let flags = self.exheader_byte(EXHEADER_ARM11_FLAGS)?;
        SystemMode::from_raw(flags >> 4)
    }

    fn load(&mut self, system: &mut System<'_>) -> ResultStatus {
        if self.loaded {
            return ResultStatus::ErrorAlreadyLoaded;
        }
        if !self.is_ncch() {
            return ResultStatus::ErrorInvalidFormat;
        }
        if self.is_encrypted() {
            return ResultStatus::ErrorEncrypted;
        }
        // Content without an extended header (CFA) has no code to run
        if self.exheader_size() == 0 {
            return ResultStatus::ErrorNotImplemented;
        }
        let Some(entry_point) = read_u32(&self.data, NCCH_HEADER_SIZE + EXHEADER_TEXT_ADDRESS)
        else {
            return ResultStatus::ErrorInvalidFormat;
        };

        let status = system.load_image(LoadedImage {
            file_type: self.file_type,
            entry_point,
            footprint: self.data.len(),
            data: self.data.clone(),
        });
        self.loaded = status == ResultStatus::Success;
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonState;
    use crate::loader::test_images;
    use crate::settings::Settings;
    use crate::window::EmuWindow;

    struct NullWindow;

    impl EmuWindow for NullWindow {
        fn is_open(&self) -> bool {
            false
        }
        fn poll_events(&mut self) {}
        fn swap_buffers(&mut self) {}
        fn make_current(&mut self) {}
        fn done_current(&mut self) {}
        fn pad_state(&self) -> ButtonState {
            ButtonState::default()
        }
    }

    #[test]
    fn test_system_mode_from_exheader() {
        let mut loader = NcchLoader::new(test_images::ncch(3, false));
        assert_eq!(loader.load_kernel_system_mode(), Some(SystemMode::DEV2));

        let mut loader = NcchLoader::new(test_images::ncch(0, false));
        assert_eq!(loader.load_kernel_system_mode(), Some(SystemMode::PROD));
    }

    #[test]
    fn test_system_mode_undefined() {
        // Code 1 is not a defined mode
        let mut loader = NcchLoader::new(test_images::ncch(1, false));
        assert_eq!(loader.load_kernel_system_mode(), None);

        // Truncated before the extended header
        let mut loader = NcchLoader::new(test_images::ncch(0, false)[..0x200].to_vec());
        assert_eq!(loader.load_kernel_system_mode(), None);
    }

    #[test]
    fn test_load_cxi() {
        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::PROD, &Settings::default());
        let mut loader = NcchLoader::new(test_images::ncch(0, false));

        assert_eq!(loader.load(&mut system), ResultStatus::Success);
        assert_eq!(system.image().unwrap().entry_point, 0x0010_0000);
        assert_eq!(loader.load(&mut system), ResultStatus::ErrorAlreadyLoaded);
    }

    #[test]
    fn test_load_encrypted() {
        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::PROD, &Settings::default());
        let mut loader = NcchLoader::new(test_images::ncch(0, true));

        assert_eq!(loader.load(&mut system), ResultStatus::ErrorEncrypted);
        assert!(system.image().is_none());
    }

    #[test]
    fn test_cci_first_partition() {
        let mut loader = NcchLoader::from_cci(test_images::cci(test_images::ncch(4, false)));
        assert_eq!(loader.file_type(), FileType::Cci);
        assert_eq!(loader.load_kernel_system_mode(), Some(SystemMode::DEV3));

        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::DEV3, &Settings::default());
        assert_eq!(loader.load(&mut system), ResultStatus::Success);
        assert_eq!(system.image().unwrap().file_type, FileType::Cci);
    }

    #[test]
    fn test_cci_without_partition() {
        let mut loader = NcchLoader::from_cci(test_images::cci(Vec::new()));
        assert_eq!(loader.load_kernel_system_mode(), None);
    }

    #[test]
    fn test_cci_partition_offset_out_of_range() {
        let mut image = test_images::cci(test_images::ncch(0, false));
        image[NCSD_PARTITION0_OFFSET..NCSD_PARTITION0_OFFSET + 4]
            .copy_from_slice(&u32::MAX.to_le_bytes());

        let mut loader = NcchLoader::from_cci(image);
        assert_eq!(loader.load_kernel_system_mode(), None);

        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::PROD, &Settings::default());
        assert_eq!(loader.load(&mut system), ResultStatus::ErrorInvalidFormat);
    }
}
