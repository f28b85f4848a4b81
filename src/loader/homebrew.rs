//! Homebrew executables: ELF and 3DSX

use crate::loader::{read_u16, read_u32, AppLoader, FileType, ResultStatus};
use crate::system::{LoadedImage, System, SystemMode};

/// Homebrew gets the 96 MiB layout
const HOMEBREW_SYSTEM_MODE: SystemMode = SystemMode::DEV1;

/// 3DSX images are linked at this address
const THREEDSX_ENTRY_POINT: u32 = 0x0010_0000;

const ELF_HEADER_SIZE: usize = 0x34;
const ELF_CLASS_32: u8 = 1;
const ELF_DATA_LSB: u8 = 1;
const ELF_MACHINE_ARM: u16 = 40;

const THREEDSX_HEADER_SIZE: usize = 0x20;

/// ELF loader
pub struct ElfLoader {
    data: Vec<u8>,
    loaded: bool,
}

impl ElfLoader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            loaded: false,
        }
    }

    fn entry_point(&self) -> Option<u32> {
        if self.data.len() < ELF_HEADER_SIZE
            || !self.data.starts_with(b"\x7fELF")
            || self.data[4] != ELF_CLASS_32
            || self.data[5] != ELF_DATA_LSB
            || read_u16(&self.data, 0x12) != Some(ELF_MACHINE_ARM)
        {
            return None;
        }
        read_u32(&self.data, 0x18)
    }
}

impl AppLoader for ElfLoader {
    fn file_type(&self) -> FileType {
        FileType::Elf
    }

    fn load_kernel_system_mode(&mut self) -> Option<SystemMode> {
        Some(HOMEBREW_SYSTEM_MODE)
    }

    fn load(&mut self, system: &mut System<'_>) -> ResultStatus {
        if self.loaded {
            return ResultStatus::ErrorAlreadyLoaded;
        }
        let Some(entry_point) = self.entry_point() else {
            return ResultStatus::ErrorInvalidFormat;
        };

        let status = system.load_image(LoadedImage {
            file_type: FileType::Elf,
            entry_point,
            footprint: self.data.len(),
            data: self.data.clone(),
        });
        self.loaded = status == ResultStatus::Success;
        status
    }
}

/// 3DSX segment sizes
#[derive(Debug, Clone, Copy)]
struct ThreeDsxHeader {
    header_size: usize,
    code_size: usize,
    rodata_size: usize,
    data_size: usize,
    bss_size: usize,
}

impl ThreeDsxHeader {
    fn parse(data: &[u8]) -> Option<Self> {
        if !data.starts_with(b"3DSX") {
            return None;
        }
        let size = |offset| read_u32(data, offset).map(|v| v as usize);
        Some(Self {
            header_size: read_u16(data, 4)? as usize,
            code_size: size(0x10)?,
            rodata_size: size(0x14)?,
            data_size: size(0x18)?,
            bss_size: size(0x1C)?,
        })
    }

    /// Bytes of segment data stored in the file
    fn file_segments(&self) -> Option<usize> {
        self.code_size
            .checked_add(self.rodata_size)?
            .checked_add(self.data_size)
    }

    /// End of the segment data, if it lies within a file of `len` bytes
    fn segments_end(&self, len: usize) -> Option<usize> {
        if self.header_size < THREEDSX_HEADER_SIZE {
            return None;
        }
        let end = self.header_size.checked_add(self.file_segments()?)?;
        (end <= len).then_some(end)
    }

    /// Memory taken once loaded
    fn footprint(&self) -> Option<usize> {
        self.file_segments()?.checked_add(self.bss_size)
    }
}

/// 3DSX loader
pub struct ThreeDsxLoader {
    data: Vec<u8>,
    loaded: bool,
}

impl ThreeDsxLoader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            loaded: false,
        }
    }
}

impl AppLoader for ThreeDsxLoader {
    fn file_type(&self) -> FileType {
        FileType::ThreeDsx
    }

    fn load_kernel_system_mode(&mut self) -> Option<SystemMode> {
        Some(HOMEBREW_SYSTEM_MODE)
    }

    fn load(&mut self, system: &mut System<'_>) -> ResultStatus {
        if self.loaded {
            return ResultStatus::ErrorAlreadyLoaded;
        }
        let Some(header) = ThreeDsxHeader::parse(&self.data) else {
            return ResultStatus::ErrorInvalidFormat;
        };
        let Some(footprint) = header
            .segments_end(self.data.len())
            .and_then(|_| header.footprint())
        else {
            return ResultStatus::ErrorInvalidFormat;
        };

        let status = system.load_image(LoadedImage {
            file_type: FileType::ThreeDsx,
            entry_point: THREEDSX_ENTRY_POINT,
            footprint,
            data: self.data.clone(),
        });
        self.loaded = status == ResultStatus::Success;
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::test_images;
    use crate::settings::Settings;
    use crate::window::EmuWindow;
    use crate::input::ButtonState;

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
    fn test_elf_load() {
        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::DEV1, &Settings::default());
        let mut loader = ElfLoader::new(test_images::elf());

        assert_eq!(loader.load_kernel_system_mode(), Some(SystemMode::DEV1));
        assert_eq!(loader.load(&mut system), ResultStatus::Success);
        assert_eq!(system.image().unwrap().entry_point, 0x0010_0000);
        assert_eq!(loader.load(&mut system), ResultStatus::ErrorAlreadyLoaded);
    }

    #[test]
    fn test_elf_rejects_wrong_machine() {
        let mut image = test_images::elf();
        image[0x12] = 62; // x86-64
        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::DEV1, &Settings::default());

        let mut loader = ElfLoader::new(image);
        assert_eq!(loader.load(&mut system), ResultStatus::ErrorInvalidFormat);

        let mut loader = ElfLoader::new(b"\x7fELF".to_vec());
        assert_eq!(loader.load(&mut system), ResultStatus::ErrorInvalidFormat);
        assert!(system.image().is_none());
    }

    #[test]
    fn test_3dsx_load() {
        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::DEV1, &Settings::default());
        let mut loader = ThreeDsxLoader::new(test_images::three_dsx());

        assert_eq!(loader.load(&mut system), ResultStatus::Success);
        let image = system.image().unwrap();
        assert_eq!(image.file_type, FileType::ThreeDsx);
        assert_eq!(image.footprint, 0x10 + 0x08 + 0x100);
    }

    #[test]
    fn test_3dsx_truncated() {
        let mut image = test_images::three_dsx();
        image[0x18..0x1C].copy_from_slice(&0x1000u32.to_le_bytes());
        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::DEV1, &Settings::default());

        let mut loader = ThreeDsxLoader::new(image);
        assert_eq!(loader.load(&mut system), ResultStatus::ErrorInvalidFormat);
    }

    #[test]
    fn test_3dsx_huge_segments() {
        let mut image = test_images::three_dsx();
        for offset in [0x10, 0x14, 0x18, 0x1C] {
            image[offset..offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        }
        let mut window = NullWindow;
        let mut system = System::init(&mut window, SystemMode::DEV1, &Settings::default());

        let mut loader = ThreeDsxLoader::new(image);
        assert_eq!(loader.load(&mut system), ResultStatus::ErrorInvalidFormat);
        assert!(system.image().is_none());
    }

    #[test]
    fn test_3dsx_size_overflow() {
        let header = ThreeDsxHeader {
            header_size: THREEDSX_HEADER_SIZE,
            code_size: usize::MAX,
            rodata_size: 1,
            data_size: 0,
            bss_size: 0,
        };
        assert_eq!(header.file_segments(), None);
        assert_eq!(header.segments_end(usize::MAX), None);

        let header = ThreeDsxHeader {
            code_size: 0x10,
            rodata_size: 0,
            bss_size: usize::MAX,
            ..header
        };
        assert_eq!(header.segments_end(0x40), Some(0x30));
        assert_eq!(header.footprint(), None);
    }
}
