use std::io::prelude::*;
use zip::read::ZipArchive;

use crate::ChipError;

/// Represents an archive of roms, the host supplies the zip data.
pub struct RomArchives<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> RomArchives<R> {
    /// Will open the given zip archive
    pub fn new(reader: R) -> Result<Self, ChipError> {
        let archive = ZipArchive::new(reader).map_err(|err| ChipError::Archive(err.to_string()))?;
        Ok(Self { archive })
    }

    /// Will return all the rom names available to be chosen
    pub fn file_names(&self) -> Vec<&'_ str> {
        self.archive.file_names().collect()
    }

    /// Will decompress the information from the zip archive
    pub fn get_file_data(&mut self, name: &str) -> Result<Rom, ChipError> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|err| ChipError::Archive(format!("{}: {}", name, err)))?;

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|err| ChipError::Archive(format!("{}: {}", name, err)))?;

        log::debug!("Extracted rom '{}' with {} bytes.", name, data.len());
        Ok(Rom::new(name, data))
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Represents a single rom with it's information
pub struct Rom {
    /// The rom name
    name: String,
    /// The raw program, loaded verbatim at `0x200`
    data: Box<[u8]>,
}

impl Rom {
    /// Will generate a new rom based of the given data
    pub fn new(name: &str, data: impl Into<Box<[u8]>>) -> Self {
        Rom {
            name: name.to_string(),
            data: data.into(),
        }
    }

    /// Will return a slice internal values of the given data
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Will return the name of the rom.
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::{FileOptions, ZipWriter};

    const ROMS: [(&str, &[u8]); 2] = [
        ("MAZE", &[0xA2, 0x1E, 0xC2, 0x01, 0x32, 0x01, 0xA2, 0x1A]),
        ("PONG", &[0x6A, 0x02, 0x6B, 0x0C, 0x6C, 0x3F]),
    ];

    fn build_archive() -> Cursor<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in ROMS.iter() {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn test_rom_extract() {
        let mut ra = RomArchives::new(build_archive()).unwrap();
        for (name, data) in ROMS.iter() {
            let rom = ra.get_file_data(name).unwrap();
            assert_eq!(rom.get_name(), *name);
            assert_eq!(rom.get_data(), *data);
        }
    }

    #[test]
    fn test_file_names() {
        let ra = RomArchives::new(build_archive()).unwrap();
        let mut files = ra.file_names();
        files.sort_unstable();

        assert_eq!(files, vec!["MAZE", "PONG"]);
    }

    #[test]
    fn test_missing_rom() {
        let mut ra = RomArchives::new(build_archive()).unwrap();
        assert!(matches!(
            ra.get_file_data("TETRIS"),
            Err(ChipError::Archive(_))
        ));
    }

    #[test]
    fn test_not_an_archive() {
        let res = RomArchives::new(Cursor::new(vec![0u8; 16]));
        assert!(matches!(res, Err(ChipError::Archive(_))));
    }
}
