//! Header fields of the VGM 1.61 container that this crate reads or writes.
use crate::binutil::{read_slice, read_u8_at, read_u32_le_at};
use crate::chip::ClockRate;
use crate::error::FormatError;

/// Four-byte magic tag at offset 0.
pub const VGM_IDENT: &[u8; 4] = b"Vgm ";

/// The only supported container version (BCD 1.61).
pub const VGM_VERSION: u32 = 0x161;

/// Size of the header emitted by the encoder; the command stream starts here.
pub const HEADER_SIZE: usize = 0xC0;

/// Clock flag: Famicom Disk System expansion audio.
pub const CLOCK_FLAG_FDS: u32 = 0x8000_0000;

/// Clock flag: dual-chip operation.
pub const CLOCK_FLAG_DUAL: u32 = 0x4000_0000;

/// Mask selecting the clock rate proper from the APU clock field.
pub const CLOCK_MASK: u32 = 0x3FFF_FFFF;

/// A header field this crate touches, with its fixed byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Ident,
    EofOffset,
    Version,
    Gd3Offset,
    TotalSamples,
    LoopOffset,
    LoopSamples,
    Rate,
    DataOffset,
    Volume,
    LoopBase,
    LoopModifier,
    NesApuClock,
}

impl HeaderField {
    pub fn offset(self) -> usize {
        match self {
            HeaderField::Ident => 0x00,
            HeaderField::EofOffset => 0x04,
            HeaderField::Version => 0x08,
            HeaderField::Gd3Offset => 0x14,
            HeaderField::TotalSamples => 0x18,
            HeaderField::LoopOffset => 0x1C,
            HeaderField::LoopSamples => 0x20,
            HeaderField::Rate => 0x24,
            HeaderField::DataOffset => 0x34,
            HeaderField::Volume => 0x7C,
            HeaderField::LoopBase => 0x7E,
            HeaderField::LoopModifier => 0x7F,
            HeaderField::NesApuClock => 0x84,
        }
    }

    pub fn len(self) -> usize {
        match self {
            HeaderField::Volume => 2,
            HeaderField::LoopBase | HeaderField::LoopModifier => 1,
            _ => 4,
        }
    }

    /// Field name used in error contexts.
    pub fn name(self) -> &'static str {
        match self {
            HeaderField::Ident => "ident",
            HeaderField::EofOffset => "eof_offset",
            HeaderField::Version => "version",
            HeaderField::Gd3Offset => "gd3_offset",
            HeaderField::TotalSamples => "total_samples",
            HeaderField::LoopOffset => "loop_offset",
            HeaderField::LoopSamples => "loop_samples",
            HeaderField::Rate => "rate",
            HeaderField::DataOffset => "data_offset",
            HeaderField::Volume => "volume",
            HeaderField::LoopBase => "loop_base",
            HeaderField::LoopModifier => "loop_modifier",
            HeaderField::NesApuClock => "nes_apu_clock",
        }
    }

    /// Read this field as a little-endian `u32`.
    ///
    /// One- and two-byte fields are zero-extended.
    pub fn read(self, bytes: &[u8]) -> Result<u32, FormatError> {
        match self.len() {
            4 => read_u32_le_at(bytes, self.offset(), self.name()),
            len => {
                let slice = read_slice(bytes, self.offset(), len, self.name())?;
                Ok(slice
                    .iter()
                    .rev()
                    .fold(0u32, |acc, &b| (acc << 8) | b as u32))
            }
        }
    }
}

/// The validated subset of a VGM header relevant to the NES APU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VgmHeader {
    pub eof_offset: u32,
    pub version: u32,
    pub gd3_offset: u32,
    pub total_samples: u32,
    pub loop_offset: u32,
    pub loop_samples: u32,
    pub rate: u32,
    /// Absolute offset of the first command byte.
    pub data_start: usize,
    /// Raw clock field including flag bits.
    pub nes_apu_clock: u32,
}

impl VgmHeader {
    /// Parse the header fields without checking them.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let ident = read_slice(bytes, 0, 4, HeaderField::Ident.name())?;
        if ident != VGM_IDENT {
            let mut id = [0u8; 4];
            id.copy_from_slice(ident);
            return Err(FormatError::InvalidIdent(id));
        }
        let data_offset = HeaderField::DataOffset.read(bytes)?;
        let data_start = if data_offset == 0 {
            0x40
        } else {
            HeaderField::DataOffset.offset() + data_offset as usize
        };
        Ok(VgmHeader {
            eof_offset: HeaderField::EofOffset.read(bytes)?,
            version: HeaderField::Version.read(bytes)?,
            gd3_offset: HeaderField::Gd3Offset.read(bytes)?,
            total_samples: HeaderField::TotalSamples.read(bytes)?,
            loop_offset: HeaderField::LoopOffset.read(bytes)?,
            loop_samples: HeaderField::LoopSamples.read(bytes)?,
            rate: HeaderField::Rate.read(bytes)?,
            data_start,
            nes_apu_clock: HeaderField::NesApuClock.read(bytes)?,
        })
    }

    /// Check the header against the byte stream it came from and return the clock.
    ///
    /// Checks, in order: EOF offset, version, global rate, clock flags and
    /// clock rate.
    pub fn validate(&self, len: usize) -> Result<ClockRate, FormatError> {
        let declared = self.eof_offset as usize + HeaderField::EofOffset.offset();
        if declared != len {
            return Err(FormatError::EofMismatch {
                declared,
                actual: len,
            });
        }
        if self.version != VGM_VERSION {
            return Err(FormatError::UnsupportedVersion(self.version));
        }
        if self.rate != 0 {
            return Err(FormatError::UnsupportedRate(self.rate));
        }
        let flags = self.nes_apu_clock & !CLOCK_MASK;
        if flags != 0 {
            return Err(FormatError::UnsupportedFeature(flags));
        }
        let hz = self.nes_apu_clock & CLOCK_MASK;
        ClockRate::new(hz).ok_or(FormatError::UnsupportedClock(hz))
    }
}

/// Read the command byte at `off`, naming the stream in errors.
pub(crate) fn command_byte(bytes: &[u8], off: usize) -> Result<u8, FormatError> {
    read_u8_at(bytes, off, "command")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_header() -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE + 1];
        bytes[0..4].copy_from_slice(VGM_IDENT);
        crate::binutil::write_u32(&mut bytes, 0x04, (HEADER_SIZE + 1 - 4) as u32);
        crate::binutil::write_u32(&mut bytes, 0x08, VGM_VERSION);
        crate::binutil::write_u32(&mut bytes, 0x34, (HEADER_SIZE - 0x34) as u32);
        crate::binutil::write_u32(&mut bytes, 0x84, 1_789_773);
        bytes[HEADER_SIZE] = 0x66;
        bytes
    }

    #[test]
    fn parse_blank_header() {
        let bytes = blank_header();
        let header = VgmHeader::parse(&bytes).unwrap();
        assert_eq!(header.data_start, HEADER_SIZE);
        assert_eq!(header.validate(bytes.len()), Ok(ClockRate::NTSC));
    }

    #[test]
    fn rejects_flags_and_clock() {
        let mut bytes = blank_header();
        crate::binutil::write_u32(&mut bytes, 0x84, 1_789_773 | CLOCK_FLAG_DUAL);
        let header = VgmHeader::parse(&bytes).unwrap();
        assert_eq!(
            header.validate(bytes.len()),
            Err(FormatError::UnsupportedFeature(CLOCK_FLAG_DUAL))
        );

        crate::binutil::write_u32(&mut bytes, 0x84, 3_579_545);
        let header = VgmHeader::parse(&bytes).unwrap();
        assert_eq!(
            header.validate(bytes.len()),
            Err(FormatError::UnsupportedClock(3_579_545))
        );
    }

    #[test]
    fn rejects_bad_ident_and_eof() {
        let mut bytes = blank_header();
        bytes[0] = b'X';
        assert!(matches!(
            VgmHeader::parse(&bytes),
            Err(FormatError::InvalidIdent(_))
        ));

        let bytes = blank_header();
        let header = VgmHeader::parse(&bytes).unwrap();
        assert!(matches!(
            header.validate(bytes.len() + 1),
            Err(FormatError::EofMismatch { .. })
        ));
    }

    #[test]
    fn short_fields_are_zero_extended() {
        let mut bytes = blank_header();
        bytes[0x7C] = 0x34;
        bytes[0x7D] = 0x12;
        assert_eq!(HeaderField::Volume.read(&bytes).unwrap(), 0x1234);
    }
}
