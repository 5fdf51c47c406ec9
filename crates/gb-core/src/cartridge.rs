//! ROM header parsing and cartridge/MBC classification.

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeKind {
    RomOnly,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc5,
    Unknown(u8),
}

impl CartridgeKind {
    pub fn from_header_byte(b: u8) -> Self {
        match b {
            0x00 => CartridgeKind::RomOnly,
            0x01..=0x03 => CartridgeKind::Mbc1,
            0x05..=0x06 => CartridgeKind::Mbc2,
            0x0F..=0x13 => CartridgeKind::Mbc3,
            0x19..=0x1E => CartridgeKind::Mbc5,
            other => CartridgeKind::Unknown(other),
        }
    }

    /// Whether this kind switches 0x4000-0x7FFF banks via a write to 0x2000-0x3FFF.
    pub fn has_rom_banking(&self) -> bool {
        !matches!(self, CartridgeKind::RomOnly)
    }
}

/// Raw ROM data plus parsed header metadata.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub rom: Vec<u8>,
    pub kind: CartridgeKind,
    pub title: String,
    pub is_cgb: bool,
    pub rom_size_kb: u32,
    pub ram_size_kb: u32,
}

impl Cartridge {
    pub fn from_bytes(rom: Vec<u8>) -> Result<Self, CoreError> {
        if rom.len() < 0x150 {
            return Err(CoreError::InvalidRom("ROM too short to contain a valid header".into()));
        }
        let kind = CartridgeKind::from_header_byte(rom[0x147]);
        let title = String::from_utf8_lossy(&rom[0x134..0x143])
            .trim_matches('\0')
            .to_string();
        let is_cgb = rom[0x143] == 0x80 || rom[0x143] == 0xC0;
        let rom_size_kb = 32u32.checked_shl(rom[0x148] as u32).unwrap_or(32);
        let ram_size_kb = match rom[0x149] {
            0x02 => 8,
            0x03 => 32,
            0x04 => 128,
            0x05 => 64,
            _ => 0,
        };
        Ok(Cartridge { rom, kind, title, is_cgb, rom_size_kb, ram_size_kb })
    }

    pub fn rom_bank_count(&self) -> u16 {
        (self.rom.len() / 0x4000).max(1) as u16
    }
}
