//! Framebuffer capture: the host side of the profiling core's
//! `capture_framebuffer` collaborator contract. Writes the DMG's 2-bit
//! shade indices out as grayscale PNGs, named by frame number per
//! SPEC_FULL.md's capture-file-naming convention.

use crate::error::CliError;
use gb_core::{GbCore, LCD_HEIGHT, LCD_WIDTH};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// DMG shade palette, lightest to darkest, as 8-bit grayscale.
const SHADES: [u8; 4] = [0xFF, 0xAA, 0x55, 0x00];

pub fn write_frame_png(core: &GbCore, dir: &Path, frame_number: u64) -> Result<PathBuf, CliError> {
    std::fs::create_dir_all(dir).map_err(|e| CliError::Write { path: dir.to_path_buf(), source: e })?;
    let filename = format!("frame-{frame_number}.png");
    let path = dir.join(&filename);

    let file = File::create(&path).map_err(|e| CliError::Write { path: path.clone(), source: e })?;
    let writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, LCD_WIDTH as u32, LCD_HEIGHT as u32);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer =
        encoder.write_header().map_err(|e| CliError::Png { path: path.clone(), source: e })?;

    let pixels: Vec<u8> = core.bus.ppu.framebuffer.iter().map(|&idx| SHADES[idx as usize & 0x3]).collect();
    writer
        .write_image_data(&pixels)
        .map_err(|e| CliError::Png { path: path.clone(), source: e })?;

    Ok(PathBuf::from(filename))
}
