//! Palette image codec
//!
//! An image travels as a palette table followed by a bit-packed stream of
//! palette indices:
//!
//! ```text
//! ┌─────────┬──────────────────────┬──────────────────────────────┐
//! │ n (u8)  │ n × (r, g, b)        │ indices, bpp bits each       │
//! └─────────┴──────────────────────┴──────────────────────────────┘
//! ```
//!
//! `bpp = max(1, ceil(log2(n)))`. Each index is written least significant
//! bit first, and the resulting bit stream fills every byte starting at its
//! least significant bit. The last byte is padded with zero high bits.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::command::Rgb;
use crate::error::ImageError;
use crate::protocol::display::{HEIGHT, PIXEL_COUNT, WIDTH};

/// Bits needed to index every entry of a palette with `palette_len` colors
///
/// Never less than 1, even for a single-color palette.
pub fn bits_per_pixel(palette_len: usize) -> usize {
    if palette_len <= 2 {
        1
    } else {
        (usize::BITS - (palette_len - 1).leading_zeros()) as usize
    }
}

// =============================================================================
// Palette
// =============================================================================

/// Ordered set of distinct colors referenced by index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    /// Read consecutive RGB triples; a trailing partial triple is dropped
    pub fn from_bytes(data: &[u8]) -> Self {
        let chunks = data.chunks_exact(3);
        if !chunks.remainder().is_empty() {
            warn!(
                "palette table has {} trailing bytes, ignoring",
                chunks.remainder().len()
            );
        }
        Self {
            colors: chunks.map(|c| Rgb::new(c[0], c[1], c[2])).collect(),
        }
    }

    /// Palette table as sent on the wire: count byte then RGB triples
    ///
    /// The count byte wraps at 256, as the firmware expects.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 3 * self.colors.len());
        out.push(self.colors.len() as u8);
        for color in &self.colors {
            out.extend_from_slice(&color.to_bytes());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn bits_per_pixel(&self) -> usize {
        bits_per_pixel(self.colors.len())
    }
}

// =============================================================================
// Pixel grid
// =============================================================================

/// Row-major grid of the display's fixed dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    pixels: Vec<Rgb>,
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::filled(Rgb::BLACK)
    }
}

impl PixelGrid {
    pub const WIDTH: usize = WIDTH;
    pub const HEIGHT: usize = HEIGHT;

    /// All-black grid
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filled(color: Rgb) -> Self {
        Self {
            pixels: vec![color; PIXEL_COUNT],
        }
    }

    /// Grid from exactly `WIDTH * HEIGHT` row-major pixels
    pub fn from_pixels(pixels: Vec<Rgb>) -> Result<Self, ImageError> {
        if pixels.len() != PIXEL_COUNT {
            return Err(ImageError::SizeMismatch {
                expected: PIXEL_COUNT,
                got: pixels.len(),
            });
        }
        Ok(Self { pixels })
    }

    /// Grid from packed `0xRRGGBB` values
    pub fn from_packed(colors: &[u32]) -> Result<Self, ImageError> {
        Self::from_pixels(colors.iter().map(|&c| Rgb::from_packed(c)).collect())
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }
        Some(self.pixels[y * WIDTH + x])
    }

    /// Set one pixel; returns false if the coordinates are off the grid
    pub fn set(&mut self, x: usize, y: usize, color: Rgb) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        self.pixels[y * WIDTH + x] = color;
        true
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.pixels.chunks(WIDTH)
    }

    pub fn to_packed(&self) -> Vec<u32> {
        self.pixels.iter().map(|c| c.to_packed()).collect()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Palette-encoded image, ready to be put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub palette: Palette,
    /// Per-pixel palette index, row-major
    pub indices: Vec<usize>,
    /// Bit-packed `indices`
    pub stream: Vec<u8>,
}

impl EncodedImage {
    pub fn from_grid(grid: &PixelGrid) -> Self {
        encode_rgb(grid.pixels().iter().copied())
    }

    pub fn bits_per_pixel(&self) -> usize {
        self.palette.bits_per_pixel()
    }

    /// Palette table followed by the index stream
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = self.palette.to_bytes();
        out.extend_from_slice(&self.stream);
        out
    }
}

/// Encode packed `0xRRGGBB` colors; bits above 24 are ignored
///
/// Palette indices are assigned in order of first appearance.
pub fn encode_colors(colors: &[u32]) -> Result<EncodedImage, ImageError> {
    if colors.is_empty() {
        return Err(ImageError::EmptyImage);
    }
    Ok(encode_rgb(colors.iter().map(|&c| Rgb::from_packed(c))))
}

fn encode_rgb(colors: impl Iterator<Item = Rgb>) -> EncodedImage {
    let mut lookup: HashMap<Rgb, usize> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::new();

    for color in colors {
        let index = *lookup.entry(color).or_insert_with(|| {
            palette.push(color);
            palette.len() - 1
        });
        indices.push(index);
    }

    if palette.len() > 256 {
        warn!(
            "{} distinct colors, the palette count byte will wrap",
            palette.len()
        );
    }

    let palette = Palette::new(palette);
    let stream = pack_indices(&indices, palette.bits_per_pixel());
    EncodedImage {
        palette,
        indices,
        stream,
    }
}

/// Pack indices LSB-first into bytes that fill from their low bit up
///
/// Equivalent to writing every index as a reversed `bpp`-bit string,
/// concatenating, cutting into 8-bit groups and reading each group
/// reversed as a byte.
pub fn pack_indices(indices: &[usize], bpp: usize) -> Vec<u8> {
    let mut out = vec![0u8; (indices.len() * bpp).div_ceil(8)];
    let mut bit = 0;
    for &index in indices {
        for b in 0..bpp {
            if (index >> b) & 1 == 1 {
                out[bit / 8] |= 1 << (bit % 8);
            }
            bit += 1;
        }
    }
    out
}

/// Build the complete SET_BOX_COLOR frame for a color sequence
pub fn image_packet(colors: &[u32]) -> Result<Vec<u8>, ImageError> {
    use crate::command::{PixooCommand, SetBoxImage};

    Ok(SetBoxImage(encode_colors(colors)?).build())
}

// =============================================================================
// Decoding
// =============================================================================

fn bit_at(payload: &[u8], pos: usize) -> usize {
    usize::from((payload[pos / 8] >> (pos % 8)) & 1)
}

fn dump_rows(payload: &[u8], bpp: usize) {
    let bits: String = (0..payload.len() * 8)
        .map(|pos| if bit_at(payload, pos) == 1 { '1' } else { '0' })
        .collect();
    for (y, row) in bits.as_bytes().chunks(bpp * WIDTH).enumerate() {
        let cells: Vec<&str> = row
            .chunks(bpp)
            .map(|cell| std::str::from_utf8(cell).unwrap_or("?"))
            .collect();
        trace!("row {:2}: {}", y, cells.join(" "));
    }
}

/// Unpack an index stream against a palette
///
/// Out-of-range indices leave their pixel black. Data past the last row is
/// ignored.
pub fn decode_pixels(palette: &Palette, payload: &[u8]) -> PixelGrid {
    let bpp = palette.bits_per_pixel();
    let total_bits = payload.len() * 8;

    if tracing::enabled!(tracing::Level::TRACE) {
        dump_rows(payload, bpp);
    }

    let mut grid = PixelGrid::new();
    let mut pos = 0;
    for pixel in 0..PIXEL_COUNT {
        if pos + bpp > total_bits {
            debug!(
                "image data ends after {} of {} pixels",
                pixel, PIXEL_COUNT
            );
            break;
        }
        let index = (0..bpp).fold(0, |acc, b| acc | bit_at(payload, pos + b) << b);
        pos += bpp;

        match palette.get(index) {
            Some(color) => {
                grid.set(pixel % WIDTH, pixel / WIDTH, color);
            }
            None => warn!(
                "tried to set color index {} on palette of {} colors",
                index,
                palette.len()
            ),
        }
    }

    let leftover = total_bits.saturating_sub(pos);
    if leftover >= 8 {
        info!("got extra data after image: {} bits", leftover);
    } else if leftover > 0 {
        trace!("{} padding bits after image", leftover);
    }

    grid
}

/// Palette and image recovered from captured traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub palette: Palette,
    pub image: PixelGrid,
}

impl DecodedImage {
    /// Decode a raw palette (RGB triples, no count byte) and index stream
    pub fn decode(palette_bytes: &[u8], payload: &[u8]) -> Self {
        let palette = Palette::from_bytes(palette_bytes);
        let image = decode_pixels(&palette, payload);
        Self { palette, image }
    }
}
