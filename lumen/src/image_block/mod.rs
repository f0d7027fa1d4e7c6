//! Weighted accumulation buffer covering a window of the image plane.
//!
//! An [`ImageBlock`] stores one `Buffer2<f32>` plane per channel. Samples are
//! splatted through a [`ReconstructionFilter`]; blocks of identical shape are
//! merged by elementwise addition. The raw channel planes (including the
//! filter border) are what goes over the wire.
//!
//! # Coordinates
//!
//! Sample positions are continuous image-plane coordinates: pixel `(x, y)` of
//! the full frame spans `[x, x + 1) × [y, y + 1)`. A block with offset `o`
//! and size `s` covers pixels `o .. o + s`, plus `border` padding pixels on
//! every side so that footprints crossing the window edge are kept.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use arrayvec::ArrayVec;
use glam::{DVec3, IVec2, UVec2, Vec2, Vec3};

use crate::filter::ReconstructionFilter;
use common::buffer2::Buffer2;

/// RGB spectral value carried by a sample.
pub type Spectrum = Vec3;

/// Maximum number of channels (RGB + alpha + weight).
pub const MAX_CHANNELS: usize = 5;

/// Channel layout of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// R, G, B. Used by full-frame splat targets, which are never normalized
    /// by a weight.
    Spectrum,
    /// R, G, B, alpha, filter weight. Used by the rendered tile.
    SpectrumAlphaWeight,
}

impl PixelFormat {
    pub const fn channel_count(self) -> usize {
        match self {
            PixelFormat::Spectrum => 3,
            PixelFormat::SpectrumAlphaWeight => 5,
        }
    }

    pub const fn has_weight(self) -> bool {
        matches!(self, PixelFormat::SpectrumAlphaWeight)
    }

    /// Index of the weight channel, if any.
    pub const fn weight_channel(self) -> Option<usize> {
        match self {
            PixelFormat::Spectrum => None,
            PixelFormat::SpectrumAlphaWeight => Some(4),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Spectrum => write!(f, "spectrum"),
            PixelFormat::SpectrumAlphaWeight => write!(f, "spectrum+alpha+weight"),
        }
    }
}

/// Channel planes read from a stream but not yet installed into a block.
///
/// Produced by [`ImageBlock::read_payload`]; installing it with
/// [`ImageBlock::commit_payload`] cannot fail, which lets a caller read several
/// blocks and only touch them once every read has succeeded.
#[derive(Debug)]
pub struct StagedPayload {
    planes: ArrayVec<Vec<f32>, MAX_CHANNELS>,
}

/// Accumulation buffer for a rectangular window of the image plane.
#[derive(Debug, Clone)]
pub struct ImageBlock {
    format: PixelFormat,
    offset: IVec2,
    size: UVec2,
    border: u32,
    filter: Arc<ReconstructionFilter>,
    channels: ArrayVec<Buffer2<f32>, MAX_CHANNELS>,
}

impl ImageBlock {
    /// Create a zeroed block of `size` pixels at the image origin.
    pub fn new(format: PixelFormat, size: UVec2, filter: Arc<ReconstructionFilter>) -> Self {
        assert!(
            size.x > 0 && size.y > 0,
            "block size must be non-zero, got {}x{}",
            size.x,
            size.y
        );
        let border = filter.border_size();
        let channels = Self::allocate(format, size, border);

        Self {
            format,
            offset: IVec2::ZERO,
            size,
            border,
            filter,
            channels,
        }
    }

    fn allocate(
        format: PixelFormat,
        size: UVec2,
        border: u32,
    ) -> ArrayVec<Buffer2<f32>, MAX_CHANNELS> {
        let width = (size.x + 2 * border) as usize;
        let height = (size.y + 2 * border) as usize;
        (0..format.channel_count())
            .map(|_| Buffer2::new_default(width, height))
            .collect()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn offset(&self) -> IVec2 {
        self.offset
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn border_size(&self) -> u32 {
        self.border
    }

    pub fn filter(&self) -> &Arc<ReconstructionFilter> {
        &self.filter
    }

    /// Width and height of the stored planes, border included.
    pub fn storage_dimensions(&self) -> (usize, usize) {
        self.channels[0].dimensions()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Raw plane of channel `c`, border included.
    pub fn channel(&self, c: usize) -> &Buffer2<f32> {
        &self.channels[c]
    }

    /// Move the window. Contents are kept as-is; callers clear between work units.
    pub fn set_offset(&mut self, offset: IVec2) {
        self.offset = offset;
    }

    /// Resize the window. Planes are reallocated (zeroed) only when the size
    /// actually changes.
    pub fn set_size(&mut self, size: UVec2) {
        assert!(
            size.x > 0 && size.y > 0,
            "block size must be non-zero, got {}x{}",
            size.x,
            size.y
        );
        if size == self.size {
            return;
        }
        self.size = size;
        self.channels = Self::allocate(self.format, size, self.border);
    }

    /// Zero all channels without releasing storage.
    pub fn clear(&mut self) {
        for plane in self.channels.iter_mut() {
            plane.clear();
        }
    }

    /// Splat `value` at image-plane position `pos` with the given alpha.
    ///
    /// Returns `false` when nothing was deposited: the footprint missed the
    /// block, or the sample was not finite.
    pub fn put_sample(&mut self, pos: Vec2, value: Spectrum, alpha: f32) -> bool {
        if !pos.is_finite() || !value.is_finite() || !alpha.is_finite() {
            tracing::debug!(?pos, ?value, alpha, "Dropping non-finite sample");
            return false;
        }

        let mut sample = ArrayVec::<f32, MAX_CHANNELS>::new();
        sample.extend([value.x, value.y, value.z]);
        if self.format.has_weight() {
            sample.push(alpha);
            sample.push(1.0);
        }

        let border = self.border as f32;
        // Position relative to the stored plane, in pixel-center coordinates.
        let p = pos - (self.offset.as_vec2() - Vec2::splat(border)) - Vec2::splat(0.5);
        let radius = self.filter.radius();
        let (width, height) = self.storage_dimensions();

        let x_min = (p.x - radius).ceil().max(0.0);
        let y_min = (p.y - radius).ceil().max(0.0);
        let x_max = (p.x + radius).floor().min(width as f32 - 1.0);
        let y_max = (p.y + radius).floor().min(height as f32 - 1.0);
        if x_max < x_min || y_max < y_min {
            return false;
        }

        let (x_min, x_max) = (x_min as usize, x_max as usize);
        let (y_min, y_max) = (y_min as usize, y_max as usize);

        let mut deposited = false;
        for y in y_min..=y_max {
            let wy = self.filter.eval(y as f32 - p.y);
            if wy == 0.0 {
                continue;
            }
            for x in x_min..=x_max {
                let weight = self.filter.eval(x as f32 - p.x) * wy;
                if weight == 0.0 {
                    continue;
                }
                for (plane, &v) in self.channels.iter_mut().zip(sample.iter()) {
                    plane.add_at(x, y, v * weight);
                }
                deposited = true;
            }
        }
        deposited
    }

    /// Merge `other` into this block by elementwise addition.
    ///
    /// # Panics
    ///
    /// Panics if the blocks differ in format, size, border or offset.
    pub fn put(&mut self, other: &ImageBlock) {
        self.assert_same_shape(other);
        for (dst, src) in self.channels.iter_mut().zip(other.channels.iter()) {
            dst.accumulate(src);
        }
    }

    /// Panics with a descriptive message unless `other` has the same layout.
    pub fn assert_same_shape(&self, other: &ImageBlock) {
        assert_eq!(self.format, other.format, "block pixel format mismatch");
        assert_eq!(self.size, other.size, "block size mismatch");
        assert_eq!(self.border, other.border, "block border mismatch");
        assert_eq!(self.offset, other.offset, "block offset mismatch");
    }

    /// Channel values of interior pixel `(x, y)`, relative to the window origin.
    pub fn pixel(&self, x: u32, y: u32) -> ArrayVec<f32, MAX_CHANNELS> {
        assert!(
            x < self.size.x && y < self.size.y,
            "pixel ({}, {}) outside block of size {}x{}",
            x,
            y,
            self.size.x,
            self.size.y
        );
        let (sx, sy) = ((x + self.border) as usize, (y + self.border) as usize);
        self.channels.iter().map(|plane| plane[(sx, sy)]).collect()
    }

    /// Spectral part of interior pixel `(x, y)`.
    pub fn spectrum_at(&self, x: u32, y: u32) -> Spectrum {
        let px = self.pixel(x, y);
        Vec3::new(px[0], px[1], px[2])
    }

    /// Accumulated filter weight of interior pixel `(x, y)`, for weighted formats.
    pub fn weight_at(&self, x: u32, y: u32) -> Option<f32> {
        self.format
            .weight_channel()
            .map(|c| self.pixel(x, y)[c])
    }

    /// Sum of the spectral channels over the whole plane, border included.
    pub fn total_value(&self) -> DVec3 {
        let sum = |c: usize| -> f64 { self.channels[c].iter().map(|&v| v as f64).sum() };
        DVec3::new(sum(0), sum(1), sum(2))
    }

    /// Sum of the weight channel over the whole plane, for weighted formats.
    pub fn total_weight(&self) -> Option<f64> {
        self.format
            .weight_channel()
            .map(|c| self.channels[c].iter().map(|&v| v as f64).sum())
    }

    /// True when every spectral channel is zero.
    pub fn is_black(&self) -> bool {
        self.channels[..3]
            .iter()
            .all(|plane| plane.iter().all(|&v| v == 0.0))
    }

    /// Exact number of bytes written by [`ImageBlock::save`].
    pub fn payload_len(&self) -> usize {
        let (width, height) = self.storage_dimensions();
        self.channels.len() * width * height * std::mem::size_of::<f32>()
    }

    /// Write the raw channel planes as little-endian `f32`, channel by channel.
    /// No header: the reader must already know the block's shape.
    pub fn save<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        for plane in self.channels.iter() {
            write_f32_le(writer, plane.pixels())?;
        }
        Ok(())
    }

    /// Read one payload shaped like this block without modifying it.
    pub fn read_payload<R: Read + ?Sized>(&self, reader: &mut R) -> io::Result<StagedPayload> {
        let (width, height) = self.storage_dimensions();
        let mut planes = ArrayVec::new();
        for _ in 0..self.channels.len() {
            let mut data = vec![0.0f32; width * height];
            read_f32_le(reader, &mut data)?;
            planes.push(data);
        }
        Ok(StagedPayload { planes })
    }

    /// Install a payload produced by [`ImageBlock::read_payload`] on a block of
    /// the same shape.
    pub fn commit_payload(&mut self, payload: StagedPayload) {
        assert_eq!(
            payload.planes.len(),
            self.channels.len(),
            "payload channel count mismatch"
        );
        for (plane, data) in self.channels.iter_mut().zip(payload.planes) {
            plane.replace_pixels(data);
        }
    }

    /// Replace the contents with a payload read from `reader`. On error the
    /// block is left unchanged.
    pub fn load<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<()> {
        let payload = self.read_payload(reader)?;
        self.commit_payload(payload);
        Ok(())
    }

    /// Interior pixels as an RGB float image, each value multiplied by `scale`.
    /// Weighted formats are normalized by the accumulated filter weight.
    pub fn to_rgb32f(&self, scale: f32) -> image::Rgb32FImage {
        let border = self.border as usize;
        let weight_channel = self.format.weight_channel();
        image::ImageBuffer::from_fn(self.size.x, self.size.y, |x, y| {
            let (sx, sy) = (x as usize + border, y as usize + border);
            let norm = match weight_channel {
                Some(c) => {
                    let w = self.channels[c][(sx, sy)];
                    if w > 0.0 { 1.0 / w } else { 0.0 }
                }
                None => 1.0,
            };
            let k = scale * norm;
            image::Rgb([
                self.channels[0][(sx, sy)] * k,
                self.channels[1][(sx, sy)] * k,
                self.channels[2][(sx, sy)] * k,
            ])
        })
    }
}

impl fmt::Display for ImageBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageBlock[offset=({}, {}), size={}x{}, border={}, format={}]",
            self.offset.x, self.offset.y, self.size.x, self.size.y, self.border, self.format
        )
    }
}

fn write_f32_le<W: Write + ?Sized>(writer: &mut W, data: &[f32]) -> io::Result<()> {
    if cfg!(target_endian = "little") {
        writer.write_all(bytemuck::cast_slice(data))
    } else {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        writer.write_all(&bytes)
    }
}

fn read_f32_le<R: Read + ?Sized>(reader: &mut R, out: &mut [f32]) -> io::Result<()> {
    reader.read_exact(bytemuck::cast_slice_mut(out))?;
    if cfg!(target_endian = "big") {
        for v in out.iter_mut() {
            *v = f32::from_bits(u32::from_le(v.to_bits()));
        }
    }
    Ok(())
}
