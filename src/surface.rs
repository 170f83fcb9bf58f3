use crate::config::StrokeStyle;
use crate::input::Point;
use crate::Error;
use png::{BitDepth, ColorType};

/// Display size of the surface in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalSize {
    pub width: u32,
    pub height: u32,
}

/// RGBA raster the signature is drawn on.
///
/// Coordinates given to the drawing functions are logical; they are multiplied by
/// `scale` so the raster stays crisp on high-density displays.
#[derive(Debug, Clone)]
pub struct Surface {
    /// Width in device pixels.
    width: u32,
    /// Height in device pixels.
    height: u32,
    scale: u32,
    /// 8 bit RGBA, row major. Empty until `configure` is called.
    pixels: Vec<u8>,
    color: [u8; 4],
    /// Line width in logical pixels.
    line_width: f64,
    has_content: bool,
}

impl Surface {
    pub fn new(style: &StrokeStyle) -> Result<Self, Error> {
        Ok(Surface {
            width: 0,
            height: 0,
            scale: 1,
            pixels: Vec::new(),
            color: style.rgba()?,
            line_width: style.width,
            has_content: false,
        })
    }

    /// Allocate the raster at `scale` times the logical size.
    ///
    /// Calling it again with a size that already fits is a no-op. A larger size
    /// grows the raster and keeps what was drawn. The scale cannot change once
    /// the raster is allocated.
    pub fn configure(&mut self, size: LogicalSize, scale: u32) -> Result<(), Error> {
        if size.width == 0 || size.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "surface size must be non-zero, got {}x{}",
                size.width, size.height
            )));
        }
        let width = size
            .width
            .checked_mul(scale)
            .ok_or_else(|| Error::InvalidConfig("surface width overflows".to_owned()))?;
        let height = size
            .height
            .checked_mul(scale)
            .ok_or_else(|| Error::InvalidConfig("surface height overflows".to_owned()))?;

        if self.is_allocated() {
            if self.scale != scale {
                return Err(Error::InvalidConfig(format!(
                    "surface scale is fixed at {} once allocated, got {}",
                    self.scale, scale
                )));
            }
            if self.width >= width && self.height >= height {
                return Ok(());
            }
        }

        let new_width = self.width.max(width);
        let new_height = self.height.max(height);
        let len = (new_width as usize)
            .checked_mul(new_height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "surface of {}x{} device pixels is too large",
                    new_width, new_height
                ))
            })?;

        // Growing keeps what was drawn: copy the old rows into the top-left corner.
        let mut pixels = vec![0u8; len];
        let old_row = self.width as usize * 4;
        let new_row = new_width as usize * 4;
        for (row, old) in self.pixels.chunks_exact(old_row.max(1)).enumerate() {
            pixels[row * new_row..row * new_row + old_row].copy_from_slice(old);
        }
        self.width = new_width;
        self.height = new_height;
        self.scale = scale;
        self.pixels = pixels;
        log::debug!(
            "Signature surface allocated at {}x{} (scale {}).",
            self.width,
            self.height,
            self.scale
        );
        Ok(())
    }

    pub fn is_allocated(&self) -> bool {
        !self.pixels.is_empty()
    }

    pub fn device_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    pub(crate) fn mark_content(&mut self) {
        self.has_content = true;
    }

    /// Draw a line from `from` to `to` with round caps.
    ///
    /// Consecutive segments share end points, which gives round joins.
    pub fn draw_segment(&mut self, from: Point, to: Point) {
        if !self.is_allocated() {
            return;
        }
        let scale = self.scale as f64;
        let (ax, ay) = (from.x * scale, from.y * scale);
        let (bx, by) = (to.x * scale, to.y * scale);
        let radius = self.line_width * scale / 2.0;

        // Clip the capsule bounding box to the raster.
        let min_x = (ax.min(bx) - radius).floor().max(0.0);
        let min_y = (ay.min(by) - radius).floor().max(0.0);
        let max_x = (ax.max(bx) + radius).ceil().min(self.width as f64);
        let max_y = (ay.max(by) + radius).ceil().min(self.height as f64);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        let (dx, dy) = (bx - ax, by - ay);
        let length_sq = dx * dx + dy * dy;
        let radius_sq = radius * radius;
        for py in min_y as u32..max_y as u32 {
            for px in min_x as u32..max_x as u32 {
                // Sample at the pixel center.
                let cx = px as f64 + 0.5;
                let cy = py as f64 + 0.5;
                let t = if length_sq == 0.0 {
                    0.0
                } else {
                    (((cx - ax) * dx + (cy - ay) * dy) / length_sq).clamp(0.0, 1.0)
                };
                let (nx, ny) = (ax + t * dx - cx, ay + t * dy - cy);
                if nx * nx + ny * ny <= radius_sq {
                    self.put_pixel(px, py);
                }
            }
        }
    }

    fn put_pixel(&mut self, x: u32, y: u32) {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[offset..offset + 4].copy_from_slice(&self.color);
    }

    /// Erase all drawn content. The allocation is kept.
    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|byte| *byte = 0);
        self.has_content = false;
        log::debug!("Signature surface cleared.");
    }

    /// True when no pixel has been painted.
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|pixel| pixel[3] == 0)
    }

    /// Serialize the raster as a lossless RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, Error> {
        if !self.is_allocated() {
            return Err(Error::SurfaceUnavailable);
        }
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(ColorType::Rgba);
            encoder.set_depth(BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
        }
        Ok(png_data)
    }
}
