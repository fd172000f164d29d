use crate::error::TilekilnError;

/// Drawable surface owned by the caller that a rendered tile can be written into.
pub trait TileCanvas: Send {
    /// Width of the surface in pixels.
    fn width(&self) -> u32;
    /// Height of the surface in pixels.
    fn height(&self) -> u32;
    /// Replaces the pixels of the surface with straight RGBA8 data of the surface size.
    fn put_image_data(&mut self, rgba: &[u8]) -> Result<(), TilekilnError>;
}

/// In-memory RGBA canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelCanvas {
    /// Creates a transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Pixels of the canvas, row by row.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the canvas and returns its pixels.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Color of a single pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

impl TileCanvas for PixelCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn put_image_data(&mut self, rgba: &[u8]) -> Result<(), TilekilnError> {
        if rgba.len() != self.data.len() {
            return Err(TilekilnError::Generic(format!(
                "expected {} bytes of pixel data for a {}x{} canvas, got {}",
                self.data.len(),
                self.width,
                self.height,
                rgba.len()
            )));
        }

        self.data.copy_from_slice(rgba);
        Ok(())
    }
}
