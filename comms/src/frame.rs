use std::io;

/// The kind byte that leads every classification map frame.
pub const MAP_FRAME_KIND: u8 = 0x01;

/// Kind byte plus width and height, both `u16` little endian.
pub const FRAME_HEADER_SIZE: usize = 5;

/// A rendered classification map: `width * height` row-major RGB triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFrame {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl MapFrame {
    /// Creates a new `MapFrame`.
    ///
    /// # Arguments
    /// * `width` - The amount of grid cells per row.
    /// * `height` - The amount of rows.
    /// * `pixels` - The row-major RGB bytes of every cell.
    ///
    /// # Returns
    /// An error if `pixels` doesn't hold exactly three bytes per cell.
    pub fn new(width: u16, height: u16, pixels: Vec<u8>) -> io::Result<Self> {
        let expected = Self::pixels_len(width, height);

        if pixels.len() != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "map frame of {width}x{height} needs {expected} pixel bytes, got {}",
                    pixels.len()
                ),
            ));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the RGB triple of the cell at column `x` and row `y`, if inside the grid.
    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// Encodes this frame into its binary wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + self.pixels.len());
        buf.push(MAP_FRAME_KIND);
        buf.extend_from_slice(&self.width.to_le_bytes());
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.pixels);
        buf
    }

    /// Decodes a frame from its binary wire form.
    ///
    /// # Returns
    /// An io error of kind `InvalidData` if the buffer is truncated, too long or isn't a map frame.
    pub fn decode(buf: &[u8]) -> io::Result<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "the given buffer is too small {}, must at least be {FRAME_HEADER_SIZE} bytes",
                    buf.len()
                ),
            ));
        }

        if buf[0] != MAP_FRAME_KIND {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("received an invalid kind byte {}", buf[0]),
            ));
        }

        let width = u16::from_le_bytes([buf[1], buf[2]]);
        let height = u16::from_le_bytes([buf[3], buf[4]]);
        Self::new(width, height, buf[FRAME_HEADER_SIZE..].to_vec())
    }

    fn pixels_len(width: u16, height: u16) -> usize {
        width as usize * height as usize * 3
    }
}
