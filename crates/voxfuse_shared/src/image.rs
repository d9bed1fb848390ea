//! Row-major images for depth, color and mask frames.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// An 8-bit RGB color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// Black
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a color from channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as floats, in `0..=255`.
    #[inline]
    #[must_use]
    pub fn to_f32(self) -> [f32; 3] {
        [f32::from(self.r), f32::from(self.g), f32::from(self.b)]
    }

    /// Rounds and saturates float channels back into a color.
    #[inline]
    #[must_use]
    pub fn from_f32(channels: [f32; 3]) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let quantize = |c: f32| c.round().clamp(0.0, 255.0) as u8;
        Self::new(
            quantize(channels[0]),
            quantize(channels[1]),
            quantize(channels[2]),
        )
    }
}

/// A dense 2D image stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<P> {
    rows: usize,
    cols: usize,
    data: Vec<P>,
}

/// Metric depth image; non-positive pixels are invalid.
pub type DepthImage = Image<f32>;

/// RGB color image.
pub type ColorImage = Image<Color>;

/// Single-channel 8-bit image. Used for masks: 0 = unmasked.
pub type MonoImage = Image<u8>;

impl<P: Copy + Default> Image<P> {
    /// Creates an image filled with `P::default()`.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, P::default())
    }

    /// Creates an image with every pixel set to `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: P) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Builds an image by evaluating `f(row, col)` for every pixel.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> P) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(row, col));
            }
        }
        Self { rows, cols, data }
    }

    /// Wraps row-major pixel data. Returns `None` if the length is wrong.
    #[must_use]
    pub fn from_vec(rows: usize, cols: usize, data: Vec<P>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total pixel count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-sized image
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Pixel at `(row, col)`, or `None` out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<P> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Sets the pixel at `(row, col)`. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: P) {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = value;
        }
    }

    /// Resets every pixel to `P::default()`.
    pub fn set_zero(&mut self) {
        self.data.fill(P::default());
    }

    /// Row-major pixel slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[P] {
        &self.data
    }
}

impl DepthImage {
    /// Largest valid (positive, finite) depth, or `None` if no pixel is valid.
    #[must_use]
    pub fn max_valid_depth(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|d| d.is_finite() && *d > 0.0)
            .reduce(f32::max)
    }
}
