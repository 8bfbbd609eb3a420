//! Grayscale sample grids.

use crate::error::{Result, VqError};

/// A rectangular grid of 8-bit grayscale intensities, stored row-major.
///
/// Zero-sized grids are allowed; they simply partition into no blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    samples: Vec<u8>,
}

impl Grid {
    /// Create a `width x height` grid filled with zeros.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    /// Create a `width x height` grid with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            samples: vec![value; width * height],
        }
    }

    /// Wrap a row-major sample buffer.
    ///
    /// Fails if `samples.len() != width * height`.
    pub fn from_samples(width: usize, height: usize, samples: Vec<u8>) -> Result<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            VqError::InvalidParameter(format!("grid {width}x{height} overflows usize"))
        })?;
        if samples.len() != expected {
            return Err(VqError::DimensionMismatch {
                expected: format!("{expected} samples ({width}x{height})"),
                actual: format!("{} samples", samples.len()),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every position.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut samples = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            samples,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Sample at column `x`, row `y`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < self.width && y < self.height);
        self.samples[y * self.width + x]
    }

    /// Overwrite the sample at column `x`, row `y`. Panics when out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        debug_assert!(x < self.width && y < self.height);
        self.samples[y * self.width + x] = value;
    }

    /// Row-major samples.
    #[inline]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
