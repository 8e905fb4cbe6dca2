// Copyright 2019 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

// Permission is hereby granted, free of charge, to any person obtaining a copy of this
// software and associated documentation files (the "Software"), to deal in the Software
// without restriction, including without limitation the rights to use, copy, modify,
// merge, publish, distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED,
// INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A
// PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT
// HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE
// SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
use core::fmt;

/// An enumeration of supported source pixel formats.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C)]
pub enum PixelFormat {
    /// YUV with one luma plane Y then U chroma plane and last the V chroma plane.
    /// The two chroma planes are sub-sampled in both the horizontal and vertical dimensions
    /// by a factor of 2.
    ///
    /// 12 bits per pixel
    I420,
    /// YUV with one luma plane Y then one plane with U and V values interleaved.
    /// Chroma planes are subsampled in both the horizontal and vertical dimensions
    /// by a factor of 2.
    ///
    /// 12 bits per pixel
    Nv12,
}

impl PixelFormat {
    /// Frame and tile widths must be a multiple of this value to produce a chw tensor
    pub(crate) const fn width_alignment(self) -> u32 {
        match self {
            PixelFormat::I420 => 8,
            PixelFormat::Nv12 => 4,
        }
    }
}

impl fmt::Display for PixelFormat {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PixelFormat::I420 => write!(f, "i420"),
            PixelFormat::Nv12 => write!(f, "nv12"),
        }
    }
}

/// An enumeration of supported tensor layouts.
///
/// Each element of a tensor is a `f32` in the range `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C)]
pub enum TensorLayout {
    /// Single channel, the luma plane only.
    ///
    /// `height * width` elements, row-major
    Hw,
    /// Channel-major planar layout: Y, then U, then V.
    /// Chroma channels are upsampled to the luma resolution.
    ///
    /// `3 * height * width` elements
    Chw,
}

impl TensorLayout {
    pub(crate) const fn channels(self) -> usize {
        match self {
            TensorLayout::Hw => 1,
            TensorLayout::Chw => 3,
        }
    }
}

impl fmt::Display for TensorLayout {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TensorLayout::Hw => write!(f, "hw"),
            TensorLayout::Chw => write!(f, "chw"),
        }
    }
}

fn area(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

/// Number of bytes of a tightly packed 4:2:0 frame
pub fn frame_size(width: u32, height: u32) -> Option<usize> {
    let luma_len = area(width, height)?;
    luma_len.checked_add(luma_len / 2)
}

/// Number of `f32` elements of a tensor
pub fn tensor_size(width: u32, height: u32, layout: TensorLayout) -> Option<usize> {
    area(width, height)?.checked_mul(layout.channels())
}

/// Number of bytes produced by the 2x channel upscaler
pub fn upscaled_size(width: u32, height: u32) -> Option<usize> {
    area(width, height)?.checked_mul(4)
}

/// Checks the frame dimensions against the requirements of the kernels
pub fn is_compatible(
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
    layout: TensorLayout,
) -> bool {
    let aligned = match layout {
        TensorLayout::Hw => true,
        TensorLayout::Chw => width % pixel_format.width_alignment() == 0,
    };

    (width & 1) == 0 && (height & 1) == 0 && aligned
}

/// Checks a tile against its frame.
///
/// Tiles must start on a chroma sample, the horizontal offset also being
/// a multiple of 4. Their size follows the same rules of frames, while the
/// frame itself only needs even dimensions.
pub fn is_tile_compatible(
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
    tile: &crate::Rect,
    layout: TensorLayout,
) -> bool {
    is_compatible(pixel_format, width, height, TensorLayout::Hw)
        && is_compatible(pixel_format, tile.width, tile.height, layout)
        && (tile.x & 3) == 0
        && (tile.y & 1) == 0
        && tile.fits(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rect;

    #[test]
    fn sizes() {
        assert_eq!(frame_size(1920, 1080), Some(1920 * 1080 * 3 / 2));
        assert_eq!(tensor_size(1920, 1080, TensorLayout::Hw), Some(1920 * 1080));
        assert_eq!(tensor_size(1920, 1080, TensorLayout::Chw), Some(3 * 1920 * 1080));
        assert_eq!(upscaled_size(17, 3), Some(4 * 17 * 3));
    }

    #[test]
    fn alignment() {
        assert!(is_compatible(PixelFormat::Nv12, 4, 2, TensorLayout::Chw));
        assert!(!is_compatible(PixelFormat::I420, 4, 2, TensorLayout::Chw));
        assert!(is_compatible(PixelFormat::I420, 4, 2, TensorLayout::Hw));
        assert!(is_compatible(PixelFormat::I420, 8, 2, TensorLayout::Chw));
        assert!(!is_compatible(PixelFormat::Nv12, 6, 2, TensorLayout::Chw));
        assert!(!is_compatible(PixelFormat::Nv12, 8, 3, TensorLayout::Hw));
    }

    #[test]
    fn tiles() {
        let layout = TensorLayout::Chw;
        let tile = Rect::new(4, 2, 8, 2);
        assert!(is_tile_compatible(PixelFormat::I420, 16, 4, &tile, layout));
        assert!(!is_tile_compatible(PixelFormat::I420, 16, 4, &Rect::new(2, 2, 8, 2), layout));
        assert!(!is_tile_compatible(PixelFormat::I420, 16, 4, &Rect::new(4, 1, 8, 2), layout));
        assert!(!is_tile_compatible(PixelFormat::I420, 16, 4, &Rect::new(12, 2, 8, 2), layout));
        assert!(!is_tile_compatible(PixelFormat::I420, 16, 4, &Rect::new(4, 2, 8, 4), layout));
        assert!(!is_tile_compatible(PixelFormat::I420, 16, 4, &Rect::new(4, 2, 4, 2), layout));
        assert!(is_tile_compatible(PixelFormat::Nv12, 12, 4, &Rect::new(4, 2, 4, 2), layout));
        assert!(is_tile_compatible(PixelFormat::I420, 18, 4, &Rect::new(8, 0, 8, 4), layout));
    }
}
