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
use crate::pixel_format::PixelFormat;

/// A rectangular region of a frame, in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct Rect {
    /// Horizontal offset of the top-left corner
    pub x: u32,
    /// Vertical offset of the top-left corner
    pub y: u32,
    /// Width of the region
    pub width: u32,
    /// Height of the region
    pub height: u32,
}

impl Rect {
    /// Creates a new region
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true when the region lies inside a `width` x `height` frame
    pub fn fits(&self, width: u32, height: u32) -> bool {
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

pub const Y_PLANE: usize = 0;
pub const U_PLANE: usize = 1;
pub const V_PLANE: usize = 2;

/// Addressing of a 4:2:0 image inside a linear buffer.
///
/// Offsets are in bytes from the start of the buffer. For interleaved chroma
/// (nv12) the u and v offsets point to the same row, v being one byte after u.
/// A view over a sub-region keeps the strides of the frame it was cropped from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameView {
    pub width: usize,
    pub height: usize,
    pub luma_stride: usize,
    pub chroma_stride: usize,
    pub planes: [usize; 3],
    pub interleaved: bool,
}

impl FrameView {
    /// Tightly packed frame, planes stored back to back
    pub fn new(pixel_format: PixelFormat, width: usize, height: usize) -> Self {
        let luma_len = width * height;
        let (chroma_stride, planes) = match pixel_format {
            PixelFormat::Nv12 => (width, [0, luma_len, luma_len + 1]),
            PixelFormat::I420 => (width / 2, [0, luma_len, luma_len + luma_len / 4]),
        };

        FrameView {
            width,
            height,
            luma_stride: width,
            chroma_stride,
            planes,
            interleaved: matches!(pixel_format, PixelFormat::Nv12),
        }
    }

    pub fn chroma_width(&self) -> usize {
        self.width / 2
    }

    pub fn chroma_height(&self) -> usize {
        self.height / 2
    }

    /// Sub-view covering `rect`.
    ///
    /// `rect.x` and `rect.y` must be even so that the region starts on a chroma sample.
    pub fn crop(&self, rect: &Rect) -> Self {
        let x = rect.x as usize;
        let y = rect.y as usize;
        let chroma_x = if self.interleaved { x } else { x >> 1 };
        let chroma_offset = chroma_x + (y >> 1) * self.chroma_stride;

        FrameView {
            width: rect.width as usize,
            height: rect.height as usize,
            luma_stride: self.luma_stride,
            chroma_stride: self.chroma_stride,
            planes: [
                self.planes[Y_PLANE] + x + y * self.luma_stride,
                self.planes[U_PLANE] + chroma_offset,
                self.planes[V_PLANE] + chroma_offset,
            ],
            interleaved: self.interleaved,
        }
    }
}
