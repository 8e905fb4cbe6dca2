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
use crate::pixel_format::{frame_size, tensor_size, upscaled_size};
use crate::{
    convert_tile_to_tensor, convert_to_tensor, upscale_bilinear, ErrorKind, PixelFormat, Rect,
    TensorLayout,
};

use log::debug;
use std::cmp;
use std::mem;
use std::slice;

/// Granularity of the region, a WebAssembly memory page
pub const PAGE_SIZE: usize = 64 * 1024;

const WORD_SIZE: usize = mem::size_of::<u32>();

fn round_up(x: usize, p: usize) -> Option<usize> {
    Some(x.checked_add(p - 1)? & !(p - 1))
}

/// Returns the output offset and the total size of a region holding frames
/// up to `max_dimension` x `max_dimension`
fn region_layout(max_dimension: u32) -> Option<(usize, usize)> {
    let max_area = (max_dimension as usize).checked_mul(max_dimension as usize)?;
    let input = round_up(frame_size(max_dimension, max_dimension)?, PAGE_SIZE)?;
    let output = max_area
        .checked_mul(TensorLayout::Chw.channels())?
        .checked_mul(mem::size_of::<f32>())?;
    let output = round_up(output, PAGE_SIZE)?;

    Some((input, input.checked_add(output)?))
}

/// Owns a memory region shared by input frames and output tensors.
///
/// Input bytes are stored at the start of the region, output elements at
/// [`output_offset`], far enough not to overlap the largest input. The region
/// grows on demand when a frame larger than the current maximum dimension
/// is requested; it never shrinks.
///
/// # Examples
/// ```
/// use yuv_tensor_primitives as ytp;
/// use ytp::{FrameConverter, PixelFormat, TensorLayout};
/// use std::error;
///
/// fn convert() -> Result<(), Box<dyn error::Error>> {
///     let mut converter = FrameConverter::new()?;
///
///     let input = converter.input_mut(640, 480)?;
///     input.fill(128);
///
///     converter.convert(640, 480, PixelFormat::I420, TensorLayout::Chw)?;
///     let tensor = converter.tensor(640, 480, TensorLayout::Chw)?;
///     assert!(tensor.iter().all(|&x| x == 128.0 / 255.0));
///
///     Ok(())
/// }
/// # convert().unwrap();
/// ```
///
/// [`output_offset`]: #method.output_offset
pub struct FrameConverter {
    max_dimension: u32,
    output_offset: usize,
    region: Vec<u32>,
}

impl FrameConverter {
    /// Maximum dimension supported by a newly created converter
    pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

    /// Creates a converter for frames up to 1920x1920
    ///
    /// # Errors
    ///
    /// * [`InvalidValue`] if the region size can not be represented
    ///
    /// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
    pub fn new() -> Result<Self, ErrorKind> {
        Self::with_max_dimension(Self::DEFAULT_MAX_DIMENSION)
    }

    /// Creates a converter for frames up to `max_dimension` x `max_dimension`
    ///
    /// # Errors
    ///
    /// * [`InvalidValue`] if the region size can not be represented
    ///
    /// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
    pub fn with_max_dimension(max_dimension: u32) -> Result<Self, ErrorKind> {
        let (output_offset, size) = region_layout(max_dimension).ok_or(ErrorKind::InvalidValue)?;

        Ok(FrameConverter {
            max_dimension,
            output_offset,
            region: vec![0; size / WORD_SIZE],
        })
    }

    /// Largest frame dimension the region can currently hold
    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Offset in bytes of the output area
    pub fn output_offset(&self) -> usize {
        self.output_offset
    }

    /// Size in bytes of the region
    pub fn region_size(&self) -> usize {
        self.region.len() * WORD_SIZE
    }

    /// Grows the region so that it can hold a `width` x `height` frame.
    ///
    /// The new maximum dimension is the largest of `width` and `height`, rounded up
    /// to a multiple of 4. Input bytes are preserved, the output area is not.
    ///
    /// # Errors
    ///
    /// * [`InvalidValue`] if the region size can not be represented
    ///
    /// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
    pub fn reserve(&mut self, width: u32, height: u32) -> Result<(), ErrorKind> {
        let max_area = u64::from(self.max_dimension) * u64::from(self.max_dimension);
        if u64::from(width) * u64::from(height) <= max_area {
            return Ok(());
        }

        let max_dimension = cmp::max(width, height)
            .checked_add(3)
            .ok_or(ErrorKind::InvalidValue)?
            & !3;
        let (output_offset, size) = region_layout(max_dimension).ok_or(ErrorKind::InvalidValue)?;

        debug!(
            "Growing frame region for {}x{}: max dimension {} -> {}, {} bytes",
            width, height, self.max_dimension, max_dimension, size
        );

        self.region.resize(size / WORD_SIZE, 0);
        self.max_dimension = max_dimension;
        self.output_offset = output_offset;
        Ok(())
    }

    fn split(&mut self) -> (&[u8], &mut [u32]) {
        let (input, output) = self.region.split_at_mut(self.output_offset / WORD_SIZE);
        let input =
            unsafe { slice::from_raw_parts(input.as_ptr().cast::<u8>(), input.len() * WORD_SIZE) };

        (input, output)
    }

    fn input_area_mut(&mut self) -> &mut [u8] {
        let input = &mut self.region[..self.output_offset / WORD_SIZE];
        let len = input.len() * WORD_SIZE;
        unsafe { slice::from_raw_parts_mut(input.as_mut_ptr().cast::<u8>(), len) }
    }

    fn output_floats(output: &mut [u32]) -> &mut [f32] {
        unsafe { slice::from_raw_parts_mut(output.as_mut_ptr().cast::<f32>(), output.len()) }
    }

    fn output_bytes(output: &mut [u32]) -> &mut [u8] {
        let len = output.len() * WORD_SIZE;
        unsafe { slice::from_raw_parts_mut(output.as_mut_ptr().cast::<u8>(), len) }
    }

    /// Writable view for the next 4:2:0 frame, `width * height * 3 / 2` bytes
    ///
    /// # Errors
    ///
    /// * [`InvalidValue`] if the region can not grow to hold the frame
    ///
    /// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
    pub fn input_mut(&mut self, width: u32, height: u32) -> Result<&mut [u8], ErrorKind> {
        self.reserve(width, height)?;
        let size = frame_size(width, height).ok_or(ErrorKind::InvalidValue)?;
        Ok(&mut self.input_area_mut()[..size])
    }

    /// Writable view for the next channel to upscale, `width * height` bytes
    ///
    /// # Errors
    ///
    /// * [`InvalidValue`] if the region can not grow to hold the channel
    ///
    /// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
    pub fn channel_input_mut(&mut self, width: u32, height: u32) -> Result<&mut [u8], ErrorKind> {
        self.reserve(width, height)?;
        let size = (width as usize) * (height as usize);
        Ok(&mut self.input_area_mut()[..size])
    }

    /// Readable view of the last tensor
    ///
    /// # Errors
    ///
    /// * [`NotEnoughData`] if the output area can not hold such a tensor
    ///
    /// [`NotEnoughData`]: ./enum.ErrorKind.html#variant.NotEnoughData
    pub fn tensor(
        &self,
        width: u32,
        height: u32,
        layout: TensorLayout,
    ) -> Result<&[f32], ErrorKind> {
        let size = tensor_size(width, height, layout).ok_or(ErrorKind::InvalidValue)?;
        let output = &self.region[self.output_offset / WORD_SIZE..];
        if size > output.len() {
            return Err(ErrorKind::NotEnoughData);
        }

        Ok(unsafe { slice::from_raw_parts(output.as_ptr().cast::<f32>(), size) })
    }

    /// Readable view of the last upscaled channel, `2 * width` x `2 * height` bytes
    ///
    /// # Errors
    ///
    /// * [`NotEnoughData`] if the output area can not hold such a channel
    ///
    /// [`NotEnoughData`]: ./enum.ErrorKind.html#variant.NotEnoughData
    pub fn upscaled(&self, width: u32, height: u32) -> Result<&[u8], ErrorKind> {
        let size = upscaled_size(width, height).ok_or(ErrorKind::InvalidValue)?;
        let output = &self.region[self.output_offset / WORD_SIZE..];
        if size > output.len() * WORD_SIZE {
            return Err(ErrorKind::NotEnoughData);
        }

        Ok(unsafe { slice::from_raw_parts(output.as_ptr().cast::<u8>(), size) })
    }

    /// Converts the frame in the input area, see [`convert_to_tensor`].
    ///
    /// `TensorLayout::Hw` reads the luma plane only, for both pixel formats.
    ///
    /// # Errors
    ///
    /// Same of [`convert_to_tensor`]
    ///
    /// [`convert_to_tensor`]: ./fn.convert_to_tensor.html
    pub fn convert(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        layout: TensorLayout,
    ) -> Result<(), ErrorKind> {
        self.reserve(width, height)?;
        let (input, output) = self.split();
        convert_to_tensor(width, height, format, input, layout, Self::output_floats(output))
    }

    /// Converts a tile of the frame in the input area, see [`convert_tile_to_tensor`].
    ///
    /// # Errors
    ///
    /// Same of [`convert_tile_to_tensor`]
    ///
    /// [`convert_tile_to_tensor`]: ./fn.convert_tile_to_tensor.html
    pub fn convert_tile(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        tile: &Rect,
        layout: TensorLayout,
    ) -> Result<(), ErrorKind> {
        self.reserve(width, height)?;
        let (input, output) = self.split();
        convert_tile_to_tensor(
            width,
            height,
            format,
            input,
            tile,
            layout,
            Self::output_floats(output),
        )
    }

    /// Upscales the channel in the input area, see [`upscale_bilinear`].
    ///
    /// # Errors
    ///
    /// Same of [`upscale_bilinear`]
    ///
    /// [`upscale_bilinear`]: ./fn.upscale_bilinear.html
    pub fn upscale(&mut self, width: u32, height: u32) -> Result<(), ErrorKind> {
        self.reserve(width, height)?;
        let (input, output) = self.split();
        upscale_bilinear(width, height, input, Self::output_bytes(output))
    }
}
