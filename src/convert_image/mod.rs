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
use crate::frame::{FrameView, U_PLANE, V_PLANE, Y_PLANE};
use core::ptr;

pub mod common;
pub mod x86;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod sse2;

#[cfg(target_arch = "aarch64")]
pub mod neon;

#[cfg(all(target_arch = "wasm32", target_feature = "simd128"))]
pub mod simd128;

/// Row primitives every instruction set provides.
///
/// Implementations handle any `count`: the part that does not fill a vector
/// is processed by the scalar reference in [`x86`].
pub trait Kernels {
    /// Writes `count` samples of `src` as floats in the range `[0, 1]`
    unsafe fn normalize(src: *const u8, dst: *mut f32, count: usize);

    /// Normalizes `count` chroma samples, writing each of them to two adjacent
    /// columns of `dst`
    unsafe fn upsample(src: *const u8, dst: *mut f32, count: usize);

    /// Splits `count` interleaved u/v pairs, upsampling them horizontally like
    /// [`Kernels::upsample`]
    unsafe fn deinterleave_upsample(src: *const u8, u: *mut f32, v: *mut f32, count: usize);

    /// Upscales one row of `width` samples into two rows of `2 * width` samples.
    ///
    /// `bottom` is the next source row, or `top` itself on the last row.
    unsafe fn upscale_row(
        top: *const u8,
        bottom: *const u8,
        dst0: *mut u8,
        dst1: *mut u8,
        width: usize,
    );
}

/// Copies a finished output row onto the next one.
///
/// 4:2:0 chroma is constant over each 2x2 block, so the second row of every
/// block is identical to the first.
#[inline(always)]
unsafe fn double_row(row: *mut f32, width: usize) {
    ptr::copy_nonoverlapping(row, row.add(width), width);
}

pub unsafe fn y_to_hw<K: Kernels>(src: *const u8, dst: *mut f32, count: usize) {
    K::normalize(src, dst, count);
}

/// Luma channel of `frame` as a `height x width` tensor
pub unsafe fn luma_to_hw<K: Kernels>(src: *const u8, dst: *mut f32, frame: &FrameView) {
    let mut input = src.add(frame.planes[Y_PLANE]);
    let mut output = dst;
    for _ in 0..frame.height {
        K::normalize(input, output, frame.width);
        input = input.add(frame.luma_stride);
        output = output.add(frame.width);
    }
}

pub unsafe fn nv12_to_chw<K: Kernels>(src: *const u8, dst: *mut f32, frame: &FrameView) {
    luma_to_hw::<K>(src, dst, frame);

    let width = frame.width;
    let channel_len = width * frame.height;
    let mut input = src.add(frame.planes[U_PLANE]);
    let mut u = dst.add(channel_len);
    let mut v = dst.add(2 * channel_len);
    for _ in 0..frame.chroma_height() {
        K::deinterleave_upsample(input, u, v, frame.chroma_width());
        double_row(u, width);
        double_row(v, width);

        input = input.add(frame.chroma_stride);
        u = u.add(2 * width);
        v = v.add(2 * width);
    }
}

pub unsafe fn i420_to_chw<K: Kernels>(src: *const u8, dst: *mut f32, frame: &FrameView) {
    luma_to_hw::<K>(src, dst, frame);

    let width = frame.width;
    let channel_len = width * frame.height;
    for (channel, &plane) in [U_PLANE, V_PLANE].iter().enumerate() {
        let mut input = src.add(frame.planes[plane]);
        let mut output = dst.add((channel + 1) * channel_len);
        for _ in 0..frame.chroma_height() {
            K::upsample(input, output, frame.chroma_width());
            double_row(output, width);

            input = input.add(frame.chroma_stride);
            output = output.add(2 * width);
        }
    }
}

pub unsafe fn upscale_bilinear<K: Kernels>(
    src: *const u8,
    dst: *mut u8,
    width: usize,
    height: usize,
) {
    let dst_stride = 2 * width;
    for y in 0..height {
        let top = src.add(y * width);
        let bottom = if y + 1 < height { top.add(width) } else { top };
        let dst0 = dst.add(2 * y * dst_stride);
        K::upscale_row(top, bottom, dst0, dst0.add(dst_stride), width);
    }
}
