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
use crate::convert_image::common::{normalize as normalize_sample, round_avg};
use crate::convert_image::Kernels;

use core::cmp;
use core::slice;

/// Portable scalar path.
///
/// Every other instruction set must produce bit-identical output.
pub struct X86;

pub fn normalize(src: &[u8], dst: &mut [f32]) {
    for (x, y) in src.iter().zip(dst.iter_mut()) {
        *y = normalize_sample(*x);
    }
}

pub fn upsample(src: &[u8], dst: &mut [f32]) {
    for (x, y) in src.iter().zip(dst.chunks_exact_mut(2)) {
        let value = normalize_sample(*x);
        y[0] = value;
        y[1] = value;
    }
}

pub fn deinterleave_upsample(src: &[u8], u: &mut [f32], v: &mut [f32]) {
    let pairs = src.chunks_exact(2);
    for ((uv, u), v) in pairs.zip(u.chunks_exact_mut(2)).zip(v.chunks_exact_mut(2)) {
        let cb = normalize_sample(uv[0]);
        let cr = normalize_sample(uv[1]);
        u[0] = cb;
        u[1] = cb;
        v[0] = cr;
        v[1] = cr;
    }
}

/// Upscales the samples of `top` into `dst0` and `dst1`.
///
/// The right neighbour of the last sample of `top` is the sample itself,
/// so callers handing over the tail of a row must include the last column.
pub fn upscale_row(top: &[u8], bottom: &[u8], dst0: &mut [u8], dst1: &mut [u8]) {
    let width = cmp::min(top.len(), bottom.len());
    if width == 0 {
        return;
    }

    let last = width - 1;
    for x in 0..width {
        let right = cmp::min(x + 1, last);
        let (tl, tr) = (top[x], top[right]);
        let (bl, br) = (bottom[x], bottom[right]);

        let above = round_avg(tl, tr);
        dst0[2 * x] = tl;
        dst0[2 * x + 1] = above;
        dst1[2 * x] = round_avg(tl, bl);
        dst1[2 * x + 1] = round_avg(above, round_avg(bl, br));
    }
}

impl Kernels for X86 {
    unsafe fn normalize(src: *const u8, dst: *mut f32, count: usize) {
        normalize(
            slice::from_raw_parts(src, count),
            slice::from_raw_parts_mut(dst, count),
        );
    }

    unsafe fn upsample(src: *const u8, dst: *mut f32, count: usize) {
        upsample(
            slice::from_raw_parts(src, count),
            slice::from_raw_parts_mut(dst, 2 * count),
        );
    }

    unsafe fn deinterleave_upsample(src: *const u8, u: *mut f32, v: *mut f32, count: usize) {
        deinterleave_upsample(
            slice::from_raw_parts(src, 2 * count),
            slice::from_raw_parts_mut(u, 2 * count),
            slice::from_raw_parts_mut(v, 2 * count),
        );
    }

    unsafe fn upscale_row(
        top: *const u8,
        bottom: *const u8,
        dst0: *mut u8,
        dst1: *mut u8,
        width: usize,
    ) {
        upscale_row(
            slice::from_raw_parts(top, width),
            slice::from_raw_parts(bottom, width),
            slice::from_raw_parts_mut(dst0, 2 * width),
            slice::from_raw_parts_mut(dst1, 2 * width),
        );
    }
}
