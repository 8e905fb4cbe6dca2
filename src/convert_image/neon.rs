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
use crate::convert_image::common::{
    DUPLICATE_EVEN, DUPLICATE_HI, DUPLICATE_LO, DUPLICATE_ODD, NORMALIZE_DIVISOR,
};
use crate::convert_image::{x86, Kernels};

use core::arch::aarch64::*;
use core::slice;

const LANE_COUNT: usize = 16;
const FLOAT_LANES: usize = 4;

/// Expands a table of 32-bit lanes into the equivalent byte table lookup
#[allow(clippy::cast_possible_truncation)]
const fn lanes_to_bytes(lanes: [usize; 4]) -> [u8; 16] {
    let mut bytes = [0_u8; 16];
    let mut i = 0;
    while i < 16 {
        bytes[i] = (4 * lanes[i / 4] + (i % 4)) as u8;
        i += 1;
    }

    bytes
}

const DUPLICATE_LO_BYTES: [u8; 16] = lanes_to_bytes(DUPLICATE_LO);
const DUPLICATE_HI_BYTES: [u8; 16] = lanes_to_bytes(DUPLICATE_HI);
const DUPLICATE_EVEN_BYTES: [u8; 16] = lanes_to_bytes(DUPLICATE_EVEN);
const DUPLICATE_ODD_BYTES: [u8; 16] = lanes_to_bytes(DUPLICATE_ODD);

pub struct Neon;

#[inline(always)]
unsafe fn permute(x: float32x4_t, table: &[u8; 16]) -> float32x4_t {
    vreinterpretq_f32_u8(vqtbl1q_u8(vreinterpretq_u8_f32(x), vld1q_u8(table.as_ptr())))
}

#[inline(always)]
unsafe fn scale_u32_4x(x: uint32x4_t) -> float32x4_t {
    vdivq_f32(vcvtq_f32_u32(x), vdupq_n_f32(NORMALIZE_DIVISOR))
}

/// Load 4 uchar samples into floats in the range [0, 1] (4-wide)
#[inline(always)]
unsafe fn load_ui8_f32_4x(image: *const u8) -> float32x4_t {
    let x = vreinterpret_u8_u32(vdup_n_u32(image.cast::<u32>().read_unaligned()));
    scale_u32_4x(vmovl_u16(vget_low_u16(vmovl_u8(x))))
}

/// Load 16 uchar samples into floats in the range [0, 1] (16-wide)
#[inline(always)]
unsafe fn load_ui8_f32_16x(image: *const u8) -> [float32x4_t; 4] {
    let x = vld1q_u8(image);
    let lo = vmovl_u8(vget_low_u8(x));
    let hi = vmovl_high_u8(x);

    [
        scale_u32_4x(vmovl_u16(vget_low_u16(lo))),
        scale_u32_4x(vmovl_high_u16(lo)),
        scale_u32_4x(vmovl_u16(vget_low_u16(hi))),
        scale_u32_4x(vmovl_high_u16(hi)),
    ]
}

/// Store 4 samples twice each (8-wide)
#[inline(always)]
unsafe fn store_f32x2_4x(image: *mut f32, x: float32x4_t) {
    vst1q_f32(image, permute(x, &DUPLICATE_LO_BYTES));
    vst1q_f32(image.add(FLOAT_LANES), permute(x, &DUPLICATE_HI_BYTES));
}

/// Deinterleave 2 chroma pairs, storing each sample twice (4-wide)
#[inline(always)]
unsafe fn store_f32x2_uv_2x(u: *mut f32, v: *mut f32, x: float32x4_t) {
    vst1q_f32(u, permute(x, &DUPLICATE_EVEN_BYTES));
    vst1q_f32(v, permute(x, &DUPLICATE_ODD_BYTES));
}

unsafe fn normalize_neon(src: *const u8, dst: *mut f32, count: usize) {
    let mut i = 0;
    while i + LANE_COUNT <= count {
        let x = load_ui8_f32_16x(src.add(i));
        for (k, value) in x.iter().enumerate() {
            vst1q_f32(dst.add(i + k * FLOAT_LANES), *value);
        }

        i += LANE_COUNT;
    }

    while i + FLOAT_LANES <= count {
        vst1q_f32(dst.add(i), load_ui8_f32_4x(src.add(i)));
        i += FLOAT_LANES;
    }

    if i < count {
        x86::normalize(
            slice::from_raw_parts(src.add(i), count - i),
            slice::from_raw_parts_mut(dst.add(i), count - i),
        );
    }
}

unsafe fn upsample_neon(src: *const u8, dst: *mut f32, count: usize) {
    let mut i = 0;
    while i + LANE_COUNT <= count {
        let x = load_ui8_f32_16x(src.add(i));
        for (k, value) in x.iter().enumerate() {
            store_f32x2_4x(dst.add(2 * (i + k * FLOAT_LANES)), *value);
        }

        i += LANE_COUNT;
    }

    while i + FLOAT_LANES <= count {
        store_f32x2_4x(dst.add(2 * i), load_ui8_f32_4x(src.add(i)));
        i += FLOAT_LANES;
    }

    if i < count {
        x86::upsample(
            slice::from_raw_parts(src.add(i), count - i),
            slice::from_raw_parts_mut(dst.add(2 * i), 2 * (count - i)),
        );
    }
}

unsafe fn deinterleave_upsample_neon(src: *const u8, u: *mut f32, v: *mut f32, count: usize) {
    const PAIRS: usize = LANE_COUNT / 2;
    const PAIRS_PER_FLOAT: usize = FLOAT_LANES / 2;

    let mut i = 0;
    while i + PAIRS <= count {
        let x = load_ui8_f32_16x(src.add(2 * i));
        for (k, value) in x.iter().enumerate() {
            let offset = 2 * (i + k * PAIRS_PER_FLOAT);
            store_f32x2_uv_2x(u.add(offset), v.add(offset), *value);
        }

        i += PAIRS;
    }

    while i + PAIRS_PER_FLOAT <= count {
        let x = load_ui8_f32_4x(src.add(2 * i));
        store_f32x2_uv_2x(u.add(2 * i), v.add(2 * i), x);
        i += PAIRS_PER_FLOAT;
    }

    if i < count {
        let tail = count - i;
        x86::deinterleave_upsample(
            slice::from_raw_parts(src.add(2 * i), 2 * tail),
            slice::from_raw_parts_mut(u.add(2 * i), 2 * tail),
            slice::from_raw_parts_mut(v.add(2 * i), 2 * tail),
        );
    }
}

unsafe fn upscale_row_neon(
    top: *const u8,
    bottom: *const u8,
    dst0: *mut u8,
    dst1: *mut u8,
    width: usize,
) {
    let mut x = 0;
    while x + LANE_COUNT < width {
        let tl = vld1q_u8(top.add(x));
        let tr = vld1q_u8(top.add(x + 1));
        let bl = vld1q_u8(bottom.add(x));
        let br = vld1q_u8(bottom.add(x + 1));

        let above = vrhaddq_u8(tl, tr);
        let left = vrhaddq_u8(tl, bl);
        let diagonal = vrhaddq_u8(above, vrhaddq_u8(bl, br));

        vst2q_u8(dst0.add(2 * x), uint8x16x2_t(tl, above));
        vst2q_u8(dst1.add(2 * x), uint8x16x2_t(left, diagonal));
        x += LANE_COUNT;
    }

    if x < width {
        let tail = width - x;
        x86::upscale_row(
            slice::from_raw_parts(top.add(x), tail),
            slice::from_raw_parts(bottom.add(x), tail),
            slice::from_raw_parts_mut(dst0.add(2 * x), 2 * tail),
            slice::from_raw_parts_mut(dst1.add(2 * x), 2 * tail),
        );
    }
}

impl Kernels for Neon {
    unsafe fn normalize(src: *const u8, dst: *mut f32, count: usize) {
        normalize_neon(src, dst, count);
    }

    unsafe fn upsample(src: *const u8, dst: *mut f32, count: usize) {
        upsample_neon(src, dst, count);
    }

    unsafe fn deinterleave_upsample(src: *const u8, u: *mut f32, v: *mut f32, count: usize) {
        deinterleave_upsample_neon(src, u, v, count);
    }

    unsafe fn upscale_row(
        top: *const u8,
        bottom: *const u8,
        dst0: *mut u8,
        dst1: *mut u8,
        width: usize,
    ) {
        upscale_row_neon(top, bottom, dst0, dst1, width);
    }
}
