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

use core::arch::wasm32::*;
use core::slice;

const LANE_COUNT: usize = 16;
const FLOAT_LANES: usize = 4;

// Lane tables for two vectors of sixteen bytes: indices 16..32 select from the second one.

/// a0..af, b0..bf -> a0 b0 a1 b1 .. a7 b7
const INTERLEAVE_LO: [usize; 16] = [0, 16, 1, 17, 2, 18, 3, 19, 4, 20, 5, 21, 6, 22, 7, 23];
/// a0..af, b0..bf -> a8 b8 a9 b9 .. af bf
const INTERLEAVE_HI: [usize; 16] = [
    8, 24, 9, 25, 10, 26, 11, 27, 12, 28, 13, 29, 14, 30, 15, 31,
];

macro_rules! shuffle_i32 {
    ($table:ident, $x:expr) => {
        i32x4_shuffle::<{ $table[0] }, { $table[1] }, { $table[2] }, { $table[3] }>($x, $x)
    };
}

macro_rules! shuffle_u8 {
    ($table:ident, $x:expr, $y:expr) => {
        u8x16_shuffle::<
            { $table[0] },
            { $table[1] },
            { $table[2] },
            { $table[3] },
            { $table[4] },
            { $table[5] },
            { $table[6] },
            { $table[7] },
            { $table[8] },
            { $table[9] },
            { $table[10] },
            { $table[11] },
            { $table[12] },
            { $table[13] },
            { $table[14] },
            { $table[15] },
        >($x, $y)
    };
}

pub struct Simd128;

#[inline(always)]
fn scale_u32_4x(x: v128) -> v128 {
    f32x4_div(f32x4_convert_u32x4(x), f32x4_splat(NORMALIZE_DIVISOR))
}

/// Load 4 uchar samples into floats in the range [0, 1] (4-wide)
#[inline(always)]
unsafe fn load_ui8_f32_4x(image: *const u8) -> v128 {
    let x = v128_load32_zero(image.cast::<u32>());
    scale_u32_4x(u32x4_extend_low_u16x8(u16x8_extend_low_u8x16(x)))
}

/// Load 16 uchar samples into floats in the range [0, 1] (16-wide)
#[inline(always)]
unsafe fn load_ui8_f32_16x(image: *const u8) -> [v128; 4] {
    let x = v128_load(image.cast::<v128>());
    let lo = u16x8_extend_low_u8x16(x);
    let hi = u16x8_extend_high_u8x16(x);

    [
        scale_u32_4x(u32x4_extend_low_u16x8(lo)),
        scale_u32_4x(u32x4_extend_high_u16x8(lo)),
        scale_u32_4x(u32x4_extend_low_u16x8(hi)),
        scale_u32_4x(u32x4_extend_high_u16x8(hi)),
    ]
}

#[inline(always)]
unsafe fn store(image: *mut f32, x: v128) {
    v128_store(image.cast::<v128>(), x);
}

/// Store 4 samples twice each (8-wide)
#[inline(always)]
unsafe fn store_f32x2_4x(image: *mut f32, x: v128) {
    store(image, shuffle_i32!(DUPLICATE_LO, x));
    store(image.add(FLOAT_LANES), shuffle_i32!(DUPLICATE_HI, x));
}

/// Deinterleave 2 chroma pairs, storing each sample twice (4-wide)
#[inline(always)]
unsafe fn store_f32x2_uv_2x(u: *mut f32, v: *mut f32, x: v128) {
    store(u, shuffle_i32!(DUPLICATE_EVEN, x));
    store(v, shuffle_i32!(DUPLICATE_ODD, x));
}

/// Interleave and store two uchar vectors (32-wide)
#[inline(always)]
unsafe fn store_ui8x2_16x(image: *mut u8, x: v128, y: v128) {
    v128_store(image.cast::<v128>(), shuffle_u8!(INTERLEAVE_LO, x, y));
    v128_store(
        image.add(LANE_COUNT).cast::<v128>(),
        shuffle_u8!(INTERLEAVE_HI, x, y),
    );
}

unsafe fn normalize_simd128(src: *const u8, dst: *mut f32, count: usize) {
    let mut i = 0;
    while i + LANE_COUNT <= count {
        let x = load_ui8_f32_16x(src.add(i));
        for (k, value) in x.iter().enumerate() {
            store(dst.add(i + k * FLOAT_LANES), *value);
        }

        i += LANE_COUNT;
    }

    while i + FLOAT_LANES <= count {
        store(dst.add(i), load_ui8_f32_4x(src.add(i)));
        i += FLOAT_LANES;
    }

    if i < count {
        x86::normalize(
            slice::from_raw_parts(src.add(i), count - i),
            slice::from_raw_parts_mut(dst.add(i), count - i),
        );
    }
}

unsafe fn upsample_simd128(src: *const u8, dst: *mut f32, count: usize) {
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

unsafe fn deinterleave_upsample_simd128(src: *const u8, u: *mut f32, v: *mut f32, count: usize) {
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

unsafe fn upscale_row_simd128(
    top: *const u8,
    bottom: *const u8,
    dst0: *mut u8,
    dst1: *mut u8,
    width: usize,
) {
    let mut x = 0;
    while x + LANE_COUNT < width {
        let tl = v128_load(top.add(x).cast::<v128>());
        let tr = v128_load(top.add(x + 1).cast::<v128>());
        let bl = v128_load(bottom.add(x).cast::<v128>());
        let br = v128_load(bottom.add(x + 1).cast::<v128>());

        let above = u8x16_avgr(tl, tr);
        let left = u8x16_avgr(tl, bl);
        let diagonal = u8x16_avgr(above, u8x16_avgr(bl, br));

        store_ui8x2_16x(dst0.add(2 * x), tl, above);
        store_ui8x2_16x(dst1.add(2 * x), left, diagonal);
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

impl Kernels for Simd128 {
    unsafe fn normalize(src: *const u8, dst: *mut f32, count: usize) {
        normalize_simd128(src, dst, count);
    }

    unsafe fn upsample(src: *const u8, dst: *mut f32, count: usize) {
        upsample_simd128(src, dst, count);
    }

    unsafe fn deinterleave_upsample(src: *const u8, u: *mut f32, v: *mut f32, count: usize) {
        deinterleave_upsample_simd128(src, u, v, count);
    }

    unsafe fn upscale_row(
        top: *const u8,
        bottom: *const u8,
        dst0: *mut u8,
        dst1: *mut u8,
        width: usize,
    ) {
        upscale_row_simd128(top, bottom, dst0, dst1, width);
    }
}
