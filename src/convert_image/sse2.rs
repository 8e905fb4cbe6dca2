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

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use core::slice;

const LANE_COUNT: usize = 16;
const FLOAT_LANES: usize = 4;

/// Shuffle immediate equivalent to a lane table
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const fn mm_shuffle(lanes: [usize; 4]) -> i32 {
    ((lanes[3] << 6) | (lanes[2] << 4) | (lanes[1] << 2) | lanes[0]) as i32
}

const DUPLICATE_LO_MASK: i32 = mm_shuffle(DUPLICATE_LO);
const DUPLICATE_HI_MASK: i32 = mm_shuffle(DUPLICATE_HI);
const DUPLICATE_EVEN_MASK: i32 = mm_shuffle(DUPLICATE_EVEN);
const DUPLICATE_ODD_MASK: i32 = mm_shuffle(DUPLICATE_ODD);

pub struct Sse2;

macro_rules! zero {
    () => {
        _mm_setzero_si128()
    };
}

/// Load 4 uchar samples (4-wide)
///
/// image: x3x2x1x0
/// res:   -------- -------- -------- x3x2x1x0
#[inline(always)]
unsafe fn load_ui8_4x(image: *const u8) -> __m128i {
    _mm_cvtsi32_si128(image.cast::<i32>().read_unaligned())
}

/// Convert int to float in the range [0, 1] (4-wide)
///
/// x:   ------x3 ------x2 ------x1 ------x0
/// res: x3/255   x2/255   x1/255   x0/255
#[inline(always)]
unsafe fn scale_i32_4x(x: __m128i) -> __m128 {
    _mm_div_ps(_mm_cvtepi32_ps(x), _mm_set1_ps(NORMALIZE_DIVISOR))
}

/// Unpack the 4 low uchar samples into floats in the range [0, 1] (4-wide)
///
/// x:   ******** ******** ******** x3x2x1x0
/// res: x3/255   x2/255   x1/255   x0/255
#[inline(always)]
unsafe fn unpack_ui8_f32_4x(x: __m128i) -> __m128 {
    scale_i32_4x(_mm_unpacklo_epi16(_mm_unpacklo_epi8(x, zero!()), zero!()))
}

/// Unpack 16 uchar samples into floats in the range [0, 1] (16-wide)
///
/// x:      xfxexdxc xbxax9x8 x7x6x5x4 x3x2x1x0
/// res[0]: x3/255 x2/255 x1/255 x0/255
/// ...
/// res[3]: xf/255 xe/255 xd/255 xc/255
#[inline(always)]
unsafe fn unpack_ui8_f32_16x(x: __m128i) -> [__m128; 4] {
    let lo = _mm_unpacklo_epi8(x, zero!());
    let hi = _mm_unpackhi_epi8(x, zero!());

    [
        scale_i32_4x(_mm_unpacklo_epi16(lo, zero!())),
        scale_i32_4x(_mm_unpackhi_epi16(lo, zero!())),
        scale_i32_4x(_mm_unpacklo_epi16(hi, zero!())),
        scale_i32_4x(_mm_unpackhi_epi16(hi, zero!())),
    ]
}

/// Store 4 samples twice each (8-wide)
///
/// x:      x3 x2 x1 x0
/// res[0]: x1 x1 x0 x0
/// res[1]: x3 x3 x2 x2
#[inline(always)]
unsafe fn store_f32x2_4x(image: *mut f32, x: __m128) {
    _mm_storeu_ps(image, _mm_shuffle_ps(x, x, DUPLICATE_LO_MASK));
    _mm_storeu_ps(image.add(FLOAT_LANES), _mm_shuffle_ps(x, x, DUPLICATE_HI_MASK));
}

/// Deinterleave 2 chroma pairs, storing each sample twice (4-wide)
///
/// x: v1 u1 v0 u0
/// u: u1 u1 u0 u0
/// v: v1 v1 v0 v0
#[inline(always)]
unsafe fn store_f32x2_uv_2x(u: *mut f32, v: *mut f32, x: __m128) {
    _mm_storeu_ps(u, _mm_shuffle_ps(x, x, DUPLICATE_EVEN_MASK));
    _mm_storeu_ps(v, _mm_shuffle_ps(x, x, DUPLICATE_ODD_MASK));
}

/// Interleave and store two uchar vectors (32-wide)
///
/// x:   xfxe..x1x0
/// y:   yfye..y1y0
/// res: y7x7..y0x0, yfxf..y8x8
#[inline(always)]
unsafe fn store_ui8x2_16x(image: *mut u8, x: __m128i, y: __m128i) {
    _mm_storeu_si128(image.cast(), _mm_unpacklo_epi8(x, y));
    _mm_storeu_si128(image.add(LANE_COUNT).cast(), _mm_unpackhi_epi8(x, y));
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn normalize_sse2(src: *const u8, dst: *mut f32, count: usize) {
    let mut i = 0;
    while i + LANE_COUNT <= count {
        let x = unpack_ui8_f32_16x(_mm_loadu_si128(src.add(i).cast()));
        for (k, value) in x.iter().enumerate() {
            _mm_storeu_ps(dst.add(i + k * FLOAT_LANES), *value);
        }

        i += LANE_COUNT;
    }

    while i + FLOAT_LANES <= count {
        _mm_storeu_ps(dst.add(i), unpack_ui8_f32_4x(load_ui8_4x(src.add(i))));
        i += FLOAT_LANES;
    }

    if i < count {
        x86::normalize(
            slice::from_raw_parts(src.add(i), count - i),
            slice::from_raw_parts_mut(dst.add(i), count - i),
        );
    }
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn upsample_sse2(src: *const u8, dst: *mut f32, count: usize) {
    let mut i = 0;
    while i + LANE_COUNT <= count {
        let x = unpack_ui8_f32_16x(_mm_loadu_si128(src.add(i).cast()));
        for (k, value) in x.iter().enumerate() {
            store_f32x2_4x(dst.add(2 * (i + k * FLOAT_LANES)), *value);
        }

        i += LANE_COUNT;
    }

    while i + FLOAT_LANES <= count {
        store_f32x2_4x(dst.add(2 * i), unpack_ui8_f32_4x(load_ui8_4x(src.add(i))));
        i += FLOAT_LANES;
    }

    if i < count {
        x86::upsample(
            slice::from_raw_parts(src.add(i), count - i),
            slice::from_raw_parts_mut(dst.add(2 * i), 2 * (count - i)),
        );
    }
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn deinterleave_upsample_sse2(src: *const u8, u: *mut f32, v: *mut f32, count: usize) {
    const PAIRS: usize = LANE_COUNT / 2;
    const PAIRS_PER_FLOAT: usize = FLOAT_LANES / 2;

    let mut i = 0;
    while i + PAIRS <= count {
        let x = unpack_ui8_f32_16x(_mm_loadu_si128(src.add(2 * i).cast()));
        for (k, value) in x.iter().enumerate() {
            let offset = 2 * (i + k * PAIRS_PER_FLOAT);
            store_f32x2_uv_2x(u.add(offset), v.add(offset), *value);
        }

        i += PAIRS;
    }

    while i + PAIRS_PER_FLOAT <= count {
        let x = unpack_ui8_f32_4x(load_ui8_4x(src.add(2 * i)));
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

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn upscale_row_sse2(
    top: *const u8,
    bottom: *const u8,
    dst0: *mut u8,
    dst1: *mut u8,
    width: usize,
) {
    // The right neighbours of a batch are read one byte ahead, so the last
    // column always goes through the scalar path.
    let mut x = 0;
    while x + LANE_COUNT < width {
        let tl = _mm_loadu_si128(top.add(x).cast());
        let tr = _mm_loadu_si128(top.add(x + 1).cast());
        let bl = _mm_loadu_si128(bottom.add(x).cast());
        let br = _mm_loadu_si128(bottom.add(x + 1).cast());

        let above = _mm_avg_epu8(tl, tr);
        let left = _mm_avg_epu8(tl, bl);
        let diagonal = _mm_avg_epu8(above, _mm_avg_epu8(bl, br));

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

impl Kernels for Sse2 {
    unsafe fn normalize(src: *const u8, dst: *mut f32, count: usize) {
        normalize_sse2(src, dst, count);
    }

    unsafe fn upsample(src: *const u8, dst: *mut f32, count: usize) {
        upsample_sse2(src, dst, count);
    }

    unsafe fn deinterleave_upsample(src: *const u8, u: *mut f32, v: *mut f32, count: usize) {
        deinterleave_upsample_sse2(src, u, v, count);
    }

    unsafe fn upscale_row(
        top: *const u8,
        bottom: *const u8,
        dst0: *mut u8,
        dst1: *mut u8,
        width: usize,
    ) {
        upscale_row_sse2(top, bottom, dst0, dst1, width);
    }
}
