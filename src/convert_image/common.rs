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

/// Divisor mapping a byte to the `[0, 1]` range
pub const NORMALIZE_DIVISOR: f32 = 255.0;

// Lane tables for a vector of four 32-bit values.
// Entry i is the index of the source lane written to lane i.

/// a b c d -> a a b b
pub const DUPLICATE_LO: [usize; 4] = [0, 0, 1, 1];
/// a b c d -> c c d d
pub const DUPLICATE_HI: [usize; 4] = [2, 2, 3, 3];
/// u0 v0 u1 v1 -> u0 u0 u1 u1
pub const DUPLICATE_EVEN: [usize; 4] = [0, 0, 2, 2];
/// u0 v0 u1 v1 -> v0 v0 v1 v1
pub const DUPLICATE_ODD: [usize; 4] = [1, 1, 3, 3];

/// Rounding average of two bytes, (a + b + 1) >> 1
#[inline(always)]
pub const fn round_avg(a: u8, b: u8) -> u8 {
    ((a as u16 + b as u16 + 1) >> 1) as u8
}

#[inline(always)]
pub fn normalize(x: u8) -> f32 {
    f32::from(x) / NORMALIZE_DIVISOR
}
