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
#![allow(dead_code)]

use rand::Rng;
use yuv_tensor_primitives::{PixelFormat, Rect};

pub fn random_buffer(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen::<u8>()).collect()
}

pub fn frame_len(width: usize, height: usize) -> usize {
    width * height * 3 / 2
}

pub fn norm(x: u8) -> f32 {
    f32::from(x) / 255.0
}

pub fn round_avg(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b) + 1) >> 1) as u8
}

/// Luma, u and v samples at a given position of a tightly packed frame
pub fn sample(
    frame: &[u8],
    format: PixelFormat,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
) -> (u8, u8, u8) {
    let luma_len = width * height;
    let luma = frame[y * width + x];
    let (cx, cy) = (x / 2, y / 2);

    match format {
        PixelFormat::Nv12 => {
            let uv = luma_len + cy * width + 2 * cx;
            (luma, frame[uv], frame[uv + 1])
        }
        PixelFormat::I420 => {
            let u = luma_len + cy * (width / 2) + cx;
            (luma, frame[u], frame[u + luma_len / 4])
        }
    }
}

/// Chw tensor of a region of a frame, computed sample by sample
pub fn expected_chw(
    frame: &[u8],
    format: PixelFormat,
    width: usize,
    height: usize,
    tile: &Rect,
) -> Vec<f32> {
    let tile_width = tile.width as usize;
    let tile_height = tile.height as usize;
    let channel_len = tile_width * tile_height;
    let mut tensor = vec![0.0; 3 * channel_len];

    for row in 0..tile_height {
        for col in 0..tile_width {
            let (y, u, v) = sample(
                frame,
                format,
                width,
                height,
                tile.x as usize + col,
                tile.y as usize + row,
            );

            let i = row * tile_width + col;
            tensor[i] = norm(y);
            tensor[channel_len + i] = norm(u);
            tensor[2 * channel_len + i] = norm(v);
        }
    }

    tensor
}

/// 2x bilinear upscale, computed sample by sample
pub fn expected_upscale(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut dst = vec![0; 4 * width * height];
    let at = |x: usize, y: usize| src[y.min(height - 1) * width + x.min(width - 1)];

    for y in 0..height {
        for x in 0..width {
            let (tl, tr, bl, br) = (at(x, y), at(x + 1, y), at(x, y + 1), at(x + 1, y + 1));
            let above = round_avg(tl, tr);
            let top = 2 * y * 2 * width + 2 * x;
            let bottom = top + 2 * width;

            dst[top] = tl;
            dst[top + 1] = above;
            dst[bottom] = round_avg(tl, bl);
            dst[bottom + 1] = round_avg(above, round_avg(bl, br));
        }
    }

    dst
}

/// Splits the interleaved chroma of a nv12 frame into two planes
pub fn nv12_to_i420(frame: &[u8], width: usize, height: usize) -> Vec<u8> {
    let luma_len = width * height;
    let mut i420 = frame[..luma_len].to_vec();
    let chroma = &frame[luma_len..frame_len(width, height)];

    i420.extend(chroma.iter().step_by(2));
    i420.extend(chroma.iter().skip(1).step_by(2));
    i420
}

pub fn check_tensor(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(a.to_bits() == e.to_bits(), "element {}: {} != {}", i, a, e);
    }
}
