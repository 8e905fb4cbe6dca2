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
use ytp::{
    convert_tile_to_tensor, convert_to_tensor, upscale_bilinear, ErrorKind, PixelFormat, Rect,
    TensorLayout,
};

use itertools::iproduct;
use yuv_tensor_primitives as ytp;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_test::wasm_bindgen_test as test;

const PIXEL_FORMATS: &[PixelFormat; 2] = &[PixelFormat::I420, PixelFormat::Nv12];
const LAYOUTS: &[TensorLayout; 2] = &[TensorLayout::Hw, TensorLayout::Chw];

macro_rules! set_expected {
    ($var:ident, $pred:expr, $status:path) => {
        if $var.is_ok() && $pred {
            $var = Err($status);
        }
    };
}

fn check_err(result: ErrorKind, err: ErrorKind) {
    assert_eq!(result as u32, err as u32);
}

fn check_result(result: Result<(), ErrorKind>, expected: Result<(), ErrorKind>) {
    match result {
        Ok(_) => assert!(expected.is_ok()),
        Err(err) => check_err(err, expected.unwrap_err()),
    }
}

fn width_alignment(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::I420 => 8,
        PixelFormat::Nv12 => 4,
    }
}

fn src_len(width: u32, height: u32) -> usize {
    3 * (width as usize) * (height as usize) / 2
}

fn dst_len(width: u32, height: u32, layout: TensorLayout) -> usize {
    let channels = match layout {
        TensorLayout::Hw => 1,
        TensorLayout::Chw => 3,
    };

    channels * (width as usize) * (height as usize)
}

fn check_bounds(width: u32, height: u32, format: PixelFormat, layout: TensorLayout) {
    if width == 0 || height == 0 {
        return;
    }

    let needed_src = match layout {
        TensorLayout::Hw => (width as usize) * (height as usize),
        TensorLayout::Chw => src_len(width, height),
    };
    let needed_dst = dst_len(width, height, layout);
    let src = vec![0_u8; needed_src];
    let mut dst = vec![0_f32; needed_dst];

    check_err(
        convert_to_tensor(
            width,
            height,
            format,
            &src[..needed_src - 1],
            layout,
            &mut dst,
        )
        .unwrap_err(),
        ErrorKind::NotEnoughData,
    );
    check_err(
        convert_to_tensor(
            width,
            height,
            format,
            &src,
            layout,
            &mut dst[..needed_dst - 1],
        )
        .unwrap_err(),
        ErrorKind::NotEnoughData,
    );
    assert!(convert_to_tensor(width, height, format, &src, layout, &mut dst).is_ok());
}

#[test]
fn convert_errors() {
    for (&format, &layout, width, height) in iproduct!(PIXEL_FORMATS, LAYOUTS, 0..34_u32, 0..5_u32)
    {
        let mut expected = Ok(());
        set_expected!(expected, (width & 1) == 1, ErrorKind::InvalidValue);
        set_expected!(expected, (height & 1) == 1, ErrorKind::InvalidValue);
        set_expected!(
            expected,
            layout == TensorLayout::Chw && width % width_alignment(format) != 0,
            ErrorKind::InvalidValue
        );

        let src = vec![0_u8; src_len(width, height)];
        let mut dst = vec![0_f32; dst_len(width, height, layout)];
        let status = convert_to_tensor(width, height, format, &src, layout, &mut dst);
        check_result(status, expected);

        if expected.is_ok() {
            check_bounds(width, height, format, layout);
        }
    }
}

#[test]
fn tile_errors() {
    const WIDTH: u32 = 34;
    const HEIGHT: u32 = 6;

    let src = vec![0_u8; src_len(WIDTH, HEIGHT)];
    for (&format, &layout, x, y, width, height) in iproduct!(
        PIXEL_FORMATS,
        LAYOUTS,
        0..10_u32,
        0..4_u32,
        0..34_u32,
        0..4_u32
    ) {
        let tile = Rect::new(x, y, width, height);

        let mut expected = Ok(());
        set_expected!(expected, (x & 3) != 0, ErrorKind::InvalidValue);
        set_expected!(expected, (y & 1) == 1, ErrorKind::InvalidValue);
        set_expected!(expected, (width & 1) == 1, ErrorKind::InvalidValue);
        set_expected!(expected, (height & 1) == 1, ErrorKind::InvalidValue);
        set_expected!(
            expected,
            layout == TensorLayout::Chw && width % width_alignment(format) != 0,
            ErrorKind::InvalidValue
        );
        set_expected!(
            expected,
            x + width > WIDTH || y + height > HEIGHT,
            ErrorKind::InvalidValue
        );

        let mut dst = vec![0_f32; dst_len(width, height, layout)];
        let status =
            convert_tile_to_tensor(WIDTH, HEIGHT, format, &src, &tile, layout, &mut dst);
        check_result(status, expected);

        if expected.is_ok() && !dst.is_empty() {
            let len = dst.len();
            check_err(
                convert_tile_to_tensor(
                    WIDTH,
                    HEIGHT,
                    format,
                    &src,
                    &tile,
                    layout,
                    &mut dst[..len - 1],
                )
                .unwrap_err(),
                ErrorKind::NotEnoughData,
            );
            check_err(
                convert_tile_to_tensor(
                    WIDTH,
                    HEIGHT,
                    format,
                    &src[..src.len() - 1],
                    &tile,
                    layout,
                    &mut dst,
                )
                .unwrap_err(),
                ErrorKind::NotEnoughData,
            );
        }
    }
}

#[test]
fn tile_outside_odd_frame() {
    let src = vec![0_u8; src_len(34, 6)];
    let mut dst = vec![0_f32; dst_len(8, 2, TensorLayout::Chw)];

    check_err(
        convert_tile_to_tensor(
            33,
            6,
            PixelFormat::I420,
            &src,
            &Rect::new(0, 0, 8, 2),
            TensorLayout::Chw,
            &mut dst,
        )
        .unwrap_err(),
        ErrorKind::InvalidValue,
    );
    check_err(
        convert_tile_to_tensor(
            34,
            6,
            PixelFormat::I420,
            &src,
            &Rect::new(u32::MAX - 3, 0, 8, 2),
            TensorLayout::Chw,
            &mut dst,
        )
        .unwrap_err(),
        ErrorKind::InvalidValue,
    );
}

#[test]
fn upscale_errors() {
    for (width, height) in iproduct!(0..20_u32, 0..4_u32) {
        let src_len = (width as usize) * (height as usize);
        let src = vec![0_u8; src_len];
        let mut dst = vec![0_u8; 4 * src_len];
        assert!(upscale_bilinear(width, height, &src, &mut dst).is_ok());

        if src_len == 0 {
            continue;
        }

        check_err(
            upscale_bilinear(width, height, &src[..src_len - 1], &mut dst).unwrap_err(),
            ErrorKind::NotEnoughData,
        );
        check_err(
            upscale_bilinear(width, height, &src, &mut dst[..4 * src_len - 1]).unwrap_err(),
            ErrorKind::NotEnoughData,
        );
    }
}

#[test]
fn normalize_errors() {
    let src = [0_u8; 16];
    let mut dst = [0_f32; 15];

    check_err(
        ytp::normalize(&src, &mut dst).unwrap_err(),
        ErrorKind::NotEnoughData,
    );
    assert!(ytp::normalize(&src[..15], &mut dst).is_ok());
}
