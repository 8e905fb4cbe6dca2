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
mod common;

use common::{frame_len, random_buffer};
use itertools::iproduct;
use ytp::{
    convert_tile_to_tensor, convert_to_tensor, describe_acceleration, get_frame_size,
    get_tensor_size, get_upscaled_size, upscale_bilinear, ErrorKind, FrameConverter, PixelFormat,
    Rect, TensorLayout,
};
use yuv_tensor_primitives as ytp;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_test::wasm_bindgen_test as test;

const PAGE_SIZE: usize = 64 * 1024;
const FLOAT_SIZE: usize = 4;

#[test]
fn bootstrap() {
    let description = describe_acceleration();
    println!("{}", description);

    assert!(description.starts_with("{cpu-manufacturer:"));
    assert!(description.contains(",instruction-set:"));
}

#[test]
fn buffers_size() {
    for (&format, width, height) in iproduct!(
        &[PixelFormat::I420, PixelFormat::Nv12],
        (0..64_u32).step_by(2),
        (0..16_u32).step_by(2)
    ) {
        let area = (width as usize) * (height as usize);
        assert_eq!(get_frame_size(width, height, format), Ok(area * 3 / 2));
        assert_eq!(get_tensor_size(width, height, TensorLayout::Hw), Ok(area));
        assert_eq!(get_tensor_size(width, height, TensorLayout::Chw), Ok(3 * area));
        assert_eq!(get_upscaled_size(width, height), Ok(4 * area));
    }

    assert_eq!(
        get_frame_size(3, 2, PixelFormat::Nv12),
        Err(ErrorKind::InvalidValue)
    );
    assert_eq!(
        get_frame_size(2, 3, PixelFormat::I420),
        Err(ErrorKind::InvalidValue)
    );
    assert_eq!(get_upscaled_size(17, 3), Ok(4 * 17 * 3));
}

#[test]
fn converter_layout() {
    let converter = FrameConverter::new().unwrap();
    let max = FrameConverter::DEFAULT_MAX_DIMENSION as usize;

    assert_eq!(converter.max_dimension(), FrameConverter::DEFAULT_MAX_DIMENSION);
    assert_eq!(converter.output_offset() % PAGE_SIZE, 0);
    assert_eq!(converter.region_size() % PAGE_SIZE, 0);
    assert!(converter.output_offset() >= frame_len(max, max));
    assert!(converter.region_size() >= converter.output_offset() + 3 * max * max * FLOAT_SIZE);
}

#[test]
fn converter_growth() {
    let mut converter = FrameConverter::new().unwrap();
    let region_size = converter.region_size();

    converter.reserve(2000, 1000).unwrap();
    assert_eq!(converter.max_dimension(), 1920);
    assert_eq!(converter.region_size(), region_size);

    converter.reserve(4000, 2000).unwrap();
    assert_eq!(converter.max_dimension(), 4000);
    assert!(converter.region_size() > region_size);
    assert!(converter.output_offset() >= frame_len(4000, 4000));

    converter.reserve(4097, 4097).unwrap();
    assert_eq!(converter.max_dimension(), 4100);
    assert_eq!(converter.output_offset() % PAGE_SIZE, 0);

    converter.reserve(16, 16).unwrap();
    assert_eq!(converter.max_dimension(), 4100);
}

#[test]
fn converter_preserves_input() {
    let mut converter = FrameConverter::with_max_dimension(16).unwrap();
    let frame = random_buffer(frame_len(16, 16));
    converter.input_mut(16, 16).unwrap().copy_from_slice(&frame);

    converter.reserve(64, 32).unwrap();
    assert_eq!(converter.max_dimension(), 64);
    assert_eq!(&converter.input_mut(16, 16).unwrap()[..], &frame[..]);
}

#[test]
fn converter_matches_free_functions() {
    const WIDTH: u32 = 64;
    const HEIGHT: u32 = 34;

    let mut converter = FrameConverter::with_max_dimension(32).unwrap();
    for (&format, &layout) in iproduct!(
        &[PixelFormat::I420, PixelFormat::Nv12],
        &[TensorLayout::Hw, TensorLayout::Chw]
    ) {
        let frame = random_buffer(frame_len(WIDTH as usize, HEIGHT as usize));
        converter.input_mut(WIDTH, HEIGHT).unwrap().copy_from_slice(&frame);

        let size = get_tensor_size(WIDTH, HEIGHT, layout).unwrap();
        let mut expected = vec![0_f32; size];
        convert_to_tensor(WIDTH, HEIGHT, format, &frame, layout, &mut expected).unwrap();
        converter.convert(WIDTH, HEIGHT, format, layout).unwrap();
        common::check_tensor(converter.tensor(WIDTH, HEIGHT, layout).unwrap(), &expected);

        let tile = Rect::new(8, 2, 16, 8);
        let size = get_tensor_size(tile.width, tile.height, layout).unwrap();
        let mut expected = vec![0_f32; size];
        convert_tile_to_tensor(WIDTH, HEIGHT, format, &frame, &tile, layout, &mut expected)
            .unwrap();
        converter
            .convert_tile(WIDTH, HEIGHT, format, &tile, layout)
            .unwrap();
        common::check_tensor(
            converter.tensor(tile.width, tile.height, layout).unwrap(),
            &expected,
        );
    }
}

#[test]
fn converter_upscale() {
    const WIDTH: u32 = 23;
    const HEIGHT: u32 = 9;

    let mut converter = FrameConverter::with_max_dimension(8).unwrap();
    let channel = random_buffer((WIDTH * HEIGHT) as usize);
    converter
        .channel_input_mut(WIDTH, HEIGHT)
        .unwrap()
        .copy_from_slice(&channel);

    let mut expected = vec![0_u8; get_upscaled_size(WIDTH, HEIGHT).unwrap()];
    upscale_bilinear(WIDTH, HEIGHT, &channel, &mut expected).unwrap();
    converter.upscale(WIDTH, HEIGHT).unwrap();

    assert_eq!(converter.upscaled(WIDTH, HEIGHT).unwrap(), &expected[..]);
    assert_eq!(
        &expected[..],
        &common::expected_upscale(&channel, WIDTH as usize, HEIGHT as usize)[..]
    );
}

#[test]
fn converter_errors() {
    let mut converter = FrameConverter::with_max_dimension(16).unwrap();

    assert_eq!(
        converter.convert(15, 16, PixelFormat::Nv12, TensorLayout::Chw),
        Err(ErrorKind::InvalidValue)
    );
    assert_eq!(
        converter.convert_tile(
            16,
            16,
            PixelFormat::I420,
            &Rect::new(2, 0, 8, 8),
            TensorLayout::Chw
        ),
        Err(ErrorKind::InvalidValue)
    );
    assert_eq!(
        converter.tensor(1024, 1024, TensorLayout::Chw).unwrap_err(),
        ErrorKind::NotEnoughData
    );
    assert_eq!(
        converter.upscaled(1024, 1024).unwrap_err(),
        ErrorKind::NotEnoughData
    );
    assert_eq!(
        FrameConverter::with_max_dimension(u32::MAX).err(),
        Some(ErrorKind::InvalidValue)
    );
}

#[cfg(all(not(target_arch = "wasm32"), not(feature = "test_instruction_sets")))]
mod exports {
    use super::common::{expected_chw, frame_len, random_buffer};
    use yuv_tensor_primitives::c_api::{
        ytp_describe_acceleration, ytp_i420_tile_to_chw, ytp_nv12_to_chw,
        ytp_upscale_channel_bilinear, ytp_unref_string, ytp_y_to_hw,
    };
    use yuv_tensor_primitives::{describe_acceleration, PixelFormat, Rect};

    use std::ffi::CStr;

    #[test]
    fn describe() {
        unsafe {
            let raw = ytp_describe_acceleration();
            assert!(!raw.is_null());
            assert_eq!(
                CStr::from_ptr(raw).to_str().unwrap(),
                describe_acceleration()
            );
            ytp_unref_string(raw);
        }
    }

    #[test]
    fn y_to_hw() {
        let src = random_buffer(77);
        let mut dst = vec![0_f32; 77];
        unsafe {
            ytp_y_to_hw(src.as_ptr(), dst.as_mut_ptr(), 77);
        }

        let expected: Vec<f32> = src.iter().map(|&x| super::common::norm(x)).collect();
        super::common::check_tensor(&dst, &expected);
    }

    #[test]
    fn frames_and_tiles() {
        const WIDTH: usize = 48;
        const HEIGHT: usize = 10;

        let frame = random_buffer(frame_len(WIDTH, HEIGHT));
        let full = Rect::new(0, 0, WIDTH as u32, HEIGHT as u32);
        let mut dst = vec![0_f32; 3 * WIDTH * HEIGHT];
        unsafe {
            ytp_nv12_to_chw(frame.as_ptr(), dst.as_mut_ptr(), WIDTH as u32, HEIGHT as u32);
        }
        super::common::check_tensor(
            &dst,
            &expected_chw(&frame, PixelFormat::Nv12, WIDTH, HEIGHT, &full),
        );

        let tile = Rect::new(16, 4, 24, 6);
        let mut dst = vec![0_f32; 3 * 24 * 6];
        unsafe {
            ytp_i420_tile_to_chw(
                frame.as_ptr(),
                dst.as_mut_ptr(),
                tile.x,
                tile.y,
                tile.width,
                tile.height,
                WIDTH as u32,
                HEIGHT as u32,
            );
        }
        super::common::check_tensor(
            &dst,
            &expected_chw(&frame, PixelFormat::I420, WIDTH, HEIGHT, &tile),
        );
    }

    #[test]
    fn upscale() {
        let src = random_buffer(5 * 3);
        let mut dst = vec![0_u8; 4 * 5 * 3];
        unsafe {
            ytp_upscale_channel_bilinear(src.as_ptr(), dst.as_mut_ptr(), 5, 3);
        }

        assert_eq!(dst, super::common::expected_upscale(&src, 5, 3));
    }
}
