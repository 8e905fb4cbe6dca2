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
#![warn(missing_docs)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unstable_features)]
#![deny(unused_import_braces)]
#![deny(
    clippy::complexity,
    clippy::correctness,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]
#![allow(
    clippy::too_many_arguments, // API design
    clippy::missing_safety_doc, // Until we add them...
    clippy::similar_names, // This requires effort to ensure
    // Compiler does not always inline intrinsics wrappers, which is
    // detrimental to performance
    clippy::inline_always,
    // Yield false positives
    clippy::must_use_candidate,
)]

//! YUV tensor primitives is a library to turn raw video frames into normalized
//! floating point tensors, the input format expected by most neural networks.
//!
//! It is able to convert the following pixel formats:
//!
//! | Source pixel format  | Destination tensor layouts |
//! | -------------------- | -------------------------- |
//! | I420                 | HW, CHW                    |
//! | NV12                 | HW, CHW                    |
//!
//! Each tensor element is the source sample divided by 255, a `f32` in the range `[0, 1]`.
//! Chroma planes are upsampled to the luma resolution, so that a CHW tensor holds
//! three `height x width` channels: Y, U and V.
//!
//! Moreover, the library can:
//! * convert a rectangular tile of a frame without converting the whole frame first
//! * upscale a single 8-bit channel by a factor of 2 with bilinear filtering
//!
//! # Examples
//!
//! Convert a nv12 frame to a chw tensor:
//! ```
//! use yuv_tensor_primitives as ytp;
//! use ytp::{convert_to_tensor, PixelFormat, TensorLayout};
//! use std::error;
//!
//! fn convert() -> Result<(), Box<dyn error::Error>> {
//!     const WIDTH: u32 = 640;
//!     const HEIGHT: u32 = 480;
//!
//!     let src_data = vec![0u8; 3 * (WIDTH as usize) * (HEIGHT as usize) / 2];
//!     let mut dst_data = vec![0f32; 3 * (WIDTH as usize) * (HEIGHT as usize)];
//!
//!     convert_to_tensor(
//!         WIDTH,
//!         HEIGHT,
//!         PixelFormat::Nv12,
//!         &src_data,
//!         TensorLayout::Chw,
//!         &mut dst_data,
//!     )?;
//!
//!     Ok(())
//! }
//! # convert().unwrap();
//! ```
//!
//! Compute how many elements are needed to store a tensor of a given layout and size:
//! ```
//! use yuv_tensor_primitives as ytp;
//! use ytp::{get_tensor_size, TensorLayout};
//! use std::error;
//!
//! fn compute_size() -> Result<(), Box<dyn error::Error>> {
//!     let size = get_tensor_size(640, 480, TensorLayout::Chw)?;
//!     let buffer: Vec<f32> = vec![0.0; size];
//!
//!     // Do something with buffer
//!     // --snip--
//!
//!     Ok(())
//! }
//! # compute_size().unwrap();
//! ```
//!
//! Extract a 64x32 tile from a 1920x1080 i420 frame:
//! ```
//! use yuv_tensor_primitives as ytp;
//! use ytp::{convert_tile_to_tensor, PixelFormat, Rect, TensorLayout};
//! use std::error;
//!
//! fn extract() -> Result<(), Box<dyn error::Error>> {
//!     let frame = vec![0u8; 1920 * 1080 * 3 / 2];
//!     let tile = Rect::new(128, 64, 64, 32);
//!     let mut tensor = vec![0f32; 3 * 64 * 32];
//!
//!     convert_tile_to_tensor(
//!         1920,
//!         1080,
//!         PixelFormat::I420,
//!         &frame,
//!         &tile,
//!         TensorLayout::Chw,
//!         &mut tensor,
//!     )?;
//!
//!     Ok(())
//! }
//! # extract().unwrap();
//! ```
mod convert_image;
mod converter;
mod cpu_info;
mod frame;
mod pixel_format;

use cpu_info::{CpuManufacturer, InstructionSet};
use frame::FrameView;
use log::{debug, trace};
use paste::paste;
use std::error;
use std::fmt;
#[cfg(feature = "test_instruction_sets")]
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::OnceLock;

pub use converter::FrameConverter;
pub use frame::Rect;
pub use pixel_format::{PixelFormat, TensorLayout};

/// An enumeration of errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub enum ErrorKind {
    /// One or more parameters have invalid values for the called function
    InvalidValue,
    /// Not enough data was provided to the called function. Typically, provided
    /// arrays are not correctly sized
    NotEnoughData,
}

#[cfg(not(tarpaulin_include))]
impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorKind::InvalidValue => write!(
                f,
                "One or more parameters have not legal values for the command"
            ),
            ErrorKind::NotEnoughData => write!(f, "Not enough data provided"),
        }
    }
}

#[cfg(not(tarpaulin_include))]
impl error::Error for ErrorKind {
    fn cause(&self) -> Option<&dyn error::Error> {
        None
    }
}

type NormalizeDispatcher = unsafe fn(*const u8, *mut f32, usize);
type FrameDispatcher = unsafe fn(*const u8, *mut f32, &FrameView);
type UpscaleDispatcher = unsafe fn(*const u8, *mut u8, usize, usize);

#[derive(Copy, Clone)]
struct DispatchTable {
    y_to_hw: NormalizeDispatcher,
    luma_to_hw: FrameDispatcher,
    nv12_to_chw: FrameDispatcher,
    i420_to_chw: FrameDispatcher,
    upscale_bilinear: UpscaleDispatcher,
}

macro_rules! dispatch_table {
    ($set:ident) => {
        paste! {
            DispatchTable {
                y_to_hw: convert_image::y_to_hw::<convert_image::[<$set:lower>]::$set>,
                luma_to_hw: convert_image::luma_to_hw::<convert_image::[<$set:lower>]::$set>,
                nv12_to_chw: convert_image::nv12_to_chw::<convert_image::[<$set:lower>]::$set>,
                i420_to_chw: convert_image::i420_to_chw::<convert_image::[<$set:lower>]::$set>,
                upscale_bilinear:
                    convert_image::upscale_bilinear::<convert_image::[<$set:lower>]::$set>,
            }
        }
    };
}

#[cfg(feature = "test_instruction_sets")]
static TEST_SET: AtomicI32 = AtomicI32::new(-1);

struct Context {
    manufacturer: CpuManufacturer,
    set: InstructionSet,
    converters: DispatchTable,
    #[cfg(feature = "test_instruction_sets")]
    test_converters: [DispatchTable; 1],
}

impl Context {
    pub fn global() -> &'static Context {
        static INSTANCE: OnceLock<Context> = OnceLock::new();
        INSTANCE.get_or_init(Context::new)
    }

    pub fn new() -> Self {
        let (manufacturer, set) = cpu_info::get();
        let converters = match set {
            InstructionSet::X86 => dispatch_table!(X86),
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            InstructionSet::Sse2 => dispatch_table!(Sse2),
            #[cfg(target_arch = "aarch64")]
            InstructionSet::Neon => dispatch_table!(Neon),
            #[cfg(all(target_arch = "wasm32", target_feature = "simd128"))]
            InstructionSet::Simd128 => dispatch_table!(Simd128),
        };

        debug!(
            "Dispatching to {:?} kernels (cpu manufacturer: {:?})",
            set, manufacturer
        );

        Context {
            manufacturer,
            set,
            converters,
            #[cfg(feature = "test_instruction_sets")]
            test_converters: [dispatch_table!(X86)],
        }
    }

    fn converters(&self) -> DispatchTable {
        #[cfg(feature = "test_instruction_sets")]
        {
            // Checked: we want the invalid value '-1' to be mapped outside the valid range
            #[allow(clippy::cast_sign_loss)]
            let index = TEST_SET.load(Ordering::SeqCst) as usize;
            if let Some(table) = self.test_converters.get(index) {
                return *table;
            }
        }

        self.converters
    }
}

fn converters() -> DispatchTable {
    Context::global().converters()
}

/// Returns a description of the algorithms that are best for the running cpu and
/// available instruction sets
///
/// # Examples
/// ```
/// use yuv_tensor_primitives as ytp;
/// println!("{}", ytp::describe_acceleration());
/// // => {cpu-manufacturer:Intel,instruction-set:Sse2}
/// ```
pub fn describe_acceleration() -> String {
    let state = Context::global();

    format!(
        "{{cpu-manufacturer:{:?},instruction-set:{:?}}}",
        state.manufacturer, state.set
    )
}

/// Compute number of bytes required to store a frame given its format and dimensions
///
/// # Errors
///
/// * [`InvalidValue`] if `width` or `height` are odd, or the size overflows
///
/// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
pub fn get_frame_size(width: u32, height: u32, format: PixelFormat) -> Result<usize, ErrorKind> {
    if !pixel_format::is_compatible(format, width, height, TensorLayout::Hw) {
        return Err(ErrorKind::InvalidValue);
    }

    pixel_format::frame_size(width, height).ok_or(ErrorKind::InvalidValue)
}

/// Compute number of `f32` elements required to store a tensor given its layout and dimensions
///
/// # Errors
///
/// * [`InvalidValue`] if the size overflows
///
/// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
pub fn get_tensor_size(width: u32, height: u32, layout: TensorLayout) -> Result<usize, ErrorKind> {
    pixel_format::tensor_size(width, height, layout).ok_or(ErrorKind::InvalidValue)
}

/// Compute number of bytes produced by [`upscale_bilinear`] for a channel of the given dimensions
///
/// # Errors
///
/// * [`InvalidValue`] if the size overflows
///
/// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
/// [`upscale_bilinear`]: ./fn.upscale_bilinear.html
pub fn get_upscaled_size(width: u32, height: u32) -> Result<usize, ErrorKind> {
    pixel_format::upscaled_size(width, height).ok_or(ErrorKind::InvalidValue)
}

/// Normalizes bytes to floats in the range `[0, 1]`, dividing each of them by 255
///
/// # Errors
///
/// * [`NotEnoughData`] if the destination buffer is shorter than the source buffer
///
/// [`NotEnoughData`]: ./enum.ErrorKind.html#variant.NotEnoughData
pub fn normalize(src_buffer: &[u8], dst_buffer: &mut [f32]) -> Result<(), ErrorKind> {
    if dst_buffer.len() < src_buffer.len() {
        return Err(ErrorKind::NotEnoughData);
    }

    unsafe {
        (converters().y_to_hw)(
            src_buffer.as_ptr(),
            dst_buffer.as_mut_ptr(),
            src_buffer.len(),
        );
    }

    Ok(())
}

fn check_buffers(
    src_buffer: &[u8],
    src_size: usize,
    dst_buffer: &[f32],
    dst_size: usize,
) -> Result<(), ErrorKind> {
    if src_buffer.len() < src_size || dst_buffer.len() < dst_size {
        trace!(
            "Buffers too small: {}/{} source bytes, {}/{} destination elements",
            src_buffer.len(),
            src_size,
            dst_buffer.len(),
            dst_size
        );
        return Err(ErrorKind::NotEnoughData);
    }

    Ok(())
}

/// Converts a frame to a tensor, normalizing samples and upsampling chroma
/// to match the destination tensor layout.
///
/// # Arguments
/// * `width` - Width of the frame in pixels
/// * `height` - Height of the frame in pixels
/// * `src_format` - Source pixel format
/// * `src_buffer` - Tightly packed source frame, planes stored back to back
/// * `dst_layout` - Destination tensor layout
/// * `dst_buffer` - Destination tensor
///
/// # Errors
///
/// * [`InvalidValue`] if `width` or `height` are odd
///
/// * [`InvalidValue`] if `dst_layout` is `TensorLayout::Chw` and `width` is not a multiple
///   of 8 (`PixelFormat::I420`) or 4 (`PixelFormat::Nv12`)
///
/// * [`NotEnoughData`] if the source or the destination buffer does not provide enough data.
///   With `TensorLayout::Hw` only the luma plane is read, so the source buffer can be
///   `width * height` bytes long.
///
/// # Algorithm
/// Every source sample `x` is written as `x / 255`. With `TensorLayout::Chw` each
/// chroma sample is replicated over the 2x2 luma block it belongs to.
///
/// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
/// [`NotEnoughData`]: ./enum.ErrorKind.html#variant.NotEnoughData
pub fn convert_to_tensor(
    width: u32,
    height: u32,
    src_format: PixelFormat,
    src_buffer: &[u8],
    dst_layout: TensorLayout,
    dst_buffer: &mut [f32],
) -> Result<(), ErrorKind> {
    if !pixel_format::is_compatible(src_format, width, height, dst_layout) {
        trace!(
            "Rejected {}x{} {} frame for {} tensor",
            width,
            height,
            src_format,
            dst_layout
        );
        return Err(ErrorKind::InvalidValue);
    }

    let dst_size = get_tensor_size(width, height, dst_layout)?;
    let src_size = match dst_layout {
        TensorLayout::Hw => dst_size,
        TensorLayout::Chw => get_frame_size(width, height, src_format)?,
    };
    check_buffers(src_buffer, src_size, dst_buffer, dst_size)?;

    // Degenerate case, trivially accept
    if dst_size == 0 {
        return Ok(());
    }

    let converters = converters();
    let src = src_buffer.as_ptr();
    let dst = dst_buffer.as_mut_ptr();
    let frame = FrameView::new(src_format, width as usize, height as usize);
    unsafe {
        match (dst_layout, src_format) {
            (TensorLayout::Hw, _) => (converters.y_to_hw)(src, dst, dst_size),
            (TensorLayout::Chw, PixelFormat::Nv12) => (converters.nv12_to_chw)(src, dst, &frame),
            (TensorLayout::Chw, PixelFormat::I420) => (converters.i420_to_chw)(src, dst, &frame),
        }
    }

    Ok(())
}

/// Converts a rectangular region of a frame to a tensor, in a single pass.
///
/// The result is the same of converting the whole frame and cropping the tensor.
///
/// # Arguments
/// * `width` - Width of the frame in pixels
/// * `height` - Height of the frame in pixels
/// * `src_format` - Source pixel format
/// * `src_buffer` - Tightly packed source frame, planes stored back to back
/// * `tile` - Region to convert
/// * `dst_layout` - Destination tensor layout
/// * `dst_buffer` - Destination tensor, sized after the tile
///
/// # Errors
///
/// * [`InvalidValue`] if `width` or `height` are odd
///
/// * [`InvalidValue`] if the tile is not inside the frame, `tile.x` is not a multiple of 4,
///   `tile.y` is odd, or the tile size does not satisfy the requirements of
///   [`convert_to_tensor`]
///
/// * [`NotEnoughData`] if the source or the destination buffer does not provide enough data.
///
/// [`InvalidValue`]: ./enum.ErrorKind.html#variant.InvalidValue
/// [`NotEnoughData`]: ./enum.ErrorKind.html#variant.NotEnoughData
/// [`convert_to_tensor`]: ./fn.convert_to_tensor.html
pub fn convert_tile_to_tensor(
    width: u32,
    height: u32,
    src_format: PixelFormat,
    src_buffer: &[u8],
    tile: &Rect,
    dst_layout: TensorLayout,
    dst_buffer: &mut [f32],
) -> Result<(), ErrorKind> {
    if !pixel_format::is_tile_compatible(src_format, width, height, tile, dst_layout) {
        trace!(
            "Rejected tile {:?} of {}x{} {} frame for {} tensor",
            tile,
            width,
            height,
            src_format,
            dst_layout
        );
        return Err(ErrorKind::InvalidValue);
    }

    let src_size = get_frame_size(width, height, src_format)?;
    let dst_size = get_tensor_size(tile.width, tile.height, dst_layout)?;
    check_buffers(src_buffer, src_size, dst_buffer, dst_size)?;

    if dst_size == 0 {
        return Ok(());
    }

    let converters = converters();
    let src = src_buffer.as_ptr();
    let dst = dst_buffer.as_mut_ptr();
    let frame = FrameView::new(src_format, width as usize, height as usize).crop(tile);
    unsafe {
        match (dst_layout, src_format) {
            (TensorLayout::Hw, _) => (converters.luma_to_hw)(src, dst, &frame),
            (TensorLayout::Chw, PixelFormat::Nv12) => (converters.nv12_to_chw)(src, dst, &frame),
            (TensorLayout::Chw, PixelFormat::I420) => (converters.i420_to_chw)(src, dst, &frame),
        }
    }

    Ok(())
}

/// Doubles the size of a single 8-bit channel in both dimensions.
///
/// # Arguments
/// * `width` - Width of the source channel in pixels
/// * `height` - Height of the source channel in pixels
/// * `src_buffer` - Tightly packed source channel
/// * `dst_buffer` - Tightly packed destination channel, `2 * width` x `2 * height` bytes
///
/// # Errors
///
/// * [`NotEnoughData`] if the source or the destination buffer does not provide enough data.
///
/// # Algorithm
/// Given a source sample `tl`, its right neighbour `tr`, the sample below `bl`
/// and the one below on the right `br`, the four destination samples are:
/// ```text
/// tl                  avg(tl, tr)
/// avg(tl, bl)         avg(avg(tl, tr), avg(bl, br))
/// ```
/// where `avg(a, b) = (a + b + 1) >> 1`. Neighbours past the last column or row
/// replicate the last column or row.
///
/// [`NotEnoughData`]: ./enum.ErrorKind.html#variant.NotEnoughData
pub fn upscale_bilinear(
    width: u32,
    height: u32,
    src_buffer: &[u8],
    dst_buffer: &mut [u8],
) -> Result<(), ErrorKind> {
    let src_size = (width as usize)
        .checked_mul(height as usize)
        .ok_or(ErrorKind::InvalidValue)?;
    let dst_size = get_upscaled_size(width, height)?;
    if src_buffer.len() < src_size || dst_buffer.len() < dst_size {
        return Err(ErrorKind::NotEnoughData);
    }

    if dst_size == 0 {
        return Ok(());
    }

    unsafe {
        (converters().upscale_bilinear)(
            src_buffer.as_ptr(),
            dst_buffer.as_mut_ptr(),
            width as usize,
            height as usize,
        );
    }

    Ok(())
}

/// This is for internal use only
#[cfg(feature = "test_instruction_sets")]
pub fn initialize_with_instruction_set(instruction_set: &str) {
    match instruction_set {
        "x86" => TEST_SET.store(0, Ordering::SeqCst),
        _ => TEST_SET.store(-1, Ordering::SeqCst),
    };
}

/// Unchecked entry points, callable from C or from a WebAssembly host.
///
/// Arguments are trusted: neither dimensions nor buffers are validated, and
/// violating the requirements of the checked functions yields unspecified output.
/// On `wasm32` pointers are offsets into the linear memory of the module.
#[doc(hidden)]
#[cfg(not(tarpaulin_include))]
#[cfg(not(feature = "test_instruction_sets"))]
pub mod c_api {
    #![allow(clippy::wildcard_imports)]
    use super::*; // We are importing everything
    use std::ffi::CString;
    use std::os::raw::c_char;
    use std::ptr;

    #[no_mangle]
    pub extern "C" fn ytp_describe_acceleration() -> *mut c_char {
        let acc = describe_acceleration();
        if let Ok(s) = CString::new(acc) {
            s.into_raw()
        } else {
            ptr::null_mut()
        }
    }

    #[no_mangle]
    pub unsafe extern "C" fn ytp_unref_string(string: *mut c_char) {
        if !string.is_null() {
            let _unused = CString::from_raw(string);
        }
    }

    #[no_mangle]
    pub unsafe extern "C" fn ytp_y_to_hw(src: *const u8, dst: *mut f32, sample_count: u32) {
        (converters().y_to_hw)(src, dst, sample_count as usize);
    }

    #[no_mangle]
    pub unsafe extern "C" fn ytp_nv12_to_chw(
        src: *const u8,
        dst: *mut f32,
        width: u32,
        height: u32,
    ) {
        let frame = FrameView::new(PixelFormat::Nv12, width as usize, height as usize);
        (converters().nv12_to_chw)(src, dst, &frame);
    }

    #[no_mangle]
    pub unsafe extern "C" fn ytp_i420_to_chw(
        src: *const u8,
        dst: *mut f32,
        width: u32,
        height: u32,
    ) {
        let frame = FrameView::new(PixelFormat::I420, width as usize, height as usize);
        (converters().i420_to_chw)(src, dst, &frame);
    }

    #[no_mangle]
    pub unsafe extern "C" fn ytp_i420_tile_to_chw(
        src: *const u8,
        dst: *mut f32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) {
        let tile = Rect::new(x, y, width, height);
        let frame = FrameView::new(PixelFormat::I420, frame_width as usize, frame_height as usize)
            .crop(&tile);
        (converters().i420_to_chw)(src, dst, &frame);
    }

    #[no_mangle]
    pub unsafe extern "C" fn ytp_upscale_channel_bilinear(
        src: *const u8,
        dst: *mut u8,
        width: u32,
        height: u32,
    ) {
        (converters().upscale_bilinear)(src, dst, width as usize, height as usize);
    }
}
