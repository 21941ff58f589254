//! Definitions of the sizes of binary types.

use std::mem;

pub const U8: usize = mem::size_of::<u8>();
pub const I8: usize = mem::size_of::<i8>();
pub const U16: usize = mem::size_of::<u16>();
pub const I16: usize = mem::size_of::<i16>();
pub const U24: usize = 3;
pub const U32: usize = mem::size_of::<u32>();
pub const I32: usize = mem::size_of::<i32>();
pub const I64: usize = mem::size_of::<i64>();

/// 16.16 signed fixed-point value.
pub const FIXED: usize = 4;
/// Signed font design unit (same layout as `I16`).
pub const F_WORD: usize = 2;
/// Unsigned font design unit (same layout as `U16`).
pub const UF_WORD: usize = 2;
/// Seconds since 1904-01-01 00:00, signed 64-bit.
pub const LONG_DATE_TIME: usize = 8;
