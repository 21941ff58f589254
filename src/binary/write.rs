//! Write access to font data.
//!
//! [`WritableFontData`] is the write-capable counterpart of
//! [`ReadableFontData`]: the same region and aliasing rules, plus typed
//! big-endian writes. [`WriteContext`] is the sink abstraction used at the
//! serialization boundary, with [`WriteBuffer`] as its in-memory
//! implementation.

use std::cell::RefCell;
use std::iter;
use std::marker::PhantomData;
use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder};

use crate::binary::read::ReadableFontData;
use crate::binary::{SharedBytes, I16Be, I32Be, I64Be, U16Be, U24Be, U32Be, I8, U8};
use crate::error::{DataError, WriteError};
use crate::size;

/// A read-write, bounds-checked view of a region of font data.
///
/// A view created open-ended grows its backing store when a write runs past
/// the current end; a bounded slice fails with [`DataError::OutOfBounds`]
/// instead. Stores never shrink. Writes are visible through every view
/// aliasing the same storage, so callers must keep a single writer per byte
/// region.
#[derive(Clone)]
pub struct WritableFontData {
    store: SharedBytes,
    bound_offset: usize,
    /// `None` for open-ended (growable) views.
    bound: Option<usize>,
}

impl WritableFontData {
    /// Create an empty, growable view.
    pub fn new() -> WritableFontData {
        WritableFontData::from_vec(Vec::new())
    }

    /// Create a growable view over existing bytes.
    pub fn from_vec(data: Vec<u8>) -> WritableFontData {
        WritableFontData {
            store: Rc::new(RefCell::new(data)),
            bound_offset: 0,
            bound: None,
        }
    }

    /// Adopt the bytes serialized into `buffer` as fresh font data.
    pub fn from_buffer(buffer: WriteBuffer) -> WritableFontData {
        WritableFontData::from_vec(buffer.into_inner())
    }

    /// The number of bytes currently visible through this view.
    pub fn len(&self) -> usize {
        match self.bound {
            Some(bound) => bound,
            None => self.store.borrow().len().saturating_sub(self.bound_offset),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A read-only view of this data's current region, sharing storage.
    pub fn readable(&self) -> ReadableFontData {
        ReadableFontData::with_region(Rc::clone(&self.store), self.bound_offset, self.len())
    }

    /// Check a write of `width` bytes at `offset`, growing the backing store
    /// if this view is open-ended. Returns the absolute store offset.
    fn prepare_write(&mut self, offset: usize, width: usize) -> Result<usize, DataError> {
        let end = offset.checked_add(width).ok_or(DataError::OutOfBounds)?;
        if let Some(bound) = self.bound {
            if end > bound {
                return Err(DataError::OutOfBounds);
            }
        }
        let abs_end = self.bound_offset + end;
        let mut store = self.store.borrow_mut();
        if store.len() < abs_end {
            store.resize(abs_end, 0);
        }
        Ok(self.bound_offset + offset)
    }

    fn write_exact<const N: usize>(&mut self, offset: usize, buf: [u8; N]) -> Result<(), DataError> {
        let start = self.prepare_write(offset, N)?;
        self.store.borrow_mut()[start..start + N].copy_from_slice(&buf);
        Ok(())
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), DataError> {
        self.write_exact(offset, [value])
    }

    pub fn write_i8(&mut self, offset: usize, value: i8) -> Result<(), DataError> {
        self.write_exact(offset, [value as u8])
    }

    pub fn write_u16be(&mut self, offset: usize, value: u16) -> Result<(), DataError> {
        let mut buf = [0; size::U16];
        BigEndian::write_u16(&mut buf, value);
        self.write_exact(offset, buf)
    }

    pub fn write_i16be(&mut self, offset: usize, value: i16) -> Result<(), DataError> {
        let mut buf = [0; size::I16];
        BigEndian::write_i16(&mut buf, value);
        self.write_exact(offset, buf)
    }

    /// Write the low 24 bits of `value` as a big-endian UINT24.
    pub fn write_u24be(&mut self, offset: usize, value: u32) -> Result<(), DataError> {
        let mut buf = [0; size::U24];
        BigEndian::write_u24(&mut buf, value & 0xFF_FFFF);
        self.write_exact(offset, buf)
    }

    pub fn write_u32be(&mut self, offset: usize, value: u32) -> Result<(), DataError> {
        let mut buf = [0; size::U32];
        BigEndian::write_u32(&mut buf, value);
        self.write_exact(offset, buf)
    }

    pub fn write_i32be(&mut self, offset: usize, value: i32) -> Result<(), DataError> {
        let mut buf = [0; size::I32];
        BigEndian::write_i32(&mut buf, value);
        self.write_exact(offset, buf)
    }

    pub fn write_i64be(&mut self, offset: usize, value: i64) -> Result<(), DataError> {
        let mut buf = [0; size::I64];
        BigEndian::write_i64(&mut buf, value);
        self.write_exact(offset, buf)
    }

    /// Write a 16.16 fixed-point value from its raw 32-bit representation.
    pub fn write_fixed(&mut self, offset: usize, value: i32) -> Result<(), DataError> {
        self.write_i32be(offset, value)
    }

    /// Write a LONGDATETIME value.
    pub fn write_date_time(&mut self, offset: usize, value: i64) -> Result<(), DataError> {
        self.write_i64be(offset, value)
    }

    /// Write a signed font design unit.
    pub fn write_fword(&mut self, offset: usize, value: i16) -> Result<(), DataError> {
        self.write_i16be(offset, value)
    }

    /// Write an unsigned font design unit.
    pub fn write_ufword(&mut self, offset: usize, value: u16) -> Result<(), DataError> {
        self.write_u16be(offset, value)
    }

    /// Write `data` starting at `offset`. Returns the number of bytes
    /// written.
    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<usize, DataError> {
        let start = self.prepare_write(offset, data.len())?;
        self.store.borrow_mut()[start..start + data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    /// Make a bounded writable slice covering `[offset, offset + length)`.
    ///
    /// The slice shares storage with this view and must lie within the
    /// view's current extent. Writes through the slice may not run past its
    /// bound.
    pub fn slice(&self, offset: usize, length: usize) -> Result<WritableFontData, DataError> {
        match offset.checked_add(length) {
            Some(end) if end <= self.len() => Ok(WritableFontData {
                store: Rc::clone(&self.store),
                bound_offset: self.bound_offset + offset,
                bound: Some(length),
            }),
            _ => Err(DataError::InvalidRange),
        }
    }

    /// Make a writable slice from `offset` onwards. For an open-ended view
    /// the slice is itself open-ended.
    pub fn slice_from(&self, offset: usize) -> Result<WritableFontData, DataError> {
        if offset > self.len() {
            return Err(DataError::InvalidRange);
        }
        match self.bound {
            Some(bound) => self.slice(offset, bound - offset),
            None => Ok(WritableFontData {
                store: Rc::clone(&self.store),
                bound_offset: self.bound_offset + offset,
                bound: None,
            }),
        }
    }

    // The read contract, delegated through an aliasing readable view.

    pub fn read_u8(&self, offset: usize) -> Result<u8, DataError> {
        self.readable().read_u8(offset)
    }

    pub fn read_i8(&self, offset: usize) -> Result<i8, DataError> {
        self.readable().read_i8(offset)
    }

    pub fn read_u16be(&self, offset: usize) -> Result<u16, DataError> {
        self.readable().read_u16be(offset)
    }

    pub fn read_i16be(&self, offset: usize) -> Result<i16, DataError> {
        self.readable().read_i16be(offset)
    }

    pub fn read_u24be(&self, offset: usize) -> Result<u32, DataError> {
        self.readable().read_u24be(offset)
    }

    pub fn read_u32be(&self, offset: usize) -> Result<u32, DataError> {
        self.readable().read_u32be(offset)
    }

    pub fn read_i32be(&self, offset: usize) -> Result<i32, DataError> {
        self.readable().read_i32be(offset)
    }

    pub fn read_i64be(&self, offset: usize) -> Result<i64, DataError> {
        self.readable().read_i64be(offset)
    }

    pub fn read_fixed(&self, offset: usize) -> Result<i32, DataError> {
        self.readable().read_fixed(offset)
    }

    pub fn read_date_time(&self, offset: usize) -> Result<i64, DataError> {
        self.readable().read_date_time(offset)
    }
}

impl Default for WritableFontData {
    fn default() -> Self {
        WritableFontData::new()
    }
}

/// An in-memory buffer that implements `WriteContext`.
pub struct WriteBuffer {
    data: Vec<u8>,
}

struct WriteSlice<'a> {
    offset: usize,
    data: &'a mut [u8],
}

/// A placeholder for a value that will be filled in later using
/// `WriteContext::write_placeholder`
pub struct Placeholder<T, HostType>
where
    T: WriteBinary<HostType>,
{
    offset: usize,
    length: usize,
    marker: PhantomData<T>,
    host: PhantomData<HostType>,
}

/// Trait that describes a type that can be written to a `WriteContext` in
/// binary form.
pub trait WriteBinary<HostType = Self> {
    /// The type of the value returned by `write`.
    type Output;

    /// Write the binary representation of Self to `ctxt`.
    fn write<C: WriteContext>(ctxt: &mut C, val: HostType) -> Result<Self::Output, WriteError>;
}

/// Trait for types that can have binary data written to them.
pub trait WriteContext {
    /// Write a slice of bytes to a `WriteContext`.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError>;

    /// Write the specified number of zero bytes to the `WriteContext`.
    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError>;

    /// The total number of bytes written so far.
    fn bytes_written(&self) -> usize;

    /// Return a placeholder to `T` in the context for filling in later.
    fn placeholder<T, HostType>(&mut self) -> Result<Placeholder<T, HostType>, WriteError>
    where
        T: WriteBinary<HostType> + BinarySize,
    {
        let offset = self.bytes_written();
        self.write_zeros(T::SIZE)?;

        Ok(Placeholder {
            offset,
            length: T::SIZE,
            marker: PhantomData,
            host: PhantomData,
        })
    }

    /// Consumes the placeholder and writes the supplied value into it
    fn write_placeholder<T, HostType>(
        &mut self,
        placeholder: Placeholder<T, HostType>,
        val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>;
}

/// The number of bytes a marker type occupies when written.
pub trait BinarySize {
    const SIZE: usize;
}

impl WriteContext for WriteBuffer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        self.data.extend(data.iter());
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        let zeros = iter::repeat(0).take(count);
        self.data.extend(zeros);
        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.data.len()
    }

    fn write_placeholder<T, HostType>(
        &mut self,
        placeholder: Placeholder<T, HostType>,
        val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        let data = &mut self.data[placeholder.offset..];
        let data = &mut data[0..placeholder.length];
        let mut slice = WriteSlice { offset: 0, data };
        T::write(&mut slice, val)
    }
}

impl<'a> WriteContext for WriteSlice<'a> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriteError> {
        let data_len = data.len();
        let self_len = self.data.len();

        if data_len <= self_len {
            let subslice = &mut self.data[self.offset..][0..data_len];
            subslice.copy_from_slice(data);
            self.offset += data_len;
            Ok(())
        } else {
            Err(WriteError::BadValue)
        }
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        for i in 0..count.min(self.data.len()) {
            self.data[i] = 0;
        }

        Ok(())
    }

    fn bytes_written(&self) -> usize {
        self.data.len()
    }

    fn write_placeholder<T, HostType>(
        &mut self,
        _placeholder: Placeholder<T, HostType>,
        _val: HostType,
    ) -> Result<T::Output, WriteError>
    where
        T: WriteBinary<HostType>,
    {
        Err(WriteError::NotImplemented)
    }
}

macro_rules! impl_binary_size {
    ($t:ty, $size:expr) => {
        impl BinarySize for $t {
            const SIZE: usize = $size;
        }
    };
}

impl_binary_size!(U8, size::U8);
impl_binary_size!(I8, size::I8);
impl_binary_size!(U16Be, size::U16);
impl_binary_size!(I16Be, size::I16);
impl_binary_size!(U24Be, size::U24);
impl_binary_size!(U32Be, size::U32);
impl_binary_size!(I32Be, size::I32);
impl_binary_size!(I64Be, size::I64);

impl<T> WriteBinary<T> for U8
where
    T: Into<u8>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u8 = t.into();
        ctxt.write_bytes(&[val])
    }
}

impl<T> WriteBinary<T> for I8
where
    T: Into<i8>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i8 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for I16Be
where
    T: Into<i16>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i16 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for U16Be
where
    T: Into<u16>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u16 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for U24Be
where
    T: Into<u32>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u32 = t.into();
        if val > 0xFF_FFFF {
            return Err(WriteError::BadValue);
        }
        ctxt.write_bytes(&val.to_be_bytes()[1..4])
    }
}

impl<T> WriteBinary<T> for I32Be
where
    T: Into<i32>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i32 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for U32Be
where
    T: Into<u32>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: u32 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<T> WriteBinary<T> for I64Be
where
    T: Into<i64>,
{
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, t: T) -> Result<(), WriteError> {
        let val: i64 = t.into();
        ctxt.write_bytes(&val.to_be_bytes())
    }
}

impl<'a> WriteBinary<&'a ReadableFontData> for ReadableFontData {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, data: &'a ReadableFontData) -> Result<(), WriteError> {
        data.copy_to(ctxt).map(drop)
    }
}

impl WriteBuffer {
    /// Create a new, empty `WriteBuffer`
    pub fn new() -> Self {
        WriteBuffer { data: Vec::new() }
    }

    /// Retrieve a slice of the data held by this buffer
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the current size of the data held by this buffer
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume `self` and return the inner buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        WriteBuffer::new()
    }
}
