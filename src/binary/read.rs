//! Bounds-checked read access to font data.
//!
//! A [`ReadableFontData`] is a typed window over shared byte storage. Slices
//! taken from a view alias the same storage as their parent and can never
//! widen past it. All reads are big-endian and fail with
//! [`DataError::OutOfBounds`] rather than clamping.

use std::cell::Cell;
use std::cell::RefCell;
use std::cmp;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder};

use crate::binary::write::WriteContext;
use crate::binary::SharedBytes;
use crate::checksum::table_checksum;
use crate::error::{DataError, WriteError};
use crate::size;

/// A read-only, bounds-checked view of a region of font data.
///
/// The view covers `[bound_offset, bound_offset + length)` of its backing
/// storage. Cloning a view is cheap: only the storage handle is duplicated.
#[derive(Clone)]
pub struct ReadableFontData {
    store: SharedBytes,
    bound_offset: usize,
    length: usize,
    /// Memoized OpenType checksum, valid for the current range set.
    checksum: Cell<Option<u32>>,
    /// Flat `[start, end, start, end, ...]` list of checksum ranges. An
    /// odd-length list means the final range extends to the end of the view.
    checksum_ranges: Vec<usize>,
}

impl ReadableFontData {
    /// Create a view over the whole of `data`.
    pub fn new(data: Vec<u8>) -> ReadableFontData {
        let length = data.len();
        ReadableFontData::with_region(Rc::new(RefCell::new(data)), 0, length)
    }

    pub(crate) fn with_region(
        store: SharedBytes,
        bound_offset: usize,
        length: usize,
    ) -> ReadableFontData {
        ReadableFontData {
            store,
            bound_offset,
            length,
            checksum: Cell::new(None),
            checksum_ranges: Vec::new(),
        }
    }

    /// The number of bytes visible through this view.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn check_bounds(&self, offset: usize, width: usize) -> Result<(), DataError> {
        match offset.checked_add(width) {
            Some(end) if end <= self.length => Ok(()),
            _ => Err(DataError::OutOfBounds),
        }
    }

    fn read_exact<const N: usize>(&self, offset: usize) -> Result<[u8; N], DataError> {
        self.check_bounds(offset, N)?;
        let store = self.store.borrow();
        let start = self.bound_offset + offset;
        let mut buf = [0; N];
        buf.copy_from_slice(&store[start..start + N]);
        Ok(buf)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, DataError> {
        self.read_exact::<1>(offset).map(|buf| buf[0])
    }

    pub fn read_i8(&self, offset: usize) -> Result<i8, DataError> {
        self.read_u8(offset).map(|byte| byte as i8)
    }

    pub fn read_u16be(&self, offset: usize) -> Result<u16, DataError> {
        self.read_exact::<{ size::U16 }>(offset)
            .map(|buf| BigEndian::read_u16(&buf))
    }

    pub fn read_i16be(&self, offset: usize) -> Result<i16, DataError> {
        self.read_exact::<{ size::I16 }>(offset)
            .map(|buf| BigEndian::read_i16(&buf))
    }

    pub fn read_u24be(&self, offset: usize) -> Result<u32, DataError> {
        self.read_exact::<{ size::U24 }>(offset)
            .map(|buf| BigEndian::read_u24(&buf))
    }

    pub fn read_u32be(&self, offset: usize) -> Result<u32, DataError> {
        self.read_exact::<{ size::U32 }>(offset)
            .map(|buf| BigEndian::read_u32(&buf))
    }

    pub fn read_i32be(&self, offset: usize) -> Result<i32, DataError> {
        self.read_exact::<{ size::I32 }>(offset)
            .map(|buf| BigEndian::read_i32(&buf))
    }

    pub fn read_i64be(&self, offset: usize) -> Result<i64, DataError> {
        self.read_exact::<{ size::I64 }>(offset)
            .map(|buf| BigEndian::read_i64(&buf))
    }

    /// Read a 16.16 fixed-point value as its raw 32-bit representation.
    pub fn read_fixed(&self, offset: usize) -> Result<i32, DataError> {
        self.read_i32be(offset)
    }

    /// Read a LONGDATETIME value (seconds since 1904-01-01 00:00).
    pub fn read_date_time(&self, offset: usize) -> Result<i64, DataError> {
        self.read_i64be(offset)
    }

    /// Read a signed font design unit.
    pub fn read_fword(&self, offset: usize) -> Result<i16, DataError> {
        self.read_i16be(offset)
    }

    /// Read an unsigned font design unit.
    pub fn read_ufword(&self, offset: usize) -> Result<u16, DataError> {
        self.read_u16be(offset)
    }

    /// Bulk-copy bytes starting at `offset` into `dest[dest_offset..]`.
    ///
    /// Copies at most `count` bytes, clamped to what remains of the view.
    /// Returns the number of bytes copied, 0 if the window is empty. Fails
    /// only if the destination cannot hold the copied bytes.
    pub fn read_bytes(
        &self,
        offset: usize,
        dest: &mut [u8],
        dest_offset: usize,
        count: usize,
    ) -> Result<usize, DataError> {
        let available = self.length.saturating_sub(offset);
        let count = cmp::min(count, available);
        let dest = dest
            .get_mut(dest_offset..dest_offset + count)
            .ok_or(DataError::OutOfBounds)?;
        let store = self.store.borrow();
        let start = self.bound_offset + offset;
        dest.copy_from_slice(&store[start..start + count]);
        Ok(count)
    }

    /// Copy the whole region into `ctxt`, in region order. Returns the number
    /// of bytes written.
    pub fn copy_to<C: WriteContext>(&self, ctxt: &mut C) -> Result<usize, WriteError> {
        let store = self.store.borrow();
        let start = self.bound_offset;
        ctxt.write_bytes(&store[start..start + self.length])?;
        Ok(self.length)
    }

    /// Copy the whole region out into a `Vec`.
    pub fn to_vec(&self) -> Vec<u8> {
        let store = self.store.borrow();
        let start = self.bound_offset;
        store[start..start + self.length].to_vec()
    }

    /// Make a slice of this view covering `[offset, offset + length)`.
    ///
    /// The slice shares storage with this view; no bytes are copied.
    pub fn slice(&self, offset: usize, length: usize) -> Result<ReadableFontData, DataError> {
        match offset.checked_add(length) {
            Some(end) if end <= self.length => Ok(ReadableFontData::with_region(
                Rc::clone(&self.store),
                self.bound_offset + offset,
                length,
            )),
            _ => Err(DataError::InvalidRange),
        }
    }

    /// Make a slice of this view from `offset` to the end of the view.
    pub fn slice_from(&self, offset: usize) -> Result<ReadableFontData, DataError> {
        if offset <= self.length {
            self.slice(offset, self.length - offset)
        } else {
            Err(DataError::InvalidRange)
        }
    }

    /// Set the ranges used for checksum calculation in place of the whole
    /// region.
    ///
    /// `ranges` is a flat `[start, end, start, end, ...]` list of offsets
    /// within this view. An odd-length list means the final range extends to
    /// the end of the view. Each closed range must lie within the view,
    /// ascend, and span a multiple of four bytes; otherwise
    /// [`DataError::InvalidRange`] is returned and the previous range set is
    /// kept. Any memoized checksum is discarded.
    ///
    /// Mutating the underlying bytes does not invalidate a memoized checksum;
    /// callers that write through an aliasing view must re-set the range set
    /// before reading the checksum again.
    pub fn set_check_sum_ranges(&mut self, ranges: &[usize]) -> Result<(), DataError> {
        for (i, pair) in ranges.chunks(2).enumerate() {
            match *pair {
                [start, end] => {
                    if start > end || end > self.length || (end - start) % 4 != 0 {
                        return Err(DataError::InvalidRange);
                    }
                }
                // Final open-ended range; the ragged tail, if any, is
                // zero-padded by the checksum algorithm.
                [start] => {
                    debug_assert_eq!(i * 2, ranges.len() - 1);
                    if start > self.length {
                        return Err(DataError::InvalidRange);
                    }
                }
                _ => unreachable!(),
            }
        }

        self.checksum_ranges = ranges.to_vec();
        self.checksum.set(None);
        Ok(())
    }

    /// The OpenType checksum of this view.
    ///
    /// Computed over the declared checksum ranges if any have been set,
    /// otherwise over the whole region. The value is computed lazily on first
    /// call and memoized until the range set changes.
    pub fn checksum(&self) -> u32 {
        if let Some(sum) = self.checksum.get() {
            return sum;
        }

        let store = self.store.borrow();
        let region = &store[self.bound_offset..self.bound_offset + self.length];
        let sum = if self.checksum_ranges.is_empty() {
            table_checksum(region).0
        } else {
            let mut sum = 0u32;
            for pair in self.checksum_ranges.chunks(2) {
                let start = pair[0];
                let end = pair.get(1).copied().unwrap_or(self.length);
                sum = sum.wrapping_add(table_checksum(&region[start..end]).0);
            }
            sum
        };
        drop(store);

        self.checksum.set(Some(sum));
        sum
    }
}

/// A fixed-size record that can be read from a view at a byte offset.
pub trait ReadFixed: Sized {
    /// The number of bytes occupied by the record.
    const SIZE: usize;

    fn read(data: &ReadableFontData, offset: usize) -> Result<Self, DataError>;
}

/// A typed array of fixed-size records laid out back to back in a view.
#[derive(Clone)]
pub struct ReadArray<T: ReadFixed> {
    data: ReadableFontData,
    length: usize,
    phantom: PhantomData<T>,
}

pub struct ReadArrayIter<'a, T: ReadFixed> {
    array: &'a ReadArray<T>,
    index: usize,
}

impl<T: ReadFixed> ReadArray<T> {
    /// Interpret `data` as an array of `length` records.
    pub fn new(data: ReadableFontData, length: usize) -> Result<ReadArray<T>, DataError> {
        match length.checked_mul(T::SIZE) {
            Some(size) if size <= data.len() => Ok(ReadArray {
                data,
                length,
                phantom: PhantomData,
            }),
            _ => Err(DataError::InvalidRange),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn read_item(&self, index: usize) -> Result<T, DataError> {
        if index < self.length {
            T::read(&self.data, index * T::SIZE)
        } else {
            Err(DataError::OutOfBounds)
        }
    }

    pub fn get_item(&self, index: usize) -> Option<T> {
        self.read_item(index).ok()
    }

    pub fn iter(&self) -> ReadArrayIter<'_, T> {
        ReadArrayIter {
            array: self,
            index: 0,
        }
    }

    // This is derived from the function on slice in the standard library
    pub fn binary_search_by<F>(&self, mut f: F) -> Result<usize, usize>
    where
        F: FnMut(T) -> Ordering,
    {
        // INVARIANTS:
        // - 0 <= left <= left + size = right <= self.len()
        // - f returns Less for everything in self[..left]
        // - f returns Greater for everything in self[right..]
        let mut size = self.len();
        let mut left = 0;
        let mut right = size;
        while left < right {
            let mid = left + size / 2;

            // NOTE(unwrap): the while condition means `size` is strictly
            // positive, so `size/2 < size`. Thus `left + size/2 < left +
            // size`, which coupled with the `left + size <= self.len()`
            // invariant means `mid` is in bounds.
            let cmp = f(self.read_item(mid).unwrap());

            if cmp == Ordering::Less {
                left = mid + 1;
            } else if cmp == Ordering::Greater {
                right = mid;
            } else {
                return Ok(mid);
            }

            size = right - left;
        }

        Err(left)
    }
}

impl<'a, T: ReadFixed> Iterator for ReadArrayIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.array.get_item(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.array.length - cmp::min(self.index, self.array.length);
        (remaining, Some(remaining))
    }
}

impl<'a, T: ReadFixed> ExactSizeIterator for ReadArrayIter<'a, T> {}

impl<'a, T: ReadFixed> IntoIterator for &'a ReadArray<T> {
    type Item = T;
    type IntoIter = ReadArrayIter<'a, T>;

    fn into_iter(self) -> ReadArrayIter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(bytes: &[u8]) -> ReadableFontData {
        ReadableFontData::new(bytes.to_vec())
    }

    #[test]
    fn test_read_widths() {
        let d = data(&[0x01, 0x02, 0x03, 0x04, 0xFF, 0xFE, 0xFD, 0xFC]);
        assert_eq!(d.read_u8(0), Ok(0x01));
        assert_eq!(d.read_i8(4), Ok(-1));
        assert_eq!(d.read_u16be(0), Ok(0x0102));
        assert_eq!(d.read_i16be(4), Ok(-2i16));
        assert_eq!(d.read_u24be(0), Ok(0x010203));
        assert_eq!(d.read_u32be(0), Ok(0x01020304));
        assert_eq!(d.read_i32be(4), Ok(-0x00010204));
        assert_eq!(d.read_i64be(0), Ok(0x01020304_FFFEFDFCu64 as i64));
        assert_eq!(d.read_fixed(0), Ok(0x01020304));
        assert_eq!(d.read_fword(4), Ok(-2i16));
        assert_eq!(d.read_ufword(4), Ok(0xFFFE));
    }

    #[test]
    fn test_bounds_enforcement() {
        // Reading exactly at `len - width` succeeds, one past fails.
        let d = data(&[0; 8]);
        assert!(d.read_u16be(6).is_ok());
        assert_eq!(d.read_u16be(7), Err(DataError::OutOfBounds));
        assert!(d.read_u32be(4).is_ok());
        assert_eq!(d.read_u32be(5), Err(DataError::OutOfBounds));
        assert!(d.read_i64be(0).is_ok());
        assert_eq!(d.read_i64be(1), Err(DataError::OutOfBounds));
        assert_eq!(d.read_u8(8), Err(DataError::OutOfBounds));
    }

    #[test]
    fn test_slice_containment() {
        let d = data(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let s = d.slice(2, 6).unwrap();
        assert_eq!(s.len(), 6);
        for i in 0..6 {
            assert_eq!(s.read_u8(i), d.read_u8(2 + i));
        }
        // Slices compose transitively.
        let s2 = s.slice(1, 3).unwrap();
        for i in 0..3 {
            assert_eq!(s2.read_u8(i), d.read_u8(3 + i));
        }
        assert_eq!(s2.read_u8(3), Err(DataError::OutOfBounds));
    }

    #[test]
    fn test_slice_bounds() {
        let d = data(&[0; 4]);
        assert!(d.slice(0, 4).is_ok());
        assert!(d.slice(4, 0).is_ok());
        assert_eq!(d.slice(2, 3).err(), Some(DataError::InvalidRange));
        assert_eq!(d.slice(5, 0).err(), Some(DataError::InvalidRange));
        assert_eq!(d.slice_from(5).err(), Some(DataError::InvalidRange));
        assert_eq!(d.slice_from(1).unwrap().len(), 3);
    }

    #[test]
    fn test_read_bytes() {
        let d = data(&[1, 2, 3, 4]);
        let mut buf = [0u8; 8];
        // Clamped to what remains of the view.
        assert_eq!(d.read_bytes(1, &mut buf, 2, 8), Ok(3));
        assert_eq!(&buf[..6], &[0, 0, 2, 3, 4, 0]);
        assert_eq!(d.read_bytes(4, &mut buf, 0, 4), Ok(0));
        // Destination too small for the copy.
        let mut small = [0u8; 1];
        assert!(d.read_bytes(0, &mut small, 0, 2).is_err());
    }

    #[test]
    fn test_checksum() {
        let d = data(&[0, 0, 0, 1, 0, 0, 0, 2]);
        assert_eq!(d.checksum(), 3);
        // Memoized value is returned on the second call.
        assert_eq!(d.checksum(), 3);

        let d = data(&[0, 0, 0, 0xFF, 0xFF]);
        assert_eq!(d.checksum(), 0xFF00_00FFu32);
    }

    #[test]
    fn test_checksum_ranges() {
        let mut d = data(&[0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3]);
        assert_eq!(d.checksum(), 6);

        // Skip the middle word.
        d.set_check_sum_ranges(&[0, 4, 8, 12]).unwrap();
        assert_eq!(d.checksum(), 4);

        // Odd-length list: final range extends to the end of the region.
        d.set_check_sum_ranges(&[4]).unwrap();
        assert_eq!(d.checksum(), 5);
    }

    #[test]
    fn test_checksum_range_validation() {
        let mut d = data(&[0; 8]);
        // Misaligned closed range
        assert_eq!(
            d.set_check_sum_ranges(&[0, 3]),
            Err(DataError::InvalidRange)
        );
        // Descending range
        assert_eq!(
            d.set_check_sum_ranges(&[4, 0]),
            Err(DataError::InvalidRange)
        );
        // Out of bounds
        assert_eq!(
            d.set_check_sum_ranges(&[0, 12]),
            Err(DataError::InvalidRange)
        );
        assert_eq!(d.set_check_sum_ranges(&[9]), Err(DataError::InvalidRange));
    }

    #[test]
    fn test_aliasing_storage() {
        use crate::binary::write::WritableFontData;

        let mut w = WritableFontData::new();
        w.write_bytes(0, &[1, 2, 3, 4]).unwrap();
        let r = w.readable();
        assert_eq!(r.read_u8(0), Ok(1));
        // Mutation through the writable view is visible to the aliasing
        // readable view.
        w.write_u8(0, 9).unwrap();
        assert_eq!(r.read_u8(0), Ok(9));
    }

    struct Pair {
        key: u16,
        value: u16,
    }

    impl ReadFixed for Pair {
        const SIZE: usize = size::U16 + size::U16;

        fn read(data: &ReadableFontData, offset: usize) -> Result<Self, DataError> {
            let key = data.read_u16be(offset)?;
            let value = data.read_u16be(offset + size::U16)?;
            Ok(Pair { key, value })
        }
    }

    #[test]
    fn test_read_array() {
        let d = data(&[0, 1, 0, 10, 0, 3, 0, 30, 0, 5, 0, 50]);
        let array = ReadArray::<Pair>::new(d, 3).unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.read_item(1).unwrap().value, 30);
        assert!(array.read_item(3).is_err());
        assert!(array.get_item(3).is_none());

        let keys: Vec<u16> = array.iter().map(|pair| pair.key).collect();
        assert_eq!(keys, &[1, 3, 5]);

        assert_eq!(array.binary_search_by(|pair| pair.key.cmp(&3)), Ok(1));
        assert_eq!(array.binary_search_by(|pair| pair.key.cmp(&4)), Err(2));
    }

    #[test]
    fn test_read_array_bounds() {
        let d = data(&[0; 8]);
        assert!(ReadArray::<Pair>::new(d.clone(), 2).is_ok());
        assert!(ReadArray::<Pair>::new(d, 3).is_err());
    }
}
