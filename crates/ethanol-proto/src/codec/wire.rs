// ── Primitive wire encoding ──
//
// Little-endian fixed-width numbers, length-prefixed strings, and
// count-prefixed arrays. Every payload schema is built from these.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::Error;

/// Append-only encoder over a `BytesMut`.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write a 4-byte length or count, rejecting values that do not fit in `i32`.
    pub(crate) fn put_len(&mut self, len: usize, what: &'static str) -> Result<(), Error> {
        let len = i32::try_from(len)
            .map_err(|_| Error::malformed(format!("{what} length {len} exceeds i32")))?;
        self.buf.put_i32_le(len);
        Ok(())
    }

    /// Overwrite an `i32` previously written at `offset`.
    pub(crate) fn patch_i32(&mut self, offset: usize, value: i32) {
        if let Some(slot) = self.buf.get_mut(offset..offset + 4) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
    }

    pub fn into_bytes(self) -> BytesMut {
        self.buf
    }
}

/// Bounds-checked decoder over a byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    consumed: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, consumed: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    fn need(&self, n: usize, what: &str) -> Result<(), Error> {
        if self.buf.remaining() < n {
            return Err(Error::malformed(format!(
                "truncated {what}: need {n} bytes, {} left",
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub(crate) fn take_bytes(&mut self, n: usize, what: &str) -> Result<&'a [u8], Error> {
        self.need(n, what)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        self.consumed += n;
        Ok(head)
    }

    /// Read a 4-byte length prefix. Non-positive lengths yield 0.
    pub(crate) fn take_len(&mut self, what: &str) -> Result<usize, Error> {
        let raw = i32::take(self)?;
        let len = usize::try_from(raw).unwrap_or(0);
        self.need(len, what)?;
        Ok(len)
    }

    /// Read a 4-byte element count. Negative counts are rejected.
    pub(crate) fn take_count(&mut self, what: &str) -> Result<usize, Error> {
        let raw = i32::take(self)?;
        usize::try_from(raw).map_err(|_| Error::malformed(format!("negative {what} count {raw}")))
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = self.buf;
        self.consumed += rest.len();
        self.buf = &[];
        rest
    }
}

/// A value with a fixed wire layout.
pub trait Wire: Sized {
    fn put(&self, w: &mut Writer) -> Result<(), Error>;
    fn take(r: &mut Reader<'_>) -> Result<Self, Error>;
}

macro_rules! wire_number {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl Wire for $ty {
                fn put(&self, w: &mut Writer) -> Result<(), Error> {
                    w.buf.$put(*self);
                    Ok(())
                }

                fn take(r: &mut Reader<'_>) -> Result<Self, Error> {
                    r.need(size_of::<$ty>(), stringify!($ty))?;
                    r.consumed += size_of::<$ty>();
                    Ok(r.buf.$get())
                }
            }
        )*
    };
}

wire_number! {
    i8  => put_i8, get_i8;
    u8  => put_u8, get_u8;
    i32 => put_i32_le, get_i32_le;
    u32 => put_u32_le, get_u32_le;
    i64 => put_i64_le, get_i64_le;
    u64 => put_u64_le, get_u64_le;
    f32 => put_f32_le, get_f32_le;
    f64 => put_f64_le, get_f64_le;
}

/// Booleans travel as a signed byte; any non-zero value reads as `true`.
impl Wire for bool {
    fn put(&self, w: &mut Writer) -> Result<(), Error> {
        i8::from(*self).put(w)
    }

    fn take(r: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(i8::take(r)? != 0)
    }
}

/// Strings are a 4-byte length followed by exactly that many bytes.
/// An empty string is written as length 0 with no content.
impl Wire for String {
    fn put(&self, w: &mut Writer) -> Result<(), Error> {
        w.put_len(self.len(), "string")?;
        w.put_slice(self.as_bytes());
        Ok(())
    }

    fn take(r: &mut Reader<'_>) -> Result<Self, Error> {
        let len = r.take_len("string")?;
        let raw = r.take_bytes(len, "string")?;
        String::from_utf8(raw.to_vec())
            .map_err(|err| Error::malformed(format!("string is not UTF-8: {err}")))
    }
}

/// Arrays are a 4-byte element count followed by the elements.
impl<T: Wire> Wire for Vec<T> {
    fn put(&self, w: &mut Writer) -> Result<(), Error> {
        w.put_len(self.len(), "array")?;
        for item in self {
            item.put(w)?;
        }
        Ok(())
    }

    fn take(r: &mut Reader<'_>) -> Result<Self, Error> {
        let count = r.take_count("array")?;
        // Every element occupies at least one byte, so a count larger than
        // the remaining input cannot be satisfied.
        if count > r.remaining() {
            return Err(Error::malformed(format!(
                "array count {count} exceeds remaining {} bytes",
                r.remaining()
            )));
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::take(r)?);
        }
        Ok(items)
    }
}

/// Declare a payload struct whose fields are encoded in declaration order.
macro_rules! wire_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty ),*
        }

        impl $crate::codec::wire::Wire for $name {
            #[allow(unused_variables)]
            fn put(
                &self,
                w: &mut $crate::codec::wire::Writer,
            ) -> Result<(), $crate::error::Error> {
                #[allow(unused_imports)]
                use $crate::codec::wire::Wire as _;
                $( self.$field.put(w)?; )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn take(
                r: &mut $crate::codec::wire::Reader<'_>,
            ) -> Result<Self, $crate::error::Error> {
                Ok(Self {
                    $( $field: $crate::codec::wire::Wire::take(r)?, )*
                })
            }
        }
    };
}

pub(crate) use wire_struct;
