//! Named hash-function family used to place entities and instances on the
//! consistent-hash ring.
//!
//! Every family exposes the same streaming builder: a caller mixes `put_long`,
//! `put_int`, and `put_string` calls in whatever order the algorithm needs,
//! then calls `finish()` to get a [`HashCode`] convertible to `i32` or `i64`.
//! `put_int`/`put_long` append the big-endian bytes of the value; `put_string`
//! appends the raw UTF-8 bytes with no length prefix. This byte encoding is
//! wire-visible and must not change independent of the family itself.

use std::io::Cursor;

use md5::{Digest, Md5};

use crate::error::FabricError;

/// A named hash-function family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFunction {
    Murmur3_32,
    Murmur3_128,
    Crc32,
    Md5,
}

impl HashFunction {
    /// Resolves a configured hash-function name, failing fast on anything
    /// unrecognized. Unknown names are a fatal startup error, never a
    /// runtime one.
    pub fn from_name(name: &str) -> Result<Self, FabricError> {
        match name {
            "murmur3_32" => Ok(Self::Murmur3_32),
            "murmur3_128" => Ok(Self::Murmur3_128),
            "crc32" => Ok(Self::Crc32),
            "md5" => Ok(Self::Md5),
            other => Err(FabricError::UnknownHashFunction {
                name: other.to_string(),
            }),
        }
    }

    /// Starts a new streaming builder for this family.
    #[must_use]
    pub fn builder(self) -> HashBuilder {
        HashBuilder {
            algo: self,
            buf: Vec::new(),
        }
    }
}

/// Accumulates input bytes for one hash computation.
///
/// Not reusable once `finish()` is called -- each resolution or ring
/// placement gets a fresh builder.
#[derive(Debug, Clone)]
pub struct HashBuilder {
    algo: HashFunction,
    buf: Vec<u8>,
}

impl HashBuilder {
    /// Appends the big-endian bytes of a 64-bit signed value.
    pub fn put_long(mut self, value: i64) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends the big-endian bytes of a 32-bit signed value.
    pub fn put_int(mut self, value: i32) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends the raw UTF-8 bytes of a string, unprefixed.
    pub fn put_string(mut self, value: &str) -> Self {
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Computes the digest over everything accumulated so far.
    #[must_use]
    pub fn finish(self) -> HashCode {
        let digest = match self.algo {
            HashFunction::Murmur3_32 => {
                let mut cursor = Cursor::new(&self.buf);
                let v = murmur3::murmur3_32(&mut cursor, 0)
                    .expect("murmur3_32 over an in-memory buffer cannot fail");
                v.to_be_bytes().to_vec()
            }
            HashFunction::Murmur3_128 => {
                let mut cursor = Cursor::new(&self.buf);
                let v = murmur3::murmur3_x64_128(&mut cursor, 0)
                    .expect("murmur3_128 over an in-memory buffer cannot fail");
                v.to_be_bytes().to_vec()
            }
            HashFunction::Crc32 => crc32fast::hash(&self.buf).to_be_bytes().to_vec(),
            HashFunction::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(&self.buf);
                hasher.finalize().to_vec()
            }
        };
        HashCode { digest }
    }
}

/// A finished hash code, convertible to the widths the ring and the
/// partition resolver need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashCode {
    digest: Vec<u8>,
}

impl HashCode {
    /// The first 4 digest bytes, big-endian, as a signed 32-bit integer.
    #[must_use]
    pub fn as_i32(&self) -> i32 {
        let mut buf = [0u8; 4];
        let n = self.digest.len().min(4);
        buf[..n].copy_from_slice(&self.digest[..n]);
        i32::from_be_bytes(buf)
    }

    /// The first 8 digest bytes, big-endian, as a signed 64-bit integer.
    /// Families with a 4-byte digest occupy the high-order bytes, leaving
    /// the low-order bytes zero; the mapping stays deterministic and
    /// injective over the 32-bit input domain.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        let mut buf = [0u8; 8];
        let n = self.digest.len().min(8);
        buf[..n].copy_from_slice(&self.digest[..n]);
        i64::from_be_bytes(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_recognizes_all_families() {
        assert_eq!(
            HashFunction::from_name("murmur3_32").unwrap(),
            HashFunction::Murmur3_32
        );
        assert_eq!(
            HashFunction::from_name("murmur3_128").unwrap(),
            HashFunction::Murmur3_128
        );
        assert_eq!(HashFunction::from_name("crc32").unwrap(), HashFunction::Crc32);
        assert_eq!(HashFunction::from_name("md5").unwrap(), HashFunction::Md5);
    }

    #[test]
    fn from_name_rejects_unknown() {
        let err = HashFunction::from_name("sha256").unwrap_err();
        assert!(matches!(err, FabricError::UnknownHashFunction { name } if name == "sha256"));
    }

    #[test]
    fn deterministic_across_calls() {
        for algo in [
            HashFunction::Murmur3_32,
            HashFunction::Murmur3_128,
            HashFunction::Crc32,
            HashFunction::Md5,
        ] {
            let a = algo.builder().put_string("service-a").put_int(3).finish();
            let b = algo.builder().put_string("service-a").put_int(3).finish();
            assert_eq!(a.as_i32(), b.as_i32());
            assert_eq!(a.as_i64(), b.as_i64());
        }
    }

    #[test]
    fn different_inputs_usually_differ() {
        for algo in [
            HashFunction::Murmur3_32,
            HashFunction::Murmur3_128,
            HashFunction::Crc32,
            HashFunction::Md5,
        ] {
            let a = algo.builder().put_string("service-a").put_int(3).finish();
            let b = algo.builder().put_string("service-b").put_int(3).finish();
            assert_ne!(a.as_i64(), b.as_i64());
        }
    }

    #[test]
    fn put_long_is_big_endian() {
        let code = HashFunction::Crc32.builder().put_long(1).finish();
        let expected = crc32fast::hash(&1i64.to_be_bytes());
        assert_eq!(code.as_i32(), expected as i32);
    }

    #[test]
    fn put_string_has_no_length_prefix() {
        let a = HashFunction::Crc32.builder().put_string("ab").finish();
        let b = HashFunction::Crc32.builder().put_string("a").put_string("b").finish();
        assert_eq!(a.as_i32(), b.as_i32());
    }

    #[test]
    fn as_i64_zero_pads_four_byte_digests() {
        let code = HashFunction::Crc32.builder().put_int(42).finish();
        assert_eq!(code.as_i64() >> 32, i64::from(code.as_i32()));
    }
}
