//! Elias-gamma coding of increasing integer runs.
//!
//! A [`GammaBlock`] keeps the first value of a run verbatim and stores every
//! following value as the gamma code of its difference to the previous one.
//! Bits are packed least-significant first within each byte, so bit `pos`
//! lives in byte `pos / 8` at bit `pos % 8`.
//!
//! Decoding the `k`-th value scans the first `k` codes, so the block length
//! bounds the cost of a lookup.
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::MemoryUsage;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GammaBlock {
    first: usize,
    len: usize,
    bits: Vec<u8>,
}

impl GammaBlock {
    /// Compresses a strictly increasing run of values.
    ///
    /// # Panics
    ///
    /// Panics if two consecutive values are not strictly increasing, since the
    /// gamma code has no representation for a zero gap.
    pub fn new(values: &[usize]) -> Self {
        let Some(&first) = values.first() else {
            return Self::default();
        };

        let mut writer = BitWriter::default();
        for pair in values.windows(2) {
            assert!(pair[1] > pair[0], "gamma coded runs must be strictly increasing");
            writer.write_gamma(pair[1] - pair[0]);
        }

        GammaBlock {
            first,
            len: values.len(),
            bits: writer.finish(),
        }
    }

    /// Number of values stored in the block.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The verbatim leading value.
    #[inline]
    pub fn first(&self) -> usize {
        self.first
    }

    /// Decodes the value at `index` by summing the first `index` gaps.
    pub fn get(&self, index: usize) -> Result<usize> {
        let exhausted = Error::DecodeExhausted {
            index,
            len: self.len,
        };
        if index >= self.len {
            return Err(exhausted);
        }

        let mut reader = BitReader::new(&self.bits);
        let mut value = self.first;
        for _ in 0..index {
            let gap = reader.read_gamma().ok_or_else(|| exhausted.clone())?;
            value = value.checked_add(gap).ok_or_else(|| exhausted.clone())?;
        }
        Ok(value)
    }

    /// Decodes the whole block.
    pub fn to_vec(&self) -> Result<Vec<usize>> {
        let mut out = Vec::with_capacity(self.len);
        if self.is_empty() {
            return Ok(out);
        }

        let mut reader = BitReader::new(&self.bits);
        let mut value = self.first;
        out.push(value);
        for index in 1..self.len {
            value = reader
                .read_gamma()
                .and_then(|gap| value.checked_add(gap))
                .ok_or(Error::DecodeExhausted {
                    index,
                    len: self.len,
                })?;
            out.push(value);
        }
        Ok(out)
    }

    /// Heap bytes held by the packed bitstream.
    pub fn memory_usage(&self) -> MemoryUsage {
        MemoryUsage::of_vec(&self.bits)
    }
}

#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    pos: usize,
}

impl BitWriter {
    fn write_bit(&mut self, bit: bool) {
        if self.pos % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(byte) = self.bytes.last_mut() {
                *byte |= 1 << (self.pos % 8);
            }
        }
        self.pos += 1;
    }

    /// `length - 1` zeros, a stop bit, then the low `length - 1` bits of `x`
    /// from the most significant down.
    fn write_gamma(&mut self, x: usize) {
        debug_assert!(x >= 1);
        let length = (usize::BITS - x.leading_zeros()) as usize;
        for _ in 0..length - 1 {
            self.write_bit(false);
        }
        self.write_bit(true);
        for i in (0..length - 1).rev() {
            self.write_bit((x >> i) & 1 == 1);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes.shrink_to_fit();
        self.bytes
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        BitReader { bytes, pos: 0 }
    }

    #[inline]
    fn read_bit(&mut self) -> Option<bool> {
        let byte = self.bytes.get(self.pos / 8)?;
        let bit = (byte >> (self.pos % 8)) & 1 == 1;
        self.pos += 1;
        Some(bit)
    }

    /// Returns `None` once the stream runs out mid-code.
    fn read_gamma(&mut self) -> Option<usize> {
        let mut length = 1usize;
        while !self.read_bit()? {
            length += 1;
        }
        if length > usize::BITS as usize {
            return None;
        }

        let mut x = 1usize << (length - 1);
        for i in (0..length - 1).rev() {
            if self.read_bit()? {
                x |= 1 << i;
            }
        }
        Some(x)
    }
}
