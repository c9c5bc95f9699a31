//! Compressed suffix array built on the ψ function.
//!
//! For a rank `i`, `ψ(i)` is the rank of the suffix starting one byte after
//! the suffix at rank `i`. Ranks whose suffixes share a first byte form a
//! contiguous region, and inside a region ψ is strictly increasing, so each
//! region is stored as gamma coded gaps in blocks of `compress_step` values.
//!
//! The raw suffix array is dropped after construction. Every `sample_step`-th
//! entry is kept, and any other entry is recovered by following ψ until a
//! sampled rank is reached.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::gamma::GammaBlock;
use crate::searchable::{Probe, Searchable};
use crate::table::SuffixTable;
use crate::util::MemoryUsage;

const ALPHABET: usize = 256;

/// Inclusive range of ranks whose suffixes start with the same byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    #[inline]
    pub fn contains(&self, rank: usize) -> bool {
        self.start <= rank && rank <= self.end
    }

    #[inline]
    pub fn num_ranks(&self) -> usize {
        self.end - self.start + 1
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "RawPsiTable")]
pub struct PsiTable {
    /// Indexed by byte value; `None` for bytes absent from the text.
    regions: Vec<Option<Region>>,
    /// ψ blocks per byte value. The sentinel has none: ψ is undefined at rank 0.
    blocks: Vec<Vec<GammaBlock>>,
    sampled_table: Vec<usize>,
    sampled_bytes: Vec<u8>,
    config: IndexConfig,
    len: usize,
    text_rank: usize,
}

/// Field-for-field image of [`PsiTable`] as read from disk, checked before use.
#[derive(Deserialize)]
struct RawPsiTable {
    regions: Vec<Option<Region>>,
    blocks: Vec<Vec<GammaBlock>>,
    sampled_table: Vec<usize>,
    sampled_bytes: Vec<u8>,
    config: IndexConfig,
    len: usize,
    text_rank: usize,
}

impl TryFrom<RawPsiTable> for PsiTable {
    type Error = Error;

    /// Rejects shapes that would make lookups divide by zero or index out of
    /// bounds. Decoded ψ values are still checked lazily by the walks.
    fn try_from(raw: RawPsiTable) -> Result<Self> {
        let corrupt = |reason| Err(Error::CorruptIndex { reason });
        raw.config.validate()?;
        let n = raw.len;
        if n == 0 || raw.text_rank >= n {
            return corrupt("empty table or text rank out of range");
        }
        if raw.regions.len() != ALPHABET || raw.blocks.len() != ALPHABET {
            return corrupt("region tables must cover every byte value");
        }
        if raw.sampled_table.len() != n.div_ceil(raw.config.sample_step)
            || raw.sampled_bytes.len() != n.div_ceil(raw.config.sample_char_step)
        {
            return corrupt("sample count does not match sampling step");
        }
        if raw.sampled_table.iter().any(|&pos| pos >= n) {
            return corrupt("sampled offset past the end of the text");
        }

        let step = raw.config.compress_step;
        let mut next = 0;
        for (region, blocks) in raw.regions.iter().zip(&raw.blocks) {
            let Some(region) = region else {
                if !blocks.is_empty() {
                    return corrupt("blocks stored for an absent byte");
                }
                continue;
            };
            if region.start != next || region.end < region.start || region.end >= n {
                return corrupt("regions do not partition the ranks");
            }
            next = region.end + 1;

            if region.start == 0 {
                if !blocks.is_empty() {
                    return corrupt("blocks stored for the sentinel");
                }
                continue;
            }
            let expected = region.num_ranks().div_ceil(step);
            let last = region.num_ranks() - (expected - 1) * step;
            let sized = blocks.len() == expected
                && blocks.iter().enumerate().all(|(i, block)| {
                    block.len() == if i + 1 == expected { last } else { step }
                });
            if !sized {
                return corrupt("block sizes do not match compress_step");
            }
        }
        if next != n {
            return corrupt("regions do not partition the ranks");
        }

        Ok(PsiTable {
            regions: raw.regions,
            blocks: raw.blocks,
            sampled_table: raw.sampled_table,
            sampled_bytes: raw.sampled_bytes,
            config: raw.config,
            len: n,
            text_rank: raw.text_rank,
        })
    }
}

impl PsiTable {
    /// Builds the index from a text ending in its sentinel and the text's suffix array.
    pub fn new(
        text: &[u8],
        table: &[usize],
        compress_step: usize,
        sample_step: usize,
    ) -> Result<Self> {
        let config = IndexConfig {
            compress_step,
            sample_step,
            ..IndexConfig::default()
        };
        Self::with_config(text, table, &config)
    }

    pub fn from_table<T, U>(table: &SuffixTable<T, U>, config: &IndexConfig) -> Result<Self>
    where
        T: Deref<Target = [u8]> + Sync,
        U: Deref<Target = [usize]> + Sync,
    {
        Self::with_config(table.text(), table.table(), config)
    }

    pub fn with_config(text: &[u8], table: &[usize], config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        if text.len() != table.len() {
            return Err(Error::SizeMismatch {
                text: text.len(),
                table: table.len(),
            });
        }
        let (&sentinel, body) = text.split_last().ok_or(Error::InvalidSentinel)?;
        if body.iter().any(|&b| b <= sentinel) {
            return Err(Error::InvalidSentinel);
        }
        let n = text.len();

        let mut inverse = vec![usize::MAX; n];
        for (rank, &pos) in table.iter().enumerate() {
            match inverse.get_mut(pos) {
                Some(slot) if *slot == usize::MAX => *slot = rank,
                _ => return Err(Error::InvalidSuffixArray { rank }),
            }
        }
        if table[0] != n - 1 {
            return Err(Error::InvalidSuffixArray { rank: 0 });
        }

        let (regions, psi) = Self::convert_to_psi(text, table, &inverse)?;
        let blocks = Self::compress_psi(&regions, &psi, sentinel, config.compress_step);

        let sampled_table = table.iter().step_by(config.sample_step).copied().collect();
        let sampled_bytes = table
            .iter()
            .step_by(config.sample_char_step)
            .map(|&pos| text[pos])
            .collect();

        log::info!(
            "built psi table over {} suffixes (compress_step {}, sample_step {})",
            n,
            config.compress_step,
            config.sample_step
        );

        Ok(PsiTable {
            regions,
            blocks,
            sampled_table,
            sampled_bytes,
            config: *config,
            len: n,
            text_rank: inverse[0],
        })
    }

    /// Derives ψ from the inverse suffix array and records the byte regions.
    ///
    /// Fails if the table is not sorted: a byte whose ranks are split in two,
    /// or a region where ψ does not increase.
    fn convert_to_psi(
        text: &[u8],
        table: &[usize],
        inverse: &[usize],
    ) -> Result<(Vec<Option<Region>>, Vec<usize>)> {
        let n = text.len();
        let mut regions: Vec<Option<Region>> = vec![None; ALPHABET];
        let mut psi = vec![0usize; n];

        let mut open = (text[table[0]], 0usize);
        for rank in 1..n {
            let pos = table[rank];
            psi[rank] = *inverse
                .get(pos + 1)
                .ok_or(Error::InvalidSuffixArray { rank })?;

            let byte = text[pos];
            if byte != open.0 {
                if byte < open.0 || regions[byte as usize].is_some() {
                    return Err(Error::InvalidSuffixArray { rank });
                }
                regions[open.0 as usize] = Some(Region {
                    start: open.1,
                    end: rank - 1,
                });
                open = (byte, rank);
            } else if rank > 1 && psi[rank] <= psi[rank - 1] {
                return Err(Error::InvalidSuffixArray { rank });
            }
        }
        regions[open.0 as usize] = Some(Region {
            start: open.1,
            end: n - 1,
        });

        Ok((regions, psi))
    }

    /// Compresses each byte's ψ values independently, one region per rayon task.
    fn compress_psi(
        regions: &[Option<Region>],
        psi: &[usize],
        sentinel: u8,
        compress_step: usize,
    ) -> Vec<Vec<GammaBlock>> {
        (0..ALPHABET)
            .into_par_iter()
            .map(|c| match regions[c] {
                Some(region) if c != sentinel as usize => {
                    log::debug!("compressing region {:#04x} ({} ranks)", c, region.num_ranks());
                    psi[region.start..=region.end]
                        .chunks(compress_step)
                        .map(GammaBlock::new)
                        .collect::<Vec<_>>()
                }
                _ => Vec::new(),
            })
            .collect()
    }

    /// Number of suffixes, sentinel included.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Rank of the suffix covering the whole text.
    #[inline]
    pub fn text_rank(&self) -> usize {
        self.text_rank
    }

    pub fn region(&self, byte: u8) -> Option<Region> {
        self.regions[byte as usize]
    }

    /// First byte of the suffix at `rank`.
    ///
    /// Scans regions upwards from the byte sampled at or before `rank`.
    pub fn first_byte(&self, rank: usize) -> Option<u8> {
        if rank >= self.len {
            return None;
        }
        let &from = self.sampled_bytes.get(rank / self.config.sample_char_step)?;
        (from..=u8::MAX).find(|&c| self.regions[c as usize].is_some_and(|r| r.contains(rank)))
    }

    /// ψ at `rank`, or `None` at the sentinel's rank.
    pub fn psi(&self, rank: usize) -> Result<Option<usize>> {
        if rank == 0 {
            return Ok(None);
        }
        let c = self.first_byte(rank).ok_or(Error::DecodeExhausted {
            index: rank,
            len: self.len,
        })?;
        self.psi_in(c, rank).map(Some)
    }

    /// ψ at `rank`, given the region `rank` belongs to.
    fn psi_in(&self, c: u8, rank: usize) -> Result<usize> {
        let exhausted = Error::DecodeExhausted {
            index: rank,
            len: self.len,
        };
        let region = self.regions[c as usize].ok_or_else(|| exhausted.clone())?;
        let offset = rank - region.start;
        let block = self.blocks[c as usize]
            .get(offset / self.config.compress_step)
            .ok_or(exhausted)?;
        block.get(offset % self.config.compress_step)
    }

    pub fn memory_usage(&self) -> MemoryUsage {
        self.memory_parts().into_iter().map(|(_, usage)| usage).sum()
    }

    fn memory_parts(&self) -> [(&'static str, MemoryUsage); 4] {
        let blocks = MemoryUsage::of_vec(&self.blocks)
            + self
                .blocks
                .iter()
                .map(|b| {
                    MemoryUsage::of_vec(b)
                        + b.iter().map(GammaBlock::memory_usage).sum::<MemoryUsage>()
                })
                .sum::<MemoryUsage>();
        [
            ("regions", MemoryUsage::of_vec(&self.regions)),
            ("psi_blocks", blocks),
            ("sampled_table", MemoryUsage::of_vec(&self.sampled_table)),
            ("sampled_bytes", MemoryUsage::of_vec(&self.sampled_bytes)),
        ]
    }

    /// Gets breakdowns of memory usages for components.
    pub fn memory_statistics(&self) -> serde_json::Value {
        let mut stats = serde_json::Map::new();
        for (name, usage) in self.memory_parts() {
            stats.insert(name.to_string(), serde_json::json!(usage));
        }
        stats.insert("total".to_string(), serde_json::json!(self.memory_usage()));
        serde_json::Value::Object(stats)
    }
}

impl Searchable for PsiTable {
    fn num_suffixes(&self) -> usize {
        self.len
    }

    /// Rank 0 is the bare sentinel suffix; the search starts above it.
    fn first_rank(&self) -> usize {
        1
    }

    /// Walks ψ from `rank`, comparing one query byte per step.
    fn probe(&self, rank: usize, query: &[u8]) -> Result<Probe> {
        let mut cursor = rank;
        for (i, &q) in query.iter().enumerate() {
            let c = self.first_byte(cursor).ok_or(Error::DecodeExhausted {
                index: cursor,
                len: self.len,
            })?;
            if c < q {
                return Ok(Probe::Less);
            }
            if c > q {
                return Ok(Probe::Greater);
            }
            if cursor == 0 {
                // Matched the sentinel; the suffix ends here.
                return Ok(if i + 1 == query.len() {
                    Probe::Exact
                } else {
                    Probe::Less
                });
            }
            cursor = self.psi_in(c, cursor)?;
        }
        Ok(if cursor == 0 {
            Probe::Exact
        } else {
            Probe::Partial
        })
    }

    /// Follows ψ until a sampled rank, counting steps back from its text offset.
    fn locate(&self, rank: usize) -> Result<usize> {
        if rank >= self.len {
            return Err(Error::DecodeExhausted {
                index: rank,
                len: self.len,
            });
        }
        let walked_off = Error::CorruptIndex {
            reason: "psi walk ran past the start of the text",
        };
        let mut cursor = rank;
        let mut steps = 0;
        while cursor != 0 {
            if steps >= self.len {
                return Err(walked_off);
            }
            if cursor % self.config.sample_step == 0 {
                return self.sampled_table[cursor / self.config.sample_step]
                    .checked_sub(steps)
                    .ok_or(walked_off);
            }
            let c = self.first_byte(cursor).ok_or(Error::DecodeExhausted {
                index: cursor,
                len: self.len,
            })?;
            cursor = self.psi_in(c, cursor)?;
            steps += 1;
        }
        (self.len - 1).checked_sub(steps).ok_or(walked_off)
    }
}
