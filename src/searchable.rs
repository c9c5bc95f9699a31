use crate::error::Result;

/// A located occurrence of a query.
///
/// The carried value is a suffix array rank or a text offset depending on
/// which search produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    /// The suffix is the query followed only by the sentinel.
    Exact(usize),
    /// The query is a proper prefix of the suffix.
    Partial(usize),
}

impl Hit {
    #[inline]
    pub fn value(self) -> usize {
        match self {
            Hit::Exact(x) | Hit::Partial(x) => x,
        }
    }

    #[inline]
    pub fn is_exact(self) -> bool {
        matches!(self, Hit::Exact(_))
    }

    /// Applies `f` to the carried value, keeping the variant.
    pub fn try_map<F, E>(self, f: F) -> std::result::Result<Hit, E>
    where
        F: FnOnce(usize) -> std::result::Result<usize, E>,
    {
        Ok(match self {
            Hit::Exact(x) => Hit::Exact(f(x)?),
            Hit::Partial(x) => Hit::Partial(f(x)?),
        })
    }
}

/// Result of comparing the suffix at one rank against a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    /// The suffix sorts before every suffix starting with the query.
    Less,
    /// The suffix sorts after every suffix starting with the query.
    Greater,
    Exact,
    Partial,
}

/// Substring search over the ranks of a suffix-sorted text.
///
/// Implementors only say how to compare one rank against a query and how to
/// turn a rank into a text offset; the binary search is shared.
pub trait Searchable {
    /// Number of suffixes, sentinel included.
    fn num_suffixes(&self) -> usize;

    /// Lowest rank visited by the search.
    fn first_rank(&self) -> usize {
        0
    }

    fn probe(&self, rank: usize, query: &[u8]) -> Result<Probe>;

    /// Text offset of the suffix at `rank`.
    fn locate(&self, rank: usize) -> Result<usize>;

    /// Binary search for a rank whose suffix starts with `query`.
    ///
    /// An exact hit is returned as soon as it is probed. Otherwise the
    /// search keeps narrowing towards smaller ranks and returns the last
    /// partial hit it saw. The empty query never matches.
    fn find_rank(&self, query: &[u8]) -> Result<Option<Hit>> {
        if query.is_empty() {
            return Ok(None);
        }

        let (mut left, mut right) = (self.first_rank(), self.num_suffixes());
        let mut partial = None;
        while left < right {
            let mid = left + (right - left) / 2;
            match self.probe(mid, query)? {
                Probe::Exact => return Ok(Some(Hit::Exact(mid))),
                Probe::Less => left = mid + 1,
                Probe::Greater => right = mid,
                Probe::Partial => {
                    partial = Some(Hit::Partial(mid));
                    right = mid;
                }
            }
        }
        Ok(partial)
    }

    /// Like [`Searchable::find_rank`], with the rank resolved to a text offset.
    fn find(&self, query: &[u8]) -> Result<Option<Hit>> {
        self.find_rank(query)?
            .map(|hit| hit.try_map(|rank| self.locate(rank)))
            .transpose()
    }
}
