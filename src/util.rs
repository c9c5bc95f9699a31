use std::ops::Add;

use serde::Serialize;

/// Heap footprint of a structure: bytes in use and bytes allocated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub size: usize,
    pub capacity: usize,
}

impl MemoryUsage {
    pub fn of_vec<T>(v: &Vec<T>) -> Self {
        let width = std::mem::size_of::<T>();
        MemoryUsage {
            size: v.len() * width,
            capacity: v.capacity() * width,
        }
    }

    /// Boxed slices carry no spare capacity.
    pub fn of_slice<T>(v: &[T]) -> Self {
        let bytes = std::mem::size_of_val(v);
        MemoryUsage {
            size: bytes,
            capacity: bytes,
        }
    }
}

impl Add for MemoryUsage {
    type Output = MemoryUsage;

    fn add(self, other: MemoryUsage) -> MemoryUsage {
        MemoryUsage {
            size: self.size + other.size,
            capacity: self.capacity + other.capacity,
        }
    }
}

impl std::iter::Sum for MemoryUsage {
    fn sum<I: Iterator<Item = MemoryUsage>>(iter: I) -> Self {
        iter.fold(MemoryUsage::default(), Add::add)
    }
}
