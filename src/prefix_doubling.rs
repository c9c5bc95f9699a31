// Manber-Myers prefix doubling for suffix array construction.
//
// Each round sorts positions by the pair (rank of the prefix of length `step`,
// rank of the prefix of length `step` starting `step` bytes later) with a
// two-pass LSD radix sort, then renames the pairs to dense ranks. After the
// round for `step` the ranks order prefixes of length `2 * step`, so the loop
// ends once every rank is distinct or `step` reaches the text length.
//
// Rank 0 is reserved for "past the end of the text". Byte ranks start at 1
// and renamed ranks at 1 so a suffix that runs out sorts before any suffix
// that continues.

/// Builds the suffix array of `text` in `O(n log n)` time.
pub fn suffix_array(text: &[u8]) -> Vec<usize> {
    let n = text.len();
    let mut bucket: Vec<usize> = (0..n).collect();
    if n <= 1 {
        return bucket;
    }

    let mut rank: Vec<usize> = text.iter().map(|&b| b as usize + 1).collect();
    let mut next_rank = vec![0usize; n];
    let mut step = 1;
    while step < n {
        radix_sort_pairs(&rank, &mut bucket, step);

        next_rank[bucket[0]] = 1;
        for i in 1..n {
            let bump = !same_rank_as_prev(&rank, &bucket, i, step);
            next_rank[bucket[i]] = next_rank[bucket[i - 1]] + bump as usize;
        }
        std::mem::swap(&mut rank, &mut next_rank);

        let distinct = rank[bucket[n - 1]];
        log::debug!("prefix doubling: step {} produced {} distinct ranks", step, distinct);
        if distinct == n {
            break;
        }
        step *= 2;
    }
    bucket
}

#[inline]
fn second_key(rank: &[usize], i: usize, step: usize) -> usize {
    rank.get(i + step).copied().unwrap_or(0)
}

/// Stable sort of all positions by `(rank[i], rank[i + step])`, written into `bucket`.
fn radix_sort_pairs(rank: &[usize], bucket: &mut [usize], step: usize) {
    let n = rank.len();
    let max_rank = rank.iter().copied().max().unwrap_or(0) + 1;
    let mut count = vec![0usize; max_rank];
    let mut by_second = vec![0usize; n];

    // Pass 1: counting sort on the secondary key.
    for i in 0..n {
        count[second_key(rank, i, step)] += 1;
    }
    for k in 1..max_rank {
        count[k] += count[k - 1];
    }
    for i in (0..n).rev() {
        let key = second_key(rank, i, step);
        count[key] -= 1;
        by_second[count[key]] = i;
    }

    // Pass 2: stable counting sort on the primary key.
    count.fill(0);
    for &r in rank {
        count[r] += 1;
    }
    for k in 1..max_rank {
        count[k] += count[k - 1];
    }
    for &i in by_second.iter().rev() {
        let key = rank[i];
        count[key] -= 1;
        bucket[count[key]] = i;
    }
}

fn same_rank_as_prev(rank: &[usize], bucket: &[usize], i: usize, step: usize) -> bool {
    let (cur, prev) = (bucket[i], bucket[i - 1]);
    if rank[cur] != rank[prev] {
        return false;
    }
    let n = rank.len();
    if cur + step >= n || prev + step >= n {
        return cur + step >= n && prev + step >= n;
    }
    rank[cur + step] == rank[prev + step]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(text: &[u8]) -> Vec<usize> {
        let mut sa: Vec<usize> = (0..text.len()).collect();
        sa.sort_by(|&a, &b| text[a..].cmp(&text[b..]));
        sa
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(suffix_array(b""), Vec::<usize>::new());
        assert_eq!(suffix_array(b"a"), vec![0]);
    }

    #[test]
    fn test_mississippi() {
        assert_eq!(
            suffix_array(b"mississippi$"),
            vec![11, 10, 7, 4, 1, 0, 9, 8, 6, 3, 5, 2]
        );
    }

    #[test]
    fn test_repeated_characters() {
        assert_eq!(suffix_array(b"aaaa"), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_zero_bytes_in_text() {
        let text = [1u8, 0, 1, 0, 0];
        assert_eq!(suffix_array(&text), naive(&text));
    }

    #[test]
    fn test_descending_sequence() {
        let text = [5u8, 4, 3, 2, 1];
        assert_eq!(suffix_array(&text), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_longer_sequence() {
        let text: Vec<u8> = (0..1000u32).map(|x| ((x * 17 + 11) % 7) as u8).collect();
        assert_eq!(suffix_array(&text), naive(&text));
    }
}
