extern crate quickcheck;

use quickcheck::{QuickCheck, TestResult, Testable};
use rand::Rng;

use psiarray::loader::{normalize_ascii, prepare_text};
use psiarray::{Error, GammaBlock, Hit, IndexConfig, PsiTable, Searchable, SuffixTable};

fn doubling(text: &str) -> SuffixTable {
    SuffixTable::new(text.as_bytes())
}
fn naive(text: &str) -> SuffixTable {
    SuffixTable::new_naive(text.as_bytes())
}

fn psi(table: &SuffixTable, compress_step: usize, sample_step: usize) -> PsiTable {
    PsiTable::new(table.text(), table.table(), compress_step, sample_step).unwrap()
}

fn occurs(text: &[u8], query: &[u8]) -> bool {
    text.windows(query.len()).any(|w| w == query)
}

fn qc<T: Testable>(f: T) {
    QuickCheck::new().tests(500).max_tests(5000).quickcheck(f);
}

// These tests assume the correctness of the `naive` method of computing a
// suffix array.

#[test]
fn basic1() {
    assert_eq!(naive("apple"), doubling("apple"));
}

#[test]
fn basic2() {
    assert_eq!(naive("banana$"), doubling("banana$"));
}

#[test]
fn basic3() {
    assert_eq!(naive("mississippi"), doubling("mississippi"));
}

#[test]
fn basic4() {
    assert_eq!(naive("tgtgtgtgcaccg"), doubling("tgtgtgtgcaccg"));
}

#[test]
fn empty_is_ok() {
    assert_eq!(naive(""), doubling(""));
}

#[test]
fn one_is_ok() {
    assert_eq!(naive("a"), doubling("a"));
}

#[test]
fn two_same_is_ok() {
    assert_eq!(naive("aa"), doubling("aa"));
}

#[test]
fn nul_is_ok() {
    assert_eq!(naive("\x00\x00a\x00"), doubling("\x00\x00a\x00"));
}

#[test]
fn prop_naive_equals_doubling() {
    fn prop(s: Vec<u8>) -> bool {
        SuffixTable::new(s.clone()) == SuffixTable::new_naive(s)
    }
    qc(prop as fn(Vec<u8>) -> bool);
}

#[test]
fn prop_table_is_sorted_permutation() {
    fn prop(s: Vec<u8>) -> bool {
        let table = SuffixTable::new(prepare_text(&s));
        let mut seen = table.table().to_vec();
        seen.sort_unstable();
        seen == (0..table.len()).collect::<Vec<_>>()
            && table
                .table()
                .windows(2)
                .all(|w| table.text()[w[0]..] <= table.text()[w[1]..])
    }
    qc(prop as fn(Vec<u8>) -> bool);
}

#[test]
fn prop_regions_partition_ranks() {
    fn prop(s: Vec<u8>) -> bool {
        let table = SuffixTable::new(prepare_text(&s));
        let index = psi(&table, 4, 4);
        let mut next = 0;
        for byte in 0..=u8::MAX {
            if let Some(region) = index.region(byte) {
                if region.start != next || region.end < region.start {
                    return false;
                }
                if (region.start..=region.end).any(|rank| table.suffix(rank)[0] != byte) {
                    return false;
                }
                next = region.end + 1;
            }
        }
        next == table.len()
    }
    qc(prop as fn(Vec<u8>) -> bool);
}

#[test]
fn prop_psi_round_trip() {
    fn prop(s: Vec<u8>, step: u8) -> bool {
        let table = SuffixTable::new(prepare_text(&s));
        let index = psi(&table, step as usize % 9 + 1, 4);
        let mut inverse = vec![0; table.len()];
        for (rank, &pos) in table.table().iter().enumerate() {
            inverse[pos] = rank;
        }
        (1..table.len()).all(|rank| {
            index.psi(rank) == Ok(Some(inverse[table.table()[rank] + 1]))
        }) && index.psi(0) == Ok(None)
    }
    qc(prop as fn(Vec<u8>, u8) -> bool);
}

#[test]
fn prop_locate_is_inverse_of_rank() {
    fn prop(s: Vec<u8>, step: u8) -> bool {
        let table = SuffixTable::new(prepare_text(&s));
        let index = psi(&table, 3, step as usize % 17 + 1);
        let mut inverse = vec![0; table.len()];
        for (rank, &pos) in table.table().iter().enumerate() {
            inverse[pos] = rank;
        }
        (0..table.len()).all(|rank| {
            let offset = index.locate(rank).unwrap();
            offset == table.table()[rank] && inverse[offset] == rank
        })
    }
    qc(prop as fn(Vec<u8>, u8) -> bool);
}

#[test]
fn prop_present_queries_agree() {
    fn prop(s: Vec<u8>, start: usize, len: u8) -> TestResult {
        let text = prepare_text(&s);
        let body = text.len() - 1;
        if body == 0 {
            return TestResult::discard();
        }
        let start = start % body;
        let end = (start + 1 + len as usize % 8).min(body);
        let query = &text[start..end];

        let table = SuffixTable::new(text.clone());
        let index = psi(&table, 5, 7);
        let (Some(a), Some(b)) = (table.find(query).unwrap(), index.find(query).unwrap()) else {
            return TestResult::failed();
        };
        TestResult::from_bool(
            text[a.value()..].starts_with(query) && text[b.value()..].starts_with(query),
        )
    }
    qc(prop as fn(Vec<u8>, usize, u8) -> TestResult);
}

#[test]
fn prop_absent_queries_agree() {
    fn prop(s: Vec<u8>, q: Vec<u8>) -> TestResult {
        let text = prepare_text(&s);
        let query = normalize_ascii(&q);
        if query.is_empty() || occurs(&text, &query) {
            return TestResult::discard();
        }
        let table = SuffixTable::new(text);
        let index = psi(&table, 2, 3);
        TestResult::from_bool(
            table.find(&query).unwrap().is_none() && index.find(&query).unwrap().is_none(),
        )
    }
    qc(prop as fn(Vec<u8>, Vec<u8>) -> TestResult);
}

#[test]
fn mississippi_issi() {
    let text = b"mississippi$";
    let table = SuffixTable::new(&text[..]);
    for hit in [
        table.find(b"issi").unwrap().unwrap(),
        psi(&table, 2, 2).find(b"issi").unwrap().unwrap(),
    ] {
        let offset = hit.value();
        assert!(offset == 1 || offset == 4);
        assert_eq!(&text[offset..offset + 4], b"issi");
    }
}

#[test]
fn gamma_sequence_round_trip() {
    let block = GammaBlock::new(&[5, 8, 12, 20]);
    let decoded: Vec<usize> = (0..4).map(|i| block.get(i).unwrap()).collect();
    assert_eq!(decoded, vec![5, 8, 12, 20]);
    assert!(block.get(4).is_err());
}

#[test]
fn compress_step_one_round_trips() {
    let table = SuffixTable::new(prepare_text(b"abracadabra alakazam"));
    let index = psi(&table, 1, 1);
    for rank in 0..table.len() {
        assert_eq!(index.locate(rank).unwrap(), table.table()[rank]);
    }
    assert_eq!(index.find(b"kaz").unwrap(), Some(Hit::Partial(15)));
}

#[test]
fn empty_query_is_never_found() {
    let table = SuffixTable::new(prepare_text(b"anything"));
    let index = psi(&table, 4, 4);
    assert_eq!(index.find_rank(b"").unwrap(), None);
    assert_eq!(table.find(b"").unwrap(), None);
}

#[test]
fn single_byte_text() {
    let table = SuffixTable::new(prepare_text(b""));
    let index = psi(&table, 4, 4);
    assert_eq!(index.len(), 1);
    assert_eq!(index.find(b"a").unwrap(), None);
    assert_eq!(index.locate(0).unwrap(), 0);
}

#[test]
fn size_mismatch_fails_fast() {
    let text = prepare_text(b"banana");
    let result = SuffixTable::from_parts(text.clone(), vec![0usize; text.len() + 1]);
    assert_eq!(
        result.unwrap_err(),
        Error::SizeMismatch {
            text: 7,
            table: 8
        }
    );
    assert!(PsiTable::new(&text, &[6, 5], 4, 4).is_err());
}

#[test]
fn serialized_index_answers_the_same() {
    let table = SuffixTable::new(prepare_text(b"she sells sea shells by the sea shore"));
    let index = PsiTable::from_table(&table, &IndexConfig::default()).unwrap();
    let bytes = bincode::serialize(&index).unwrap();
    let restored: PsiTable = bincode::deserialize(&bytes).unwrap();
    for query in [&b"sea"[..], &b"shells"[..], &b"shore"[..], &b"sheep"[..]] {
        assert_eq!(index.find(query).unwrap(), restored.find(query).unwrap());
    }
}

#[test]
fn random_text_small_alphabet() {
    let mut rng = rand::thread_rng();
    let body: Vec<u8> = (0..4000).map(|_| rng.gen_range(b'a'..=b'd')).collect();
    let table = SuffixTable::new(prepare_text(&body));
    assert!(table.is_sorted());

    let config = IndexConfig {
        compress_step: 16,
        sample_step: 8,
        sample_char_step: 64,
    };
    let index = PsiTable::from_table(&table, &config).unwrap();
    for _ in 0..200 {
        let start = rng.gen_range(0..body.len() - 12);
        let len = rng.gen_range(1..12);
        let query = &body[start..start + len];
        let hit = index.find(query).unwrap().unwrap();
        assert!(table.text()[hit.value()..].starts_with(query));
    }
    assert_eq!(index.find(b"e").unwrap(), None);
    assert!(index.memory_usage().size > 0);
}

#[test]
fn tampered_index_fails_to_load() {
    let table = SuffixTable::new(prepare_text(b"she sells sea shells"));
    let index = PsiTable::from_table(&table, &IndexConfig::default()).unwrap();
    let mut bytes = bincode::serialize(&index).unwrap();

    // The trailing fields are compress_step, sample_step, sample_char_step, len and text_rank.
    let sample_step = bytes.len() - 4 * 8;
    bytes[sample_step..sample_step + 8].copy_from_slice(&0u64.to_le_bytes());
    assert!(bincode::deserialize::<PsiTable>(&bytes).is_err());

    let mut bytes = bincode::serialize(&index).unwrap();
    let len = bytes.len() - 2 * 8;
    bytes[len..len + 8].copy_from_slice(&1000u64.to_le_bytes());
    assert!(bincode::deserialize::<PsiTable>(&bytes).is_err());
}
