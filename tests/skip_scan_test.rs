use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use proxima::iterator::collect_entries;
use proxima::key::TERM_FREQUENCY_FAMILY;
use proxima::{Key, Range, SearchSpaceSet, SkipScanIterator, SortedKeyValueIterator, SortedListIterator};

const TERMS: &[&str] = &["brown", "dog", "fox", "jumps", "lazy", "over", "quick", "the"];
const FIELDS: &[&str] = &["BODY", "TEXT", "TITLE"];

fn qualifier(rng: &mut StdRng) -> String {
    let owner = rng.random_range(0..4);
    let term = TERMS[rng.random_range(0..TERMS.len())];
    let field = FIELDS[rng.random_range(0..FIELDS.len())];
    format!("datatype\0uid{owner}\0{term}\0{field}")
}

fn random_entries(rng: &mut StdRng) -> Vec<(Key, Vec<u8>)> {
    let count = rng.random_range(0..200);
    (0..count)
        .map(|i| {
            let row = format!("row{}", rng.random_range(0..4));
            let family = if rng.random_bool(0.7) { TERM_FREQUENCY_FAMILY } else { "fi\0TEXT" };
            (Key::new(row, family, qualifier(rng)), i.to_string().into_bytes())
        })
        .collect()
}

fn random_range(rng: &mut StdRng) -> Range {
    let low = rng.random_range(0..4);
    let high = rng.random_range(low..4);
    match rng.random_range(0..3) {
        0 => Range::all(),
        1 => Range::half_open(
            Key::with_family(format!("row{low}"), ""),
            Key::with_family(format!("row{high}"), "zz"),
        ),
        _ => Range::closed(
            Key::new(format!("row{low}"), TERM_FREQUENCY_FAMILY, qualifier(rng)),
            Key::new(format!("row{high}"), TERM_FREQUENCY_FAMILY, qualifier(rng)),
        ),
    }
}

#[test]
fn test_skip_scan_matches_linear_filter() -> proxima::Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let source = SortedListIterator::from_entries(random_entries(&mut rng));
        let space: SearchSpaceSet = (0..rng.random_range(0..12)).map(|_| qualifier(&mut rng)).collect();
        let range = random_range(&mut rng);

        let mut linear = source.clone();
        linear.seek(&range, &[TERM_FREQUENCY_FAMILY.as_bytes().to_vec()], true)?;
        let expected: Vec<(Key, Vec<u8>)> = collect_entries(&mut linear)?
            .into_iter()
            .filter(|(key, _)| space.contains(key.qualifier()))
            .collect();

        let mut skip = SkipScanIterator::new(Box::new(source), Arc::new(space));
        skip.seek(&range, &[], false)?;
        assert_eq!(collect_entries(&mut skip)?, expected, "range {range:?}");
    }
    Ok(())
}

#[test]
fn test_skip_scan_reseeks_once_per_gap() -> proxima::Result<()> {
    // Dense source: every term in one field for one owner.
    let entries = TERMS.iter().map(|term| {
        (
            Key::new("row0", TERM_FREQUENCY_FAMILY, format!("datatype\0uid0\0{term}\0TEXT")),
            Vec::new(),
        )
    });
    let source = SortedListIterator::from_entries(entries);
    let space: SearchSpaceSet = ["datatype\0uid0\0brown\0TEXT", "datatype\0uid0\0quick\0TEXT"]
        .into_iter()
        .collect();

    let mut skip = SkipScanIterator::new(Box::new(source), Arc::new(space));
    skip.seek(&Range::all(), &[], false)?;
    let found = collect_entries(&mut skip)?;

    assert_eq!(found.len(), 2);
    // One jump from `dog` to `quick`, one past the family after `the`.
    assert_eq!(skip.reseeks(), 2);
    Ok(())
}

#[test]
fn test_skip_scan_with_empty_search_space() -> proxima::Result<()> {
    let source = SortedListIterator::from_entries(vec![(
        Key::new("row0", TERM_FREQUENCY_FAMILY, "datatype\0uid0\0fox\0TEXT"),
        Vec::new(),
    )]);
    let mut skip = SkipScanIterator::new(Box::new(source), Arc::new(SearchSpaceSet::new()));
    skip.seek(&Range::all(), &[], false)?;
    assert!(!skip.has_top());
    assert_eq!(skip.reseeks(), 0);
    Ok(())
}
