use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use proxima::iterator::collect_entries;
use proxima::key::TERM_FREQUENCY_FAMILY;
use proxima::{Key, MemoryIndex, Range, SearchSpaceSet, SkipScanIterator, SortedKeyValueIterator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn build_index(owners: usize, terms: usize) -> MemoryIndex {
    let index = MemoryIndex::new();
    for owner in 0..owners {
        for term in 0..terms {
            index.insert_term_frequency("row0", "datatype", &format!("uid{owner}"), &format!("term{term}"), "TEXT", "1");
        }
    }
    index
}

fn random_candidates(count: usize, owners: usize, terms: usize) -> SearchSpaceSet {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let owner = rng.random_range(0..owners);
            let term = rng.random_range(0..terms);
            format!("datatype\0uid{owner}\0term{term}\0TEXT")
        })
        .collect()
}

fn bench_skip_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("Term Frequency Scan");
    let (owners, terms) = (50, 200);
    let snapshot = build_index(owners, terms).snapshot();
    let range = Range::exact(&Key::with_family("row0", TERM_FREQUENCY_FAMILY), proxima::PartialKey::RowFamily);
    group.throughput(Throughput::Elements((owners * terms) as u64));

    for candidates in [4, 64, 1024] {
        let space = Arc::new(random_candidates(candidates, owners, terms));

        group.bench_with_input(BenchmarkId::new("skip_scan", candidates), &space, |b, space| {
            b.iter(|| {
                let mut iter = SkipScanIterator::new(snapshot.deep_copy(), Arc::clone(space));
                iter.seek(&range, &[], false).unwrap();
                black_box(collect_entries(&mut iter).unwrap())
            })
        });

        group.bench_with_input(BenchmarkId::new("linear_filter", candidates), &space, |b, space| {
            b.iter(|| {
                let mut iter = snapshot.clone();
                iter.seek(&range, &[TERM_FREQUENCY_FAMILY.as_bytes().to_vec()], true).unwrap();
                let entries: Vec<_> = collect_entries(&mut iter)
                    .unwrap()
                    .into_iter()
                    .filter(|(key, _)| space.contains(key.qualifier()))
                    .collect();
                black_box(entries)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_skip_scan);
criterion_main!(benches);
