use std::sync::Mutex;

use primebench::{partition_ranges, Cursor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn check_ranges(len: usize, workers: usize) {
    let ranges = partition_ranges(len, workers).unwrap();
    assert_eq!(ranges.len(), workers);

    // Contiguous and covering [0, len)
    let mut expected_low = 0;
    for range in &ranges {
        assert_eq!(range.start, expected_low, "gap or overlap for {}/{}", len, workers);
        assert!(range.end >= range.start);
        expected_low = range.end;
    }
    assert_eq!(expected_low, len);

    let lens: Vec<usize> = ranges.iter().map(|r| r.len()).collect();
    let min = *lens.iter().min().unwrap();
    let max = *lens.iter().max().unwrap();
    assert!(max - min <= 1, "uneven split for {}/{}: {:?}", len, workers, lens);

    if min != max {
        let larger = lens.iter().filter(|&&l| l == max).count();
        assert_eq!(larger, len % workers);
    } else {
        assert_eq!(len % workers, 0);
    }
}

#[test]
fn test_static_partition_coverage() {
    for len in 0..60 {
        for workers in 1..20 {
            check_ranges(len, workers);
        }
    }
}

#[test]
fn test_static_partition_random_sizes() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let len = rng.gen_range(0..100_000);
        let workers = rng.gen_range(1..300);
        check_ranges(len, workers);
    }
}

#[test]
fn test_cursor_claims_each_index_once() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..20 {
        let len = rng.gen_range(0..5_000);
        let workers = rng.gen_range(1..24);
        let cursor = Cursor::new(len);
        let claims = Mutex::new(Vec::with_capacity(len));

        crossbeam::thread::scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| {
                    let mut mine = Vec::new();
                    while let Some(index) = cursor.claim() {
                        mine.push(index);
                    }
                    claims.lock().unwrap().extend(mine);
                });
            }
        })
        .unwrap();

        let mut claims = claims.into_inner().unwrap();
        claims.sort_unstable();
        assert_eq!(claims, (0..len).collect::<Vec<_>>());
        assert_eq!(cursor.position(), len);
    }
}
