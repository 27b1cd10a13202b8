use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::time::Duration;

use sky_catalog::cache::{cache_key, TtlCache};
use sky_catalog::coords::parse_free_text;
use sky_catalog::models::{BoundingBox, Category, ObjectSummary, SkyCoordinate};
use sky_catalog::projection::Projection;
use sky_catalog::spatial::filter_by_bbox;

fn scattered_objects(n: usize) -> Vec<ObjectSummary> {
    (0..n)
        .map(|i| {
            let ra = (i as f64 * 7.31) % 360.0;
            let dec = ((i as f64 * 3.17) % 180.0) - 90.0;
            ObjectSummary::new(format!("obj-{}", i), "bench", Category::Stars, ra, dec, "bench")
        })
        .collect()
}

fn bench_bbox_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("bbox_filter");

    let plain = BoundingBox::new(80.0, -20.0, 120.0, 20.0).expect("valid bbox");
    let wrapping = BoundingBox::new(340.0, -20.0, 20.0, 20.0).expect("valid bbox");
    for size in [100usize, 10_000] {
        let items = scattered_objects(size);
        group.bench_with_input(BenchmarkId::new("plain", size), &items, |b, items| {
            b.iter(|| filter_by_bbox(black_box(items.clone()), &plain));
        });
        group.bench_with_input(BenchmarkId::new("wrapping", size), &items, |b, items| {
            b.iter(|| filter_by_bbox(black_box(items.clone()), &wrapping));
        });
    }

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("ttl_cache");

    let cache: TtlCache<String, u64> = TtlCache::new(1000, Duration::from_secs(300));
    let keys: Vec<String> = (0..2000)
        .map(|i| cache_key("search", [("page", i.to_string()), ("category", "stars".into())]))
        .collect();

    group.bench_function("set_with_eviction", |b| {
        let mut i = 0usize;
        b.iter(|| {
            cache.set(keys[i % keys.len()].clone(), i as u64);
            i += 1;
        });
    });

    for key in keys.iter().take(1000) {
        cache.set(key.clone(), 1);
    }
    group.bench_function("get_hit", |b| {
        let mut i = 0usize;
        b.iter(|| {
            black_box(cache.get(&keys[i % 1000]));
            i += 1;
        });
    });

    group.finish();
}

fn bench_coordinates(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinates");

    for input in ["266.41683, -29.00781", "17:45:40.04 -29:00:28.1", "17h45m40s -29d00m28s"] {
        group.bench_with_input(BenchmarkId::new("parse", input), &input, |b, input| {
            b.iter(|| parse_free_text(black_box(input)));
        });
    }

    let projection = Projection::default();
    let coord = SkyCoordinate::new(10.8, 41.2).expect("valid coordinate");
    group.bench_function("gnomonic_round_trip", |b| {
        b.iter(|| {
            let point = projection.sky_to_image(black_box(&coord));
            point.map(|p| projection.image_to_sky(p))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_bbox_filter, bench_cache, bench_coordinates);
criterion_main!(benches);
