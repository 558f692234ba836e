use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geoindex::{
    CancellationToken, Collection, DocId, GeoQuery, GeohashCodec, IndexConfig, Point, Shape,
    SpatialIndexBuilder,
};
use serde_json::json;

fn scatter(i: u64) -> (f64, f64) {
    let x = -74.5 + ((i * 7919) % 10_000) as f64 * 0.0001;
    let y = 40.2 + ((i * 104_729) % 10_000) as f64 * 0.0001;
    (x, y)
}

fn populated(n: u64) -> Collection {
    let places = Collection::new("bench");
    places.create_spatial_index(IndexConfig::flat("loc")).unwrap();
    places.insert_many((0..n).map(|i| {
        let (x, y) = scatter(i);
        (i, json!({ "loc": [x, y] }))
    }));
    places
}

fn benchmark_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("geohash_codec");
    let codec = GeohashCodec::new(&IndexConfig::flat("loc"));
    let point = Point::new(-74.0060, 40.7128);

    group.bench_function("encode", |b| {
        b.iter(|| codec.encode(black_box(&point)).unwrap())
    });

    let key = codec.encode(&point).unwrap();
    group.bench_function("decode_approx", |b| {
        b.iter(|| codec.decode_approx(black_box(key)))
    });

    group.finish();
}

fn benchmark_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("writes");

    let places = Collection::new("bench");
    places.create_spatial_index(IndexConfig::flat("loc")).unwrap();
    group.bench_function("single_insert", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            let (x, y) = scatter(counter);
            places
                .insert(black_box(counter), json!({ "loc": [x, y] }))
                .unwrap();
            counter += 1;
        })
    });

    let moving = populated(1_000);
    group.bench_function("update_location", |b| {
        let id = DocId::from(500u64);
        let mut counter = 0u64;
        b.iter(|| {
            let (x, y) = scatter(counter);
            moving.update(&id, json!({ "loc": [x, y] })).unwrap();
            counter += 1;
        })
    });

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let cancel = CancellationToken::new();
    let origin = Point::new(-74.0, 40.7);

    for size in [1_000u64, 10_000, 50_000] {
        let places = populated(size);

        group.bench_with_input(BenchmarkId::new("near_10", size), &places, |b, places| {
            let query = GeoQuery::near("loc", origin).limit(10);
            b.iter(|| places.find(black_box(&query), &cancel).unwrap())
        });

        group.bench_with_input(
            BenchmarkId::new("near_sphere_100", size),
            &places,
            |b, places| {
                let query = GeoQuery::near_sphere("loc", origin).limit(100);
                b.iter(|| places.find(black_box(&query), &cancel).unwrap())
            },
        );

        group.bench_with_input(BenchmarkId::new("within_box", size), &places, |b, places| {
            let shape = Shape::rect(Point::new(-74.1, 40.6), Point::new(-73.9, 40.8));
            let query = GeoQuery::within("loc", shape);
            b.iter(|| places.find(black_box(&query), &cancel).unwrap())
        });
    }

    group.finish();
}

fn benchmark_haystack(c: &mut Criterion) {
    let mut group = c.benchmark_group("haystack");
    let cancel = CancellationToken::new();

    let places = Collection::new("bench");
    SpatialIndexBuilder::haystack("pos", "type", 0.05)
        .create_on(&places)
        .unwrap();
    let kinds = ["restaurant", "museum", "park", "hotel"];
    places.insert_many((0..20_000u64).map(|i| {
        let (x, y) = scatter(i);
        (i, json!({ "pos": [x, y], "type": kinds[(i % 4) as usize] }))
    }));

    group.bench_function("search", |b| {
        let query = GeoQuery::haystack("pos", Point::new(-74.0, 40.7), "museum", 0.05);
        b.iter(|| places.find(black_box(&query), &cancel).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_codec,
    benchmark_writes,
    benchmark_queries,
    benchmark_haystack
);
criterion_main!(benches);
