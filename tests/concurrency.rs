use geoindex::{CancellationToken, Collection, DocId, GeoQuery, IndexConfig, Point, QueryStatus};
use serde_json::json;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_readers_and_writer() {
    let _ = env_logger::builder().is_test(true).try_init();

    let places = Arc::new(Collection::new("places"));
    places.create_spatial_index(IndexConfig::flat("loc")).unwrap();

    let writer = {
        let places = Arc::clone(&places);
        thread::spawn(move || {
            for i in 0..500u64 {
                let x = (i % 50) as f64 * 0.1;
                let y = (i / 50) as f64 * 0.1;
                places.insert(i, json!({ "loc": [x, y] })).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let places = Arc::clone(&places);
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..50 {
                    let query = GeoQuery::near("loc", Point::new(2.5, 0.5)).limit(1000);
                    let result = places.find(&query, &CancellationToken::new()).unwrap();
                    assert_eq!(result.status, QueryStatus::Complete);
                    // Documents are only ever added, so visible counts never shrink.
                    assert!(result.len() >= last);
                    last = result.len();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    let result = places
        .find(
            &GeoQuery::near("loc", Point::new(0.0, 0.0)).limit(1000),
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(result.len(), 500);
}

#[test]
fn test_updates_are_atomic_for_readers() {
    let places = Arc::new(Collection::new("places"));
    places.create_spatial_index(IndexConfig::flat("loc")).unwrap();
    places
        .insert("mover", json!({ "loc": [[0.0, 0.0], [1.0, 1.0]] }))
        .unwrap();

    let writer = {
        let places = Arc::clone(&places);
        thread::spawn(move || {
            for i in 0..200 {
                let offset = (i % 2) as f64 * 10.0;
                places
                    .update(
                        &DocId::from("mover"),
                        json!({ "loc": [[offset, offset], [offset + 1.0, offset + 1.0]] }),
                    )
                    .unwrap();
            }
        })
    };

    let reader = {
        let places = Arc::clone(&places);
        thread::spawn(move || {
            for _ in 0..200 {
                let query = GeoQuery::near("loc", Point::new(0.0, 0.0));
                let result = places.find(&query, &CancellationToken::new()).unwrap();
                // Both locations move together; a half-applied update would show one.
                assert_eq!(result.len(), 2);
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
}

#[test]
fn test_cancellation_from_another_thread() {
    let places = Collection::new("places");
    places.create_spatial_index(IndexConfig::flat("loc")).unwrap();
    places.insert_many((0..100u64).map(|i| (i, json!({ "loc": [i as f64, 0.0] }))));

    let cancel = CancellationToken::new();
    let remote = cancel.clone();
    thread::spawn(move || remote.cancel()).join().unwrap();

    let result = places
        .find(&GeoQuery::near("loc", Point::new(0.0, 0.0)), &cancel)
        .unwrap();
    assert_eq!(result.status, QueryStatus::Cancelled);
    assert!(result.rows.is_empty());
    assert!(result.stats.is_none());
}
