use geoindex::prelude::*;
use geoindex::DistanceUnit;
use serde_json::json;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug to see detailed logs)
    env_logger::init();

    println!("=== geoindex - Getting Started ===\n");

    // === 2D INDEX ===
    println!("1. Geohash-ordered 2d index");
    println!("---------------------------");

    let cities = Collection::new("cities");
    SpatialIndexBuilder::flat("loc")
        .secondary_field("country")
        .create_on(&cities)?;

    cities.insert("nyc", json!({ "name": "New York", "loc": [-74.0060, 40.7128], "country": "US" }))?;
    cities.insert("phl", json!({ "name": "Philadelphia", "loc": [-75.1652, 39.9526], "country": "US" }))?;
    cities.insert("lon", json!({ "name": "London", "loc": [-0.1278, 51.5074], "country": "UK" }))?;
    cities.insert("par", json!({ "name": "Paris", "loc": [2.3522, 48.8566], "country": "FR" }))?;
    println!("   Stored 4 cities\n");

    let cancel = CancellationToken::new();

    // === PROXIMITY ===
    println!("2. Proximity queries");
    println!("--------------------");

    let query = GeoQuery::near_sphere("loc", Point::new(-74.0, 40.74))
        .limit(3)
        .in_unit(DistanceUnit::Kilometers);
    let result = cities.find(&query, &cancel)?;
    for row in &result.rows {
        println!("   {} at {:.1} km", row.doc_id, row.distance.unwrap_or_default());
    }
    if let Some(stats) = result.stats {
        println!(
            "   scanned {} entries, average {:.1} km, max {:.1} km\n",
            stats.n_scanned, stats.average_distance, stats.max_distance
        );
    }

    // === REGIONS ===
    println!("3. Region queries");
    println!("-----------------");

    let europe = Shape::rect(Point::new(-10.0, 35.0), Point::new(30.0, 60.0));
    let result = cities.find(&GeoQuery::within("loc", europe), &cancel)?;
    println!("   {} cities in the European box", result.len());

    let us_only = GeoQuery::within("loc", Shape::circle(Point::new(-74.0, 40.0), 5.0)).filter("US");
    println!("   {} US cities within 5 degrees of (-74, 40)", cities.find(&us_only, &cancel)?.len());

    let wrapping = GeoQuery::within("loc", Shape::center_sphere(Point::new(179.0, 0.0), 0.05));
    match cities.find(&wrapping, &cancel) {
        Err(GeoIndexError::Wraparound(msg)) => println!("   rejected: {}\n", msg),
        other => println!("   unexpected: {:?}\n", other),
    }

    // === HAYSTACK ===
    println!("4. Haystack search");
    println!("------------------");

    let places = Collection::new("places");
    SpatialIndexBuilder::haystack("pos", "type", 1.0).create_on(&places)?;
    let report = places.insert_many(vec![
        (1u64, json!({ "pos": [126.9, 35.2], "type": "restaurant" })),
        (2u64, json!({ "pos": [127.5, 36.1], "type": "restaurant" })),
        (3u64, json!({ "pos": [128.0, 36.7], "type": "national park" })),
        (4u64, json!({ "pos": [500.0, 0.0], "type": "restaurant" })),
    ]);
    println!(
        "   inserted {}, rejected {}",
        report.inserted_count(),
        report.errors.len()
    );

    let query = GeoQuery::haystack("pos", Point::new(127.5, 36.1), "restaurant", 1.0);
    let result = places.find(&query, &cancel)?;
    println!("   restaurants nearby: {:?}", result.doc_ids().iter().map(ToString::to_string).collect::<Vec<_>>());

    if let Some(stats) = places.index_stats() {
        println!(
            "   index holds {} entries in {} buckets",
            stats.entries, stats.buckets
        );
    }

    Ok(())
}
