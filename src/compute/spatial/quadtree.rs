//! Quadtree-ordered index.
//!
//! Entries live in a `BTreeMap` keyed by geohash. Because the key interleaves
//! the axes most-significant first, every quadtree cell at any precision is a
//! contiguous key run, so region scans become a handful of range scans.
//!
//! Nearest-neighbour search starts from the full-precision cell holding the
//! origin and walks outward one quadtree level at a time. At each level it
//! scans the 3x3 block of cells around the origin and computes the radius
//! within which that block is exhaustive; it stops as soon as `limit`
//! candidates lie inside that radius.
//!
//! Spherical searches need every indexed latitude in `[-90, 90]`. The default
//! range admits more than that, so the index counts entries off the sphere and
//! spherical scans refuse to run while any are present.

use super::{IndexEntry, NearHit, NearestOutcome, NearestParams};
use crate::cancel::CancellationToken;
use crate::compute::distance::DistanceMetric;
use crate::compute::geohash::{GeohashCodec, GeohashKey};
use crate::compute::validation::{validate_finite, validate_spherical_point};
use crate::config::IndexConfig;
use crate::document::{DocId, SecondaryValue};
use crate::error::{GeoIndexError, Result};
use geo::{Point, Rect};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

/// Locations of one document, encoded and ready to insert.
#[derive(Debug, Clone)]
pub struct PreparedLocations {
    pub(crate) keys: Vec<(GeohashKey, Point)>,
    pub(crate) secondary: Option<SecondaryValue>,
}

impl PreparedLocations {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Cells scanned around the origin at one quadtree level.
#[derive(Debug, Clone, Copy)]
struct Block {
    level: u8,
    x_lo: u32,
    x_hi: u32,
    y_lo: u32,
    y_hi: u32,
}

/// Geohash-ordered index over point locations.
pub struct QuadtreeIndex {
    codec: GeohashCodec,
    /// Entries by key. Several documents may share a cell.
    entries: BTreeMap<GeohashKey, SmallVec<[IndexEntry; 1]>>,
    /// Reverse index: document -> keys of all its locations.
    by_doc: FxHashMap<DocId, SmallVec<[GeohashKey; 1]>>,
    len: usize,
    /// Entries whose y is outside `[-90, 90]`.
    off_sphere: usize,
}

fn is_off_sphere(point: &Point) -> bool {
    !(-90.0..=90.0).contains(&point.y())
}

impl QuadtreeIndex {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            codec: GeohashCodec::new(config),
            entries: BTreeMap::new(),
            by_doc: FxHashMap::default(),
            len: 0,
            off_sphere: 0,
        }
    }

    pub fn codec(&self) -> &GeohashCodec {
        &self.codec
    }

    /// Number of index entries (one per location).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct documents indexed.
    pub fn doc_count(&self) -> usize {
        self.by_doc.len()
    }

    pub fn contains(&self, doc_id: &DocId) -> bool {
        self.by_doc.contains_key(doc_id)
    }

    /// Raw locations of a document in insertion order.
    pub fn locations_of(&self, doc_id: &DocId) -> Vec<Point> {
        let mut found: Vec<(u32, Point)> = Vec::new();
        if let Some(keys) = self.by_doc.get(doc_id) {
            let mut seen = BTreeSet::new();
            for key in keys {
                if !seen.insert(*key) {
                    continue;
                }
                if let Some(bucket) = self.entries.get(key) {
                    found.extend(
                        bucket
                            .iter()
                            .filter(|e| &e.doc_id == doc_id)
                            .map(|e| (e.slot, e.point)),
                    );
                }
            }
        }
        found.sort_by_key(|(slot, _)| *slot);
        found.into_iter().map(|(_, p)| p).collect()
    }

    /// Encodes every location, failing on the first out-of-range one.
    pub fn prepare(
        &self,
        points: &[Point],
        secondary: Option<SecondaryValue>,
    ) -> Result<PreparedLocations> {
        let keys = points
            .iter()
            .map(|p| self.codec.encode(p).map(|key| (key, *p)))
            .collect::<Result<Vec<_>>>()?;
        Ok(PreparedLocations { keys, secondary })
    }

    /// Inserts a single-location document.
    pub fn insert(&mut self, doc_id: DocId, point: Point) -> Result<()> {
        let prepared = self.prepare(&[point], None)?;
        self.insert_prepared(doc_id, prepared)
    }

    /// Inserts pre-encoded locations. Nothing is written if the document is
    /// already indexed.
    pub fn insert_prepared(&mut self, doc_id: DocId, prepared: PreparedLocations) -> Result<()> {
        if self.by_doc.contains_key(&doc_id) {
            return Err(GeoIndexError::DuplicateDocument(doc_id));
        }
        if prepared.is_empty() {
            return Ok(());
        }

        let mut keys = SmallVec::with_capacity(prepared.len());
        for (slot, (key, point)) in prepared.keys.into_iter().enumerate() {
            self.entries.entry(key).or_default().push(IndexEntry {
                doc_id: doc_id.clone(),
                slot: slot as u32,
                point,
                secondary: prepared.secondary.clone(),
            });
            keys.push(key);
            self.len += 1;
            if is_off_sphere(&point) {
                self.off_sphere += 1;
            }
        }
        self.by_doc.insert(doc_id, keys);
        Ok(())
    }

    /// Removes every entry of a document. Returns the number removed.
    pub fn remove(&mut self, doc_id: &DocId) -> usize {
        let Some(keys) = self.by_doc.remove(doc_id) else {
            return 0;
        };

        let mut removed = 0;
        for key in keys {
            if let Some(bucket) = self.entries.get_mut(&key) {
                let before = bucket.len();
                self.off_sphere -= bucket
                    .iter()
                    .filter(|e| &e.doc_id == doc_id && is_off_sphere(&e.point))
                    .count();
                bucket.retain(|e| &e.doc_id != doc_id);
                removed += before - bucket.len();
                if bucket.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
        self.len -= removed;
        removed
    }

    /// Replaces a single-location document's coordinate.
    pub fn update(&mut self, doc_id: DocId, point: Point) -> Result<()> {
        let prepared = self.prepare(&[point], None)?;
        self.replace_prepared(doc_id, prepared)
    }

    /// Swaps all entries of a document for `prepared` (remove + insert).
    pub fn replace_prepared(&mut self, doc_id: DocId, prepared: PreparedLocations) -> Result<()> {
        self.remove(&doc_id);
        self.insert_prepared(doc_id, prepared)
    }

    /// Fails with `LatitudeRange` if any entry lies outside latitude
    /// `[-90, 90]`, naming the first such latitude in key order.
    pub fn check_spherical(&self) -> Result<()> {
        if self.off_sphere == 0 {
            return Ok(());
        }
        let lat = self
            .entries
            .values()
            .flat_map(|bucket| bucket.iter())
            .find(|e| is_off_sphere(&e.point))
            .map_or(f64::NAN, |e| e.point.y());
        Err(GeoIndexError::LatitudeRange(lat))
    }

    /// Ids of documents with at least one location in the box `[min, max]`.
    ///
    /// Fails with `Wraparound` when the corners are inverted, i.e. the box
    /// would have to wrap around the range discontinuity.
    pub fn range_query(&self, min: &Point, max: &Point) -> Result<BTreeSet<DocId>> {
        validate_finite(min)?;
        validate_finite(max)?;
        if min.x() > max.x() || min.y() > max.y() {
            return Err(GeoIndexError::Wraparound(format!(
                "box from ({}, {}) to ({}, {}) crosses the range boundary",
                min.x(),
                min.y(),
                max.x(),
                max.y()
            )));
        }

        let mut ids = BTreeSet::new();
        self.scan_region(
            &Rect::new(min.0, max.0),
            &CancellationToken::new(),
            |entry| {
                ids.insert(entry.doc_id.clone());
            },
        )?;
        Ok(ids)
    }

    /// Visits every entry whose raw location lies in `rect` (inclusive).
    /// Returns the number of entries examined.
    pub fn scan_region(
        &self,
        rect: &Rect,
        cancel: &CancellationToken,
        mut visit: impl FnMut(&IndexEntry),
    ) -> Result<usize> {
        let (min, max) = (self.codec.min(), self.codec.max());
        if rect.max().x < min || rect.max().y < min || rect.min().x >= max || rect.min().y >= max {
            return Ok(0);
        }

        let level = self.cover_level(rect);
        let x_lo = self.codec.cell_at_level(rect.min().x, level);
        let x_hi = self.codec.cell_at_level(rect.max().x, level);
        let y_lo = self.codec.cell_at_level(rect.min().y, level);
        let y_hi = self.codec.cell_at_level(rect.max().y, level);

        let mut scanned = 0;
        for ix in x_lo..=x_hi {
            for iy in y_lo..=y_hi {
                cancel.check()?;
                let range = self.codec.cell_key_range(ix, iy, level);
                for bucket in self.entries.range(range).map(|(_, b)| b) {
                    for entry in bucket {
                        scanned += 1;
                        if in_rect(rect, &entry.point) {
                            visit(entry);
                        }
                    }
                }
            }
        }

        log::trace!(
            "scanned {} entries over {}x{} cells at level {}",
            scanned,
            x_hi - x_lo + 1,
            y_hi - y_lo + 1,
            level
        );
        Ok(scanned)
    }

    /// Finest level at which `rect` spans at most two cells per axis.
    fn cover_level(&self, rect: &Rect) -> u8 {
        let span = rect.width().max(rect.height());
        let bits = self.codec.bits();
        if span <= 0.0 {
            return bits;
        }
        let ratio = (self.codec.max() - self.codec.min()) / span;
        if ratio < 1.0 {
            return 0;
        }
        (ratio.log2().floor() as i64).clamp(0, i64::from(bits)) as u8
    }

    /// Single-location flat nearest query returning `(id, distance)` pairs.
    pub fn nearest(
        &self,
        origin: &Point,
        limit: usize,
        max_distance: Option<f64>,
    ) -> Result<Vec<(DocId, f64)>> {
        let params = NearestParams {
            origin: *origin,
            limit,
            max_distance,
            metric: DistanceMetric::Flat,
            filter: None,
        };
        let outcome = self.nearest_with(&params, &CancellationToken::new())?;
        Ok(outcome
            .hits
            .into_iter()
            .map(|hit| (hit.entry.doc_id, hit.distance))
            .collect())
    }

    /// Ranked proximity search. Results are ordered by distance, then
    /// document id, then location slot.
    pub fn nearest_with(
        &self,
        params: &NearestParams,
        cancel: &CancellationToken,
    ) -> Result<NearestOutcome> {
        let origin = params.origin;
        match params.metric {
            DistanceMetric::Flat => validate_finite(&origin)?,
            DistanceMetric::Spherical => {
                validate_spherical_point(&origin)?;
                self.check_spherical()?;
            }
        }

        if params.limit == 0 || self.is_empty() {
            return Ok(NearestOutcome::default());
        }

        let mut level = self.codec.bits();
        loop {
            cancel.check()?;

            let block = self.block_around(&origin, level);
            let mut hits = Vec::new();
            let scanned = self.collect_block(&block, params, &mut hits);
            let exact_radius = self.exact_radius(&origin, &block, params.metric);
            let exact = hits.iter().filter(|h| h.distance < exact_radius).count();

            log::trace!(
                "level {}: {} candidates, {} within exact radius {}",
                level,
                hits.len(),
                exact,
                exact_radius
            );

            let covered = params.max_distance.is_some_and(|m| m < exact_radius);
            if level == 0 || exact >= params.limit || covered {
                hits.sort_by(|a, b| {
                    a.distance
                        .total_cmp(&b.distance)
                        .then_with(|| a.entry.doc_id.cmp(&b.entry.doc_id))
                        .then_with(|| a.entry.slot.cmp(&b.entry.slot))
                });
                hits.truncate(params.limit);
                return Ok(NearestOutcome { hits, scanned });
            }

            level -= 1;
        }
    }

    fn block_around(&self, origin: &Point, level: u8) -> Block {
        let last = ((1u64 << level) - 1) as u32;
        let ix = self.codec.cell_at_level(origin.x(), level);
        let iy = self.codec.cell_at_level(origin.y(), level);
        Block {
            level,
            x_lo: ix.saturating_sub(1),
            x_hi: ix.saturating_add(1).min(last),
            y_lo: iy.saturating_sub(1),
            y_hi: iy.saturating_add(1).min(last),
        }
    }

    fn collect_block(&self, block: &Block, params: &NearestParams, hits: &mut Vec<NearHit>) -> usize {
        let mut scanned = 0;
        for ix in block.x_lo..=block.x_hi {
            for iy in block.y_lo..=block.y_hi {
                let range = self.codec.cell_key_range(ix, iy, block.level);
                for entry in self.entries.range(range).flat_map(|(_, b)| b.iter()) {
                    scanned += 1;
                    if let Some(filter) = &params.filter
                        && entry.secondary.as_ref() != Some(filter)
                    {
                        continue;
                    }
                    let distance = params.metric.distance(&params.origin, &entry.point);
                    if params.max_distance.is_none_or(|m| distance <= m) {
                        hits.push(NearHit {
                            entry: entry.clone(),
                            distance,
                        });
                    }
                }
            }
        }
        scanned
    }

    /// Radius around `origin` within which `block` holds every entry.
    fn exact_radius(&self, origin: &Point, block: &Block, metric: DistanceMetric) -> f64 {
        let last = ((1u64 << block.level) - 1) as u32;
        let edge = self.codec.cell_edge(block.level);
        let min = self.codec.min();

        let west = min + block.x_lo as f64 * edge;
        let east = min + (block.x_hi as f64 + 1.0) * edge;
        let south = min + block.y_lo as f64 * edge;
        let north = min + (block.y_hi as f64 + 1.0) * edge;

        let west_open = block.x_lo > 0;
        let east_open = block.x_hi < last;
        let south_open = block.y_lo > 0;
        let north_open = block.y_hi < last;

        let (ox, oy) = (origin.x(), origin.y());

        match metric {
            DistanceMetric::Flat => {
                let mut bound = f64::INFINITY;
                if west_open {
                    bound = bound.min(ox - west);
                }
                if east_open {
                    bound = bound.min(east - ox);
                }
                if south_open {
                    bound = bound.min(oy - south);
                }
                if north_open {
                    bound = bound.min(north - oy);
                }
                bound.max(0.0)
            }
            DistanceMetric::Spherical => {
                let mut bound = f64::INFINITY;
                if north_open && north < 90.0 {
                    bound = bound.min((north - oy).to_radians());
                }
                if south_open && south > -90.0 {
                    bound = bound.min((oy - south).to_radians());
                }

                // Smallest short-way longitude gap to anything outside the block.
                let mut gap = f64::INFINITY;
                if west_open && west > -180.0 {
                    gap = gap.min((ox - west).min(180.0 - ox));
                }
                if east_open && east < 180.0 {
                    gap = gap.min((east - ox).min(180.0 + ox));
                }
                if gap.is_finite() {
                    let gap = gap.clamp(0.0, 180.0).to_radians();
                    let lon_bound = (gap.sin().abs() * oy.to_radians().cos())
                        .clamp(0.0, 1.0)
                        .asin();
                    bound = bound.min(lon_bound);
                }
                bound.max(0.0)
            }
        }
    }
}

fn in_rect(rect: &Rect, point: &Point) -> bool {
    point.x() >= rect.min().x
        && point.x() <= rect.max().x
        && point.y() >= rect.min().y
        && point.y() <= rect.max().y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::distance::flat_distance;

    fn index() -> QuadtreeIndex {
        QuadtreeIndex::new(&IndexConfig::flat("loc"))
    }

    #[test]
    fn test_insert_remove() {
        let mut idx = index();
        idx.insert(DocId::from("a"), Point::new(1.0, 1.0)).unwrap();
        idx.insert(DocId::from("b"), Point::new(1.0, 1.0)).unwrap();
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.remove(&DocId::from("a")), 1);
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.remove(&DocId::from("a")), 0);
        assert!(idx.contains(&DocId::from("b")));
    }

    #[test]
    fn test_out_of_range_insert_is_rejected_without_side_effects() {
        let mut idx = index();
        let prepared = idx.prepare(&[Point::new(1.0, 1.0), Point::new(500.0, 1.0)], None);
        assert!(matches!(prepared, Err(GeoIndexError::Range { .. })));
        assert!(idx.insert(DocId::from("x"), Point::new(0.0, 180.0)).is_err());
        assert!(idx.is_empty());
        assert_eq!(idx.doc_count(), 0);
    }

    #[test]
    fn test_duplicate_insert() {
        let mut idx = index();
        idx.insert(DocId::from("a"), Point::new(1.0, 1.0)).unwrap();
        assert!(matches!(
            idx.insert(DocId::from("a"), Point::new(2.0, 2.0)),
            Err(GeoIndexError::DuplicateDocument(_))
        ));
        assert_eq!(idx.locations_of(&DocId::from("a")), vec![Point::new(1.0, 1.0)]);
    }

    #[test]
    fn test_update_moves_entry() {
        let mut idx = index();
        idx.insert(DocId::from("a"), Point::new(1.0, 1.0)).unwrap();
        idx.update(DocId::from("a"), Point::new(50.0, 50.0)).unwrap();
        assert_eq!(idx.len(), 1);
        let ids = idx
            .range_query(&Point::new(0.0, 0.0), &Point::new(2.0, 2.0))
            .unwrap();
        assert!(ids.is_empty());
        let ids = idx
            .range_query(&Point::new(49.0, 49.0), &Point::new(51.0, 51.0))
            .unwrap();
        assert!(ids.contains(&DocId::from("a")));
    }

    #[test]
    fn test_range_query() {
        let mut idx = index();
        for (i, (x, y)) in [(0.0, 0.0), (5.0, 5.0), (10.0, 10.0), (-5.0, 3.0), (179.9, 89.0)]
            .into_iter()
            .enumerate()
        {
            idx.insert(DocId::from(i as u64), Point::new(x, y)).unwrap();
        }
        let ids = idx
            .range_query(&Point::new(-1.0, -1.0), &Point::new(6.0, 6.0))
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&DocId::from(0u64)));
        assert!(ids.contains(&DocId::from(1u64)));

        let ids = idx
            .range_query(&Point::new(-180.0, -180.0), &Point::new(200.0, 200.0))
            .unwrap();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_range_query_wraparound() {
        let idx = index();
        let result = idx.range_query(&Point::new(170.0, 0.0), &Point::new(-170.0, 10.0));
        assert!(matches!(result, Err(GeoIndexError::Wraparound(_))));
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let mut idx = index();
        let mut points = Vec::new();
        for i in 0..400u64 {
            let x = ((i * 37) % 200) as f64 * 0.37 - 40.0;
            let y = ((i * 91) % 170) as f64 * 0.41 - 30.0;
            let p = Point::new(x, y);
            points.push((DocId::from(i), p));
            idx.insert(DocId::from(i), p).unwrap();
        }

        let origin = Point::new(3.3, 4.4);
        let got = idx.nearest(&origin, 15, None).unwrap();

        let mut expected: Vec<(DocId, f64)> = points
            .iter()
            .map(|(id, p)| (id.clone(), flat_distance(&origin, p)))
            .collect();
        expected.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        expected.truncate(15);

        assert_eq!(got, expected);
    }

    #[test]
    fn test_nearest_tie_break_by_doc_id() {
        let mut idx = index();
        idx.insert(DocId::from("c"), Point::new(1.0, 0.0)).unwrap();
        idx.insert(DocId::from("a"), Point::new(-1.0, 0.0)).unwrap();
        idx.insert(DocId::from("b"), Point::new(0.0, 1.0)).unwrap();
        let got = idx.nearest(&Point::new(0.0, 0.0), 3, None).unwrap();
        let ids: Vec<DocId> = got.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![DocId::from("a"), DocId::from("b"), DocId::from("c")]);
    }

    #[test]
    fn test_nearest_max_distance() {
        let mut idx = index();
        idx.insert(DocId::from("near"), Point::new(0.5, 0.0)).unwrap();
        idx.insert(DocId::from("far"), Point::new(20.0, 0.0)).unwrap();
        let got = idx.nearest(&Point::new(0.0, 0.0), 10, Some(1.0)).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].0, DocId::from("near"));
    }

    #[test]
    fn test_nearest_cancelled() {
        let mut idx = index();
        idx.insert(DocId::from("a"), Point::new(0.5, 0.0)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let params = NearestParams {
            origin: Point::new(0.0, 0.0),
            limit: 1,
            max_distance: None,
            metric: DistanceMetric::Flat,
            filter: None,
        };
        assert!(matches!(
            idx.nearest_with(&params, &cancel),
            Err(GeoIndexError::Cancelled)
        ));
    }

    #[test]
    fn test_spherical_nearest_across_antimeridian() {
        let mut idx = index();
        idx.insert(DocId::from("east"), Point::new(179.5, 0.0)).unwrap();
        idx.insert(DocId::from("west"), Point::new(-170.0, 0.0)).unwrap();
        let params = NearestParams {
            origin: Point::new(-179.5, 0.0),
            limit: 1,
            max_distance: None,
            metric: DistanceMetric::Spherical,
            filter: None,
        };
        let outcome = idx.nearest_with(&params, &CancellationToken::new()).unwrap();
        assert_eq!(outcome.hits[0].entry.doc_id, DocId::from("east"));
        assert!((outcome.hits[0].distance - 1.0_f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_replace_prepared_swaps_locations() {
        let mut idx = index();
        idx.insert(DocId::from("a"), Point::new(1.0, 1.0)).unwrap();
        let prepared = idx
            .prepare(&[Point::new(3.0, 3.0), Point::new(4.0, 4.0)], None)
            .unwrap();
        idx.replace_prepared(DocId::from("a"), prepared).unwrap();
        assert_eq!(idx.len(), 2);
        assert_eq!(
            idx.locations_of(&DocId::from("a")),
            vec![Point::new(3.0, 3.0), Point::new(4.0, 4.0)]
        );

        // Replacing with nothing leaves the document unindexed.
        let empty = idx.prepare(&[], None).unwrap();
        idx.replace_prepared(DocId::from("a"), empty).unwrap();
        assert!(idx.is_empty());
        assert!(!idx.contains(&DocId::from("a")));
    }

    #[test]
    fn test_spherical_search_rejects_off_sphere_entries() {
        let mut idx = index();
        idx.insert(DocId::from("ok"), Point::new(0.0, 10.0)).unwrap();
        idx.insert(DocId::from("high"), Point::new(50.0, 120.0)).unwrap();
        let params = NearestParams {
            origin: Point::new(0.0, 0.0),
            limit: 1,
            max_distance: None,
            metric: DistanceMetric::Spherical,
            filter: None,
        };
        let result = idx.nearest_with(&params, &CancellationToken::new());
        assert!(matches!(result, Err(GeoIndexError::LatitudeRange(lat)) if lat == 120.0));

        // Flat search is unaffected.
        assert_eq!(idx.nearest(&Point::new(0.0, 0.0), 2, None).unwrap().len(), 2);

        idx.remove(&DocId::from("high"));
        assert!(idx.check_spherical().is_ok());
        let outcome = idx.nearest_with(&params, &CancellationToken::new()).unwrap();
        assert_eq!(outcome.hits[0].entry.doc_id, DocId::from("ok"));
    }

    #[test]
    fn test_multi_location_entries() {
        let mut idx = index();
        let prepared = idx
            .prepare(&[Point::new(1.0, 1.0), Point::new(2.0, 2.0)], None)
            .unwrap();
        idx.insert_prepared(DocId::from("multi"), prepared).unwrap();
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.doc_count(), 1);
        assert_eq!(
            idx.locations_of(&DocId::from("multi")),
            vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]
        );
        assert_eq!(idx.remove(&DocId::from("multi")), 2);
        assert!(idx.is_empty());
    }
}
