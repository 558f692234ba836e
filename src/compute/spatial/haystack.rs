//! Haystack bucket index.
//!
//! Locations are quantised into square buckets of `bucket_size` and stored
//! under `(cell_x, cell_y, secondary value)`. A location within
//! `bucket_overlap` of a bucket edge (always including one lying exactly on
//! the edge) is replicated into the bucket across that edge, so it can be
//! found from either side.
//!
//! Searches are not ranked: matches come back in insertion order, capped at a
//! result limit.

use crate::cancel::CancellationToken;
use crate::compute::distance::window_distance;
use crate::compute::geohash::GeohashCodec;
use crate::compute::validation::{validate_distance, validate_finite};
use crate::config::IndexConfig;
use crate::document::{DocId, SecondaryValue};
use crate::error::{GeoIndexError, Result};
use geo::Point;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Default cap on haystack search results.
pub const DEFAULT_HAYSTACK_LIMIT: usize = 50;

type Cell = (i64, i64);
type BucketKey = (i64, i64, SecondaryValue);

/// One location of one document inside a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketEntry {
    pub doc_id: DocId,
    pub slot: u32,
    pub point: Point,
    pub value: SecondaryValue,
    /// Global insertion sequence, shared by all replicas of a location.
    pub seq: u64,
}

/// Locations of one document with the buckets each one lands in.
#[derive(Debug, Clone)]
pub struct PreparedBuckets {
    pub(crate) items: Vec<(Point, SmallVec<[Cell; 4]>)>,
    pub(crate) value: SecondaryValue,
}

impl PreparedBuckets {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parameters of a haystack search.
#[derive(Debug, Clone)]
pub struct HaystackParams {
    pub origin: Point,
    pub value: SecondaryValue,
    pub max_distance: f64,
    pub limit: usize,
}

/// Matches of a haystack search plus the number of bucket entries examined.
#[derive(Debug, Clone, Default)]
pub struct HaystackOutcome {
    pub hits: Vec<BucketEntry>,
    pub scanned: usize,
}

#[derive(Debug, Default)]
struct DocBuckets {
    keys: SmallVec<[BucketKey; 4]>,
    locations: usize,
}

/// Bucketed index for locality + secondary attribute search.
pub struct HaystackIndex {
    codec: GeohashCodec,
    bucket_size: f64,
    overlap: f64,
    buckets: FxHashMap<BucketKey, Vec<BucketEntry>>,
    by_doc: FxHashMap<DocId, DocBuckets>,
    next_seq: u64,
    len: usize,
}

impl HaystackIndex {
    /// Creates an empty index. `config` must be a validated haystack config.
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let bucket_size = config
            .bucket_size
            .ok_or_else(|| GeoIndexError::Config("haystack index requires bucket_size".into()))?;
        Ok(Self {
            codec: GeohashCodec::new(config),
            bucket_size,
            overlap: config.bucket_overlap,
            buckets: FxHashMap::default(),
            by_doc: FxHashMap::default(),
            next_seq: 0,
            len: 0,
        })
    }

    pub fn bucket_size(&self) -> f64 {
        self.bucket_size
    }

    /// Number of indexed locations (replicas counted once).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn doc_count(&self) -> usize {
        self.by_doc.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn contains(&self, doc_id: &DocId) -> bool {
        self.by_doc.contains_key(doc_id)
    }

    /// Bucket coordinate of `v`.
    fn cell_index(&self, v: f64) -> i64 {
        (v / self.bucket_size).floor() as i64
    }

    /// Bucket coordinates a location in `[min, max)` can occupy on either
    /// axis, replicas included.
    fn populated_cells(&self) -> (i64, i64) {
        (
            self.cell_index(self.codec.min()).saturating_sub(1),
            self.cell_index(self.codec.max()).saturating_add(1),
        )
    }

    /// Buckets on one axis that `v` belongs to, home bucket first.
    fn axis_cells(&self, v: f64) -> SmallVec<[i64; 2]> {
        let home = self.cell_index(v);
        let lower_edge = home as f64 * self.bucket_size;
        let upper_edge = lower_edge + self.bucket_size;

        let mut cells = SmallVec::new();
        cells.push(home);
        if v - lower_edge <= self.overlap {
            cells.push(home - 1);
        }
        if upper_edge - v <= self.overlap {
            cells.push(home + 1);
        }
        cells
    }

    /// Every bucket a location is stored in.
    pub fn cells_for(&self, point: &Point) -> SmallVec<[Cell; 4]> {
        let xs = self.axis_cells(point.x());
        let ys = self.axis_cells(point.y());
        let mut cells = SmallVec::new();
        for &cx in &xs {
            for &cy in &ys {
                cells.push((cx, cy));
            }
        }
        cells
    }

    /// Validates and buckets every location, failing on the first
    /// out-of-range one.
    pub fn prepare(&self, points: &[Point], value: SecondaryValue) -> Result<PreparedBuckets> {
        let items = points
            .iter()
            .map(|p| {
                self.codec.check_range(p)?;
                Ok((*p, self.cells_for(p)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PreparedBuckets { items, value })
    }

    /// Inserts a single-location document.
    pub fn insert(&mut self, doc_id: DocId, point: Point, value: SecondaryValue) -> Result<()> {
        let prepared = self.prepare(&[point], value)?;
        self.insert_prepared(doc_id, prepared)
    }

    pub fn insert_prepared(&mut self, doc_id: DocId, prepared: PreparedBuckets) -> Result<()> {
        if self.by_doc.contains_key(&doc_id) {
            return Err(GeoIndexError::DuplicateDocument(doc_id));
        }
        if prepared.is_empty() {
            return Ok(());
        }

        let mut doc = DocBuckets::default();
        for (slot, (point, cells)) in prepared.items.into_iter().enumerate() {
            let seq = self.next_seq;
            self.next_seq += 1;
            for (cx, cy) in cells {
                let key = (cx, cy, prepared.value.clone());
                self.buckets.entry(key.clone()).or_default().push(BucketEntry {
                    doc_id: doc_id.clone(),
                    slot: slot as u32,
                    point,
                    value: prepared.value.clone(),
                    seq,
                });
                doc.keys.push(key);
            }
            doc.locations += 1;
        }

        self.len += doc.locations;
        self.by_doc.insert(doc_id, doc);
        Ok(())
    }

    /// Removes every entry (and replica) of a document. Returns the number of
    /// locations removed.
    pub fn remove(&mut self, doc_id: &DocId) -> usize {
        let Some(doc) = self.by_doc.remove(doc_id) else {
            return 0;
        };

        for key in doc.keys {
            if let Some(bucket) = self.buckets.get_mut(&key) {
                bucket.retain(|e| &e.doc_id != doc_id);
                if bucket.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
        self.len -= doc.locations;
        doc.locations
    }

    /// Swaps all entries of a document for `prepared`.
    pub fn replace_prepared(&mut self, doc_id: DocId, prepared: PreparedBuckets) -> Result<()> {
        self.remove(&doc_id);
        self.insert_prepared(doc_id, prepared)
    }

    /// Entries of a single bucket, in insertion order.
    pub fn bucket(&self, cell_x: i64, cell_y: i64, value: &SecondaryValue) -> Vec<BucketEntry> {
        self.buckets
            .get(&(cell_x, cell_y, value.clone()))
            .cloned()
            .unwrap_or_default()
    }

    /// Ids within `max_distance` of `origin` carrying `value`, in insertion
    /// order, capped at [`DEFAULT_HAYSTACK_LIMIT`].
    pub fn search(
        &self,
        origin: &Point,
        value: &SecondaryValue,
        max_distance: f64,
    ) -> Result<Vec<DocId>> {
        let params = HaystackParams {
            origin: *origin,
            value: value.clone(),
            max_distance,
            limit: DEFAULT_HAYSTACK_LIMIT,
        };
        let outcome = self.search_with(&params, &CancellationToken::new())?;
        Ok(outcome.hits.into_iter().map(|e| e.doc_id).collect())
    }

    /// Scans the buckets overlapping the search window around `origin`.
    ///
    /// A location matches when it lies within `max_distance` of the origin
    /// along each axis. Each location is reported once even when replicas
    /// sit in several scanned buckets.
    pub fn search_with(
        &self,
        params: &HaystackParams,
        cancel: &CancellationToken,
    ) -> Result<HaystackOutcome> {
        validate_finite(&params.origin)?;
        validate_distance(params.max_distance, "maxDistance")?;

        let (ox, oy) = (params.origin.x(), params.origin.y());
        let md = params.max_distance;
        let (lo, hi) = self.populated_cells();
        let x_lo = self.cell_index(ox - md).max(lo);
        let x_hi = self.cell_index(ox + md).min(hi);
        let y_lo = self.cell_index(oy - md).max(lo);
        let y_hi = self.cell_index(oy + md).min(hi);

        let mut outcome = HaystackOutcome::default();
        let mut seen: FxHashSet<(DocId, u32)> = FxHashSet::default();

        let mut consider = |bucket: &Vec<BucketEntry>, outcome: &mut HaystackOutcome| {
            for entry in bucket {
                outcome.scanned += 1;
                if window_distance(&params.origin, &entry.point) <= md
                    && seen.insert((entry.doc_id.clone(), entry.slot))
                {
                    outcome.hits.push(entry.clone());
                }
            }
        };

        let span = |lo: i64, hi: i64| (i128::from(hi) - i128::from(lo) + 1).max(0);
        let window_cells = span(x_lo, x_hi) * span(y_lo, y_hi);
        if window_cells > self.buckets.len() as i128 {
            // Wide window: walking the populated buckets is cheaper.
            for ((cx, cy, value), bucket) in &self.buckets {
                if value != &params.value
                    || !(x_lo..=x_hi).contains(cx)
                    || !(y_lo..=y_hi).contains(cy)
                {
                    continue;
                }
                cancel.check()?;
                consider(bucket, &mut outcome);
            }
        } else {
            for cx in x_lo..=x_hi {
                for cy in y_lo..=y_hi {
                    cancel.check()?;
                    if let Some(bucket) = self.buckets.get(&(cx, cy, params.value.clone())) {
                        consider(bucket, &mut outcome);
                    }
                }
            }
        }

        outcome.hits.sort_by_key(|e| e.seq);
        outcome.hits.truncate(params.limit);

        log::trace!(
            "haystack search over cells x[{}..={}] y[{}..={}]: {} scanned, {} returned",
            x_lo,
            x_hi,
            y_lo,
            y_hi,
            outcome.scanned,
            outcome.hits.len()
        );
        Ok(outcome)
    }
}
