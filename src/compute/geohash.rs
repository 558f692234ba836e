//! Geohash codec.
//!
//! Each axis is quantised into `bits` halvings of the configured range and the
//! two bit strings are interleaved `x0 y0 x1 y1 ...`, most significant first.
//! Keys therefore sort in quadtree order: every cell at precision `L` covers a
//! single contiguous run of keys, which is what makes prefix scans work.

use crate::config::IndexConfig;
use crate::error::{GeoIndexError, Result};
use geo::{Point, Rect, coord};
use std::fmt;
use std::ops::RangeInclusive;

/// Fixed-width interleaved key, `2 * bits` significant bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeohashKey(u64);

impl GeohashKey {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GeohashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Spread the low 32 bits of `v` into the even bit positions of a u64.
#[inline]
fn spread(v: u32) -> u64 {
    let mut x = v as u64;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Inverse of [`spread`].
#[inline]
fn compact(v: u64) -> u32 {
    let mut x = v & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

/// Interleave cell indices, x taking the more significant bit of each pair.
#[inline]
pub(crate) fn interleave(ix: u32, iy: u32) -> u64 {
    (spread(ix) << 1) | spread(iy)
}

#[inline]
pub(crate) fn deinterleave(hash: u64) -> (u32, u32) {
    (compact(hash >> 1), compact(hash))
}

/// Codec bound to one index's range and precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeohashCodec {
    min: f64,
    max: f64,
    bits: u8,
}

impl GeohashCodec {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            min: config.min,
            max: config.max,
            bits: config.bits,
        }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Number of cells per axis at precision `level`.
    #[inline]
    fn cells_at(level: u8) -> u64 {
        1u64 << level
    }

    /// Edge length of a cell at precision `level`.
    pub fn cell_edge(&self, level: u8) -> f64 {
        (self.max - self.min) / Self::cells_at(level) as f64
    }

    /// Rejects coordinates outside `[min, max)` on either axis.
    pub fn check_range(&self, point: &Point) -> Result<()> {
        let in_range = |v: f64| v.is_finite() && v >= self.min && v < self.max;
        if in_range(point.x()) && in_range(point.y()) {
            Ok(())
        } else {
            Err(GeoIndexError::Range {
                x: point.x(),
                y: point.y(),
                min: self.min,
                max: self.max,
            })
        }
    }

    /// Cell index of `v` at full precision. `v` must be in range.
    #[inline]
    fn quantise(&self, v: f64) -> u32 {
        let cells = Self::cells_at(self.bits);
        let scaled = ((v - self.min) / (self.max - self.min) * cells as f64).floor();
        (scaled as u64).min(cells - 1) as u32
    }

    /// Full-precision cell indices of an in-range point.
    pub(crate) fn cell_of(&self, point: &Point) -> (u32, u32) {
        (self.quantise(point.x()), self.quantise(point.y()))
    }

    /// Cell index of `v` at precision `level`, clamping values outside the
    /// range onto the border cells.
    pub(crate) fn cell_at_level(&self, v: f64, level: u8) -> u32 {
        let cells = Self::cells_at(level);
        let scaled = ((v - self.min) / (self.max - self.min) * cells as f64).floor();
        if scaled <= 0.0 {
            0
        } else {
            (scaled as u64).min(cells - 1) as u32
        }
    }

    /// Encodes a coordinate, failing with `Range` outside `[min, max)`.
    pub fn encode(&self, point: &Point) -> Result<GeohashKey> {
        self.check_range(point)?;
        let (ix, iy) = self.cell_of(point);
        Ok(GeohashKey(interleave(ix, iy)))
    }

    /// Centre of the smallest cell `key` addresses. Lossy by construction.
    pub fn decode_approx(&self, key: GeohashKey) -> Point {
        let (ix, iy) = deinterleave(key.0);
        let edge = self.cell_edge(self.bits);
        Point::new(
            self.min + (ix as f64 + 0.5) * edge,
            self.min + (iy as f64 + 0.5) * edge,
        )
    }

    /// Bounds of cell `(ix, iy)` at precision `level`.
    pub fn cell_bounds(&self, ix: u32, iy: u32, level: u8) -> Rect {
        let edge = self.cell_edge(level);
        let x0 = self.min + ix as f64 * edge;
        let y0 = self.min + iy as f64 * edge;
        Rect::new(
            coord! { x: x0, y: y0 },
            coord! { x: x0 + edge, y: y0 + edge },
        )
    }

    /// Contiguous key run covered by cell `(ix, iy)` at precision `level`.
    pub fn cell_key_range(&self, ix: u32, iy: u32, level: u8) -> RangeInclusive<GeohashKey> {
        debug_assert!(level <= self.bits);
        let shift = 2 * u32::from(self.bits - level);
        let prefix = interleave(ix, iy);
        let start = if shift >= 64 { 0 } else { prefix << shift };
        let span = if shift >= 64 {
            u64::MAX
        } else {
            (1u64 << shift) - 1
        };
        GeohashKey(start)..=GeohashKey(start | span)
    }

    /// Length of the common prefix of two keys, in quadtree levels.
    pub fn common_levels(&self, a: GeohashKey, b: GeohashKey) -> u8 {
        let width = 2 * u32::from(self.bits);
        let diff = a.0 ^ b.0;
        if diff == 0 {
            return self.bits;
        }
        let differing = 64 - diff.leading_zeros();
        let shared_bits = width.saturating_sub(differing);
        (shared_bits / 2) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_codec() -> GeohashCodec {
        GeohashCodec::new(&IndexConfig::flat("loc"))
    }

    #[test]
    fn test_interleave_round_trip_bits() {
        for (x, y) in [(0u32, 0u32), (1, 0), (0, 1), (0xFFFF_FFFF, 0), (0x1234_5678, 0x9ABC_DEF0)] {
            assert_eq!(deinterleave(interleave(x, y)), (x, y));
        }
        // x occupies the higher bit of each pair
        assert_eq!(interleave(1, 0), 0b10);
        assert_eq!(interleave(0, 1), 0b01);
    }

    #[test]
    fn test_decode_within_one_cell() {
        let codec = default_codec();
        let edge = codec.cell_edge(codec.bits());
        for point in [
            Point::new(-74.0, 40.74),
            Point::new(179.99999, -89.99),
            Point::new(-180.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(126.9, 35.2),
        ] {
            let key = codec.encode(&point).unwrap();
            let back = codec.decode_approx(key);
            assert!((back.x() - point.x()).abs() <= edge, "x drift for {:?}", point);
            assert!((back.y() - point.y()).abs() <= edge, "y drift for {:?}", point);
        }
    }

    #[test]
    fn test_range_is_half_open() {
        let codec = default_codec();
        assert!(codec.encode(&Point::new(-180.0, -180.0)).is_ok());
        assert!(matches!(
            codec.encode(&Point::new(180.0, 0.0)),
            Err(GeoIndexError::Range { .. })
        ));
        assert!(codec.encode(&Point::new(0.0, -180.1)).is_err());
        assert!(codec.encode(&Point::new(f64::NAN, 0.0)).is_err());
    }

    #[test]
    fn test_monotonic_per_axis() {
        let codec = default_codec();
        let a = codec.cell_of(&Point::new(10.0, 5.0));
        let b = codec.cell_of(&Point::new(10.5, 5.0));
        assert!(a.0 < b.0);
        assert_eq!(a.1, b.1);
    }

    #[test]
    fn test_nearby_points_share_longer_prefix() {
        let codec = default_codec();
        let origin = codec.encode(&Point::new(10.0, 10.0)).unwrap();
        let near = codec.encode(&Point::new(10.0001, 10.0001)).unwrap();
        let far = codec.encode(&Point::new(-50.0, 60.0)).unwrap();
        assert!(codec.common_levels(origin, near) > codec.common_levels(origin, far));
        assert_eq!(codec.common_levels(origin, origin), codec.bits());
    }

    #[test]
    fn test_cell_key_range_contains_members() {
        let codec = default_codec();
        let point = Point::new(-73.5, 40.2);
        let key = codec.encode(&point).unwrap();
        for level in [0u8, 1, 5, 13, 26] {
            let ix = codec.cell_at_level(point.x(), level);
            let iy = codec.cell_at_level(point.y(), level);
            assert!(codec.cell_key_range(ix, iy, level).contains(&key), "level {}", level);
        }
        let whole = codec.cell_key_range(0, 0, 0);
        assert_eq!(whole.start().raw(), 0);
    }

    #[test]
    fn test_full_width_precision() {
        let mut config = IndexConfig::flat("loc");
        config.bits = 32;
        let codec = GeohashCodec::new(&config);
        let key = codec.encode(&Point::new(179.9999999, 179.9999999)).unwrap();
        assert_eq!(key.raw(), u64::MAX);
        let all = codec.cell_key_range(0, 0, 0);
        assert_eq!(*all.end(), GeohashKey::from_raw(u64::MAX));
    }

    #[test]
    fn test_coarse_precision_and_custom_range() {
        let mut config = IndexConfig::flat("loc");
        config.bits = 1;
        config.min = 0.0;
        config.max = 100.0;
        let codec = GeohashCodec::new(&config);
        assert_eq!(codec.encode(&Point::new(10.0, 10.0)).unwrap().raw(), 0b00);
        assert_eq!(codec.encode(&Point::new(60.0, 10.0)).unwrap().raw(), 0b10);
        assert_eq!(codec.encode(&Point::new(60.0, 60.0)).unwrap().raw(), 0b11);
        assert_eq!(codec.decode_approx(GeohashKey::from_raw(0b01)), Point::new(25.0, 75.0));
    }
}
