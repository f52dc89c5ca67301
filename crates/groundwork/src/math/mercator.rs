use std::f64::consts::PI;

use super::geo::{GeoPoint, TilePoint, clamp_lat, normalize_lon};

/// Continuous tile-grid projection at integer zoom levels.
///
/// Contract:
/// - One tile unit is one tile edge; coordinates are continuous, not
///   integer tile indices.
/// - At a fixed zoom, `to_tile` and `to_coords` are inverse within
///   floating-point tolerance.
/// - Implementations own coordinate validity: out-of-range input is
///   clamped/normalized, never rejected.
pub trait TileProjection {
    fn to_tile(&self, geo: GeoPoint, zoom: u32) -> TilePoint;
    fn to_coords(&self, tile: TilePoint, zoom: u32) -> GeoPoint;
}

/// Spherical web-mercator tile projection.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct WebMercator;

impl TileProjection for WebMercator {
    fn to_tile(&self, geo: GeoPoint, zoom: u32) -> TilePoint {
        let n = world_tiles(zoom);
        let lon = normalize_lon(geo.lon);
        let lat = clamp_lat(geo.lat).to_radians();
        let x = (lon + 180.0) / 360.0 * n;
        let y = (1.0 - lat.tan().asinh() / PI) / 2.0 * n;
        TilePoint::new(x, y)
    }

    fn to_coords(&self, tile: TilePoint, zoom: u32) -> GeoPoint {
        let n = world_tiles(zoom);
        let lon = tile.x / n * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * tile.y / n)).sinh().atan().to_degrees();
        GeoPoint::new(lon, lat)
    }
}

/// Width of the projected world at `zoom`, in tile units.
pub fn world_tiles(zoom: u32) -> f64 {
    (1u64 << zoom) as f64
}

#[cfg(test)]
mod tests {
    use super::{TileProjection, WebMercator, world_tiles};
    use crate::math::geo::{GeoPoint, TilePoint};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_world_center() {
        let t = WebMercator.to_tile(GeoPoint::new(0.0, 0.0), 2);
        assert_close(t.x, 2.0, 1e-12);
        assert_close(t.y, 2.0, 1e-12);
    }

    #[test]
    fn round_trip_across_zooms() {
        let samples = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(13.4, 52.5),
            GeoPoint::new(-122.4, 37.8),
            GeoPoint::new(179.9, -45.0),
            GeoPoint::new(-179.9, 80.0),
        ];
        for zoom in 0..=18 {
            for geo in samples {
                let t = WebMercator.to_tile(geo, zoom);
                let rt = WebMercator.to_coords(t, zoom);
                assert_close(rt.lon, geo.lon, 1e-9);
                assert_close(rt.lat, geo.lat, 1e-9);
            }
        }
    }

    #[test]
    fn out_of_range_input_is_clamped_not_rejected() {
        let t = WebMercator.to_tile(GeoPoint::new(400.0, 90.0), 1);
        assert!(t.x >= 0.0 && t.x <= world_tiles(1));
        assert!(t.y >= 0.0 && t.y <= world_tiles(1));
    }

    #[test]
    fn tile_units_are_continuous() {
        // Half a tile east of the world center at zoom 1.
        let geo = WebMercator.to_coords(TilePoint::new(1.5, 1.0), 1);
        let t = WebMercator.to_tile(geo, 1);
        assert_close(t.x, 1.5, 1e-9);
        assert_close(t.y, 1.0, 1e-9);
    }
}
