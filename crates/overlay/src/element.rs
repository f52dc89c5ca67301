use groundwork::bounds::Aabb2;
use groundwork::geom::{distance_to_segment, point_in_polygon};
use groundwork::math::Vec2;
use groundwork::math::geo::GeoPoint;
use groundwork::math::mercator::TileProjection;
use tracing::trace;

use crate::invalidate::RedrawSignal;
use crate::raster::{PixelSurface, fill_polygon, stroke_polyline};
use crate::ribbon::{RibbonMesh, build_ribbon};
use crate::style::{Rgba8, StrokeStyle};
use crate::transform::{to_local_points, unwrap_initial};
use crate::viewport::{TILE_SIZE_PX, Viewport};

/// Overlay geometry variants. Rasterization and meshing are shared; only
/// point closing and fill-or-not differ between them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DrawingShape {
    Polyline { stroke: StrokeStyle },
    Polygon { stroke: StrokeStyle, fill: Rgba8 },
}

impl DrawingShape {
    pub fn stroke(&self) -> StrokeStyle {
        match self {
            DrawingShape::Polyline { stroke } | DrawingShape::Polygon { stroke, .. } => *stroke,
        }
    }

    pub fn closed(&self) -> bool {
        matches!(self, DrawingShape::Polygon { .. })
    }
}

/// A single map overlay: an ordered geographic point list plus its shape.
///
/// The element never mutates its points during a draw call. Mutators mark
/// the attached redraw signal; the host consumes the signal and redraws
/// on its own schedule.
#[derive(Debug, Clone)]
pub struct DrawingElement {
    points: Vec<GeoPoint>,
    shape: DrawingShape,
    visible: bool,
    signal: RedrawSignal,
}

impl DrawingElement {
    pub fn new(points: Vec<GeoPoint>, shape: DrawingShape, signal: RedrawSignal) -> Self {
        signal.mark();
        Self {
            points,
            shape,
            visible: true,
            signal,
        }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn shape(&self) -> DrawingShape {
        self.shape
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_points(&mut self, points: Vec<GeoPoint>) {
        self.points = points;
        self.signal.mark();
    }

    pub fn set_shape(&mut self, shape: DrawingShape) {
        self.shape = shape;
        self.signal.mark();
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.signal.mark();
        }
    }

    /// Geographic bounds of the point list (lon/lat axis-aligned);
    /// `None` for an empty element.
    pub fn bounds(&self) -> Option<Aabb2> {
        let pts: Vec<Vec2> = self
            .points
            .iter()
            .map(|p| Vec2::new(p.lon, p.lat))
            .collect();
        Aabb2::from_points(&pts)
    }

    /// Whether the element's bounds overlap the viewport's geographic
    /// window. Used as a cheap pre-draw cull; the painters cull
    /// per-segment anyway.
    pub fn in_view(&self, viewport: &Viewport) -> bool {
        let Some(b) = self.bounds() else {
            return false;
        };
        let window = Aabb2::new(
            [
                viewport.top_left.lon.min(viewport.bottom_right.lon),
                viewport.bottom_right.lat.min(viewport.top_left.lat),
            ],
            [
                viewport.top_left.lon.max(viewport.bottom_right.lon),
                viewport.bottom_right.lat.max(viewport.top_left.lat),
            ],
        );
        b.intersects(&window)
    }

    /// Paint into a borrowed pixel buffer (raster backend). An invisible
    /// or degenerate element is a silent no-op.
    pub fn draw_raster(
        &self,
        surface: &mut PixelSurface,
        projection: &dyn TileProjection,
        viewport: &Viewport,
    ) {
        if !self.visible {
            return;
        }
        match self.shape {
            DrawingShape::Polyline { stroke } => {
                trace!(points = self.points.len(), "raster polyline");
                stroke_polyline(surface, projection, viewport, &self.points, false, stroke);
            }
            DrawingShape::Polygon { stroke, fill } => {
                trace!(points = self.points.len(), "raster polygon");
                fill_polygon(surface, projection, viewport, &self.points, fill);
                stroke_polyline(surface, projection, viewport, &self.points, true, stroke);
            }
        }
    }

    /// Rebuild the ribbon mesh for this element (mesh backend). The mesh
    /// is cleared first; buffers are rebuilt from scratch every call.
    ///
    /// Polygon interiors are not meshed; only the stroke ribbon is
    /// produced.
    pub fn build_mesh<F>(
        &self,
        mesh: &mut RibbonMesh,
        projection: &dyn TileProjection,
        viewport: &Viewport,
        elevation: &mut F,
    ) where
        F: FnMut(f32, f32) -> f32,
    {
        mesh.clear();
        if !self.visible {
            return;
        }
        trace!(points = self.points.len(), "ribbon mesh");
        let local = to_local_points(
            &self.points,
            viewport,
            projection,
            self.shape.closed(),
            true,
        );
        build_ribbon(
            mesh,
            &local,
            self.shape.stroke().width_px,
            viewport.buffer_width_px as f32,
            viewport.buffer_height_px as f32,
            elevation,
        );
    }

    /// Whether `p` hits this element: inside a polygon, or within one
    /// stroke width of a polyline's centerline, measured in buffer
    /// pixels.
    pub fn hit_test(
        &self,
        p: GeoPoint,
        projection: &dyn TileProjection,
        viewport: &Viewport,
    ) -> bool {
        if !self.visible {
            return false;
        }
        let local = to_local_points(
            &self.points,
            viewport,
            projection,
            self.shape.closed(),
            false,
        );
        if local.len() < 2 {
            return false;
        }
        let outline: Vec<Vec2> = local
            .iter()
            .map(|q| Vec2::new(q.x as f64, q.y as f64))
            .collect();

        // Probe in the same unwrapped pixel frame as the outline.
        let t = projection.to_tile(p, viewport.zoom);
        let origin = viewport.buffer_origin;
        let x = unwrap_initial(t.x, origin.x, viewport.world_tiles());
        let probe = Vec2::new(
            (x - origin.x) * TILE_SIZE_PX,
            (t.y - origin.y) * TILE_SIZE_PX,
        );

        match self.shape {
            DrawingShape::Polygon { .. } => point_in_polygon(&outline, probe),
            DrawingShape::Polyline { stroke } => outline
                .windows(2)
                .any(|s| distance_to_segment(s[0], s[1], probe) <= stroke.width_px as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawingElement, DrawingShape};
    use crate::invalidate::RedrawSignal;
    use crate::raster::PixelSurface;
    use crate::ribbon::RibbonMesh;
    use crate::style::{Rgba8, StrokeStyle};
    use crate::viewport::Viewport;
    use groundwork::math::geo::GeoPoint;
    use groundwork::math::mercator::WebMercator;

    fn square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(-1.0, -1.0),
            GeoPoint::new(1.0, -1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(-1.0, 1.0),
        ]
    }

    fn polygon_shape() -> DrawingShape {
        DrawingShape::Polygon {
            stroke: StrokeStyle::new(Rgba8::new(255, 255, 255, 255), 1.0),
            fill: Rgba8::new(0, 0, 255, 200),
        }
    }

    #[test]
    fn mutations_mark_the_signal() {
        let signal = RedrawSignal::new();
        let mut element = DrawingElement::new(square(), polygon_shape(), signal.clone());
        assert!(signal.take(), "construction marks");

        element.set_points(square());
        assert!(signal.take());

        element.set_visible(false);
        assert!(signal.take());
        element.set_visible(false);
        assert!(!signal.take(), "no-op visibility change does not mark");

        element.set_shape(DrawingShape::Polyline {
            stroke: StrokeStyle::default(),
        });
        assert!(signal.take());
    }

    #[test]
    fn polygon_hit_test_inside_and_outside() {
        let vp = Viewport::centered(GeoPoint::new(0.0, 0.0), 6, 512, 512, &WebMercator);
        let element = DrawingElement::new(square(), polygon_shape(), RedrawSignal::new());

        assert!(element.hit_test(GeoPoint::new(0.0, 0.0), &WebMercator, &vp));
        assert!(!element.hit_test(GeoPoint::new(2.5, 0.0), &WebMercator, &vp));
    }

    #[test]
    fn polyline_hit_test_uses_stroke_distance() {
        let vp = Viewport::centered(GeoPoint::new(0.0, 0.0), 6, 512, 512, &WebMercator);
        let line = vec![GeoPoint::new(-1.0, 0.0), GeoPoint::new(1.0, 0.0)];
        let element = DrawingElement::new(
            line,
            DrawingShape::Polyline {
                stroke: StrokeStyle::new(Rgba8::new(255, 0, 0, 255), 4.0),
            },
            RedrawSignal::new(),
        );

        assert!(element.hit_test(GeoPoint::new(0.0, 0.0), &WebMercator, &vp));
        // Well off the line (half the viewport away).
        assert!(!element.hit_test(GeoPoint::new(0.0, 1.5), &WebMercator, &vp));
    }

    #[test]
    fn invisible_elements_do_nothing() {
        let vp = Viewport::centered(GeoPoint::new(0.0, 0.0), 4, 64, 64, &WebMercator);
        let mut element = DrawingElement::new(square(), polygon_shape(), RedrawSignal::new());
        element.set_visible(false);

        let mut data = vec![0u8; 64 * 64 * 4];
        let mut surface = PixelSurface::new(&mut data, 64, 64, false);
        element.draw_raster(&mut surface, &WebMercator, &vp);
        assert!(data.iter().all(|&b| b == 0));

        let mut mesh = RibbonMesh::new();
        element.build_mesh(&mut mesh, &WebMercator, &vp, &mut |_, _| 0.0);
        assert!(mesh.vertices.is_empty());

        assert!(!element.hit_test(GeoPoint::new(0.0, 0.0), &WebMercator, &vp));
    }

    #[test]
    fn polygon_raster_fills_and_strokes() {
        let vp = Viewport::centered(GeoPoint::new(0.0, 0.0), 6, 128, 128, &WebMercator);
        let element = DrawingElement::new(square(), polygon_shape(), RedrawSignal::new());

        let mut data = vec![0u8; 128 * 128 * 4];
        let mut surface = PixelSurface::new(&mut data, 128, 128, false);
        element.draw_raster(&mut surface, &WebMercator, &vp);

        // Center pixel carries the fill color.
        let center = (64 * 128 + 64) * 4;
        assert_eq!(data[center + 2], 200, "blue channel blended at alpha 200");
        assert!(data.iter().any(|&b| b != 0));
    }

    #[test]
    fn mesh_dispatch_produces_ribbon_quads() {
        let vp = Viewport::centered(GeoPoint::new(0.0, 0.0), 6, 512, 512, &WebMercator);
        let line = vec![GeoPoint::new(-1.0, 0.0), GeoPoint::new(1.0, 0.0)];
        let element = DrawingElement::new(
            line,
            DrawingShape::Polyline {
                stroke: StrokeStyle::new(Rgba8::new(255, 0, 0, 255), 2.0),
            },
            RedrawSignal::new(),
        );

        let mut mesh = RibbonMesh::new();
        element.build_mesh(&mut mesh, &WebMercator, &vp, &mut |_, _| 0.0);
        assert_eq!(mesh.vertices.len() % 4, 0);
        assert!(!mesh.vertices.is_empty());
        assert_eq!(mesh.indices.len() / 6, mesh.vertices.len() / 4);
    }

    #[test]
    fn viewport_visibility_cull() {
        let vp = Viewport::centered(GeoPoint::new(0.0, 0.0), 6, 256, 256, &WebMercator);
        let near = DrawingElement::new(square(), polygon_shape(), RedrawSignal::new());
        let far = DrawingElement::new(
            vec![
                GeoPoint::new(100.0, 40.0),
                GeoPoint::new(101.0, 40.0),
                GeoPoint::new(101.0, 41.0),
            ],
            polygon_shape(),
            RedrawSignal::new(),
        );
        assert!(near.in_view(&vp));
        assert!(!far.in_view(&vp));
    }
}
