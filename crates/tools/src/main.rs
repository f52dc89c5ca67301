use std::env;
use std::fs;
use std::path::PathBuf;

use groundwork::math::geo::GeoPoint;
use groundwork::math::mercator::WebMercator;
use overlay::element::{DrawingElement, DrawingShape};
use overlay::invalidate::RedrawSignal;
use overlay::raster::PixelSurface;
use overlay::ribbon::RibbonMesh;
use overlay::style::{Rgba8, StrokeStyle};
use overlay::viewport::Viewport;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "render" => cmd_render(args),
        "mesh" => cmd_mesh(args),
        _ => Err(usage()),
    }
}

fn usage() -> String {
    [
        "tileink: render map overlay scenes",
        "",
        "usage:",
        "  tileink render <scene.json> <out.ppm>",
        "  tileink mesh <scene.json>",
    ]
    .join("\n")
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    /// [lon, lat] the viewport is centered on.
    center: [f64; 2],
    zoom: u32,
    #[serde(default = "default_size")]
    width_px: usize,
    #[serde(default = "default_size")]
    height_px: usize,
    elements: Vec<ElementFile>,
}

#[derive(Debug, Deserialize)]
struct ElementFile {
    /// "polyline" or "polygon".
    kind: String,
    /// [lon, lat] pairs.
    points: Vec<[f64; 2]>,
    #[serde(default = "default_stroke_color")]
    stroke: [u8; 4],
    #[serde(default = "default_stroke_width")]
    width: f32,
    fill: Option<[u8; 4]>,
}

fn default_size() -> usize {
    512
}

fn default_stroke_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

fn default_stroke_width() -> f32 {
    1.0
}

#[derive(Debug, Serialize)]
struct MeshReport {
    elements: usize,
    vertices: usize,
    triangles: usize,
}

fn load_scene(path: &PathBuf) -> Result<(SceneFile, Vec<DrawingElement>, RedrawSignal), String> {
    let payload = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    let scene: SceneFile =
        serde_json::from_str(&payload).map_err(|e| format!("parse scene: {e}"))?;

    let signal = RedrawSignal::new();
    let mut elements = Vec::with_capacity(scene.elements.len());
    for entry in &scene.elements {
        let points: Vec<GeoPoint> = entry
            .points
            .iter()
            .map(|&[lon, lat]| GeoPoint::new(lon, lat))
            .collect();
        let stroke = StrokeStyle::new(
            Rgba8::new(entry.stroke[0], entry.stroke[1], entry.stroke[2], entry.stroke[3]),
            entry.width,
        );
        let shape = match entry.kind.as_str() {
            "polyline" => DrawingShape::Polyline { stroke },
            "polygon" => {
                let f = entry.fill.unwrap_or([0, 0, 0, 0]);
                DrawingShape::Polygon {
                    stroke,
                    fill: Rgba8::new(f[0], f[1], f[2], f[3]),
                }
            }
            other => return Err(format!("unknown element kind: {other}")),
        };
        elements.push(DrawingElement::new(points, shape, signal.clone()));
    }

    Ok((scene, elements, signal))
}

fn cmd_render(args: Vec<String>) -> Result<(), String> {
    if args.len() != 2 {
        return Err(usage());
    }
    let scene_path = PathBuf::from(&args[0]);
    let out_path = PathBuf::from(&args[1]);

    let (scene, elements, signal) = load_scene(&scene_path)?;
    let viewport = Viewport::centered(
        GeoPoint::new(scene.center[0], scene.center[1]),
        scene.zoom,
        scene.width_px,
        scene.height_px,
        &WebMercator,
    );

    let mut data = vec![0u8; scene.width_px * scene.height_px * 4];
    let mut surface = PixelSurface::new(&mut data, scene.width_px, scene.height_px, false);

    // Loading marked the signal; the draw pass consumes it.
    if signal.take() {
        let mut drawn = 0usize;
        for element in &elements {
            if !element.in_view(&viewport) {
                continue;
            }
            element.draw_raster(&mut surface, &WebMercator, &viewport);
            drawn += 1;
        }
        info!(drawn, total = elements.len(), "rendered scene");
    }

    write_ppm(&out_path, &data, scene.width_px, scene.height_px)?;
    info!(path = %out_path.display(), "wrote image");
    Ok(())
}

fn cmd_mesh(args: Vec<String>) -> Result<(), String> {
    if args.len() != 1 {
        return Err(usage());
    }
    let scene_path = PathBuf::from(&args[0]);

    let (scene, elements, _signal) = load_scene(&scene_path)?;
    let viewport = Viewport::centered(
        GeoPoint::new(scene.center[0], scene.center[1]),
        scene.zoom,
        scene.width_px,
        scene.height_px,
        &WebMercator,
    );

    let mut report = MeshReport {
        elements: elements.len(),
        vertices: 0,
        triangles: 0,
    };
    let mut mesh = RibbonMesh::new();
    for element in &elements {
        element.build_mesh(&mut mesh, &WebMercator, &viewport, &mut |_, _| 0.0);
        report.vertices += mesh.vertices.len();
        report.triangles += mesh.indices.len() / 3;
    }

    let payload = serde_json::to_string_pretty(&report).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

/// Binary PPM (P6), alpha dropped.
fn write_ppm(path: &PathBuf, rgba: &[u8], width: usize, height: usize) -> Result<(), String> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3 + 32);
    out.extend_from_slice(format!("P6\n{width} {height}\n255\n").as_bytes());
    for px in rgba.chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    fs::write(path, out).map_err(|e| format!("write {path:?}: {e}"))
}
