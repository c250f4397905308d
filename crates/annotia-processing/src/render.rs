//! Image rendering
//!
//! Decodes a stored image and composes its annotation overlays onto it.
//! Every drawable record implements `Draw`; annotations paint their
//! polygons as semi-transparent filled shapes in their display color.

use annotia_core::models::AnnotationRecord;
use image::{imageops, GenericImageView, ImageReader, Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use std::io::Cursor;

/// Overlay opacity for annotation fills (out of 255).
const ANNOTATION_ALPHA: u8 = 153;

/// Fallback colors, picked by category when a record carries no color.
const CATEGORY_PALETTE: &[[u8; 3]] = &[
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
];

/// A decoded image composed with its annotation overlays, plus the source
/// path it was rendered from.
pub struct RenderedImage {
    pub image: RgbaImage,
    pub path: String,
}

/// Anything that can paint itself onto a canvas.
pub trait Draw {
    fn draw(&self, canvas: &mut RgbaImage);
}

fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

fn palette_color(index: i64) -> [u8; 3] {
    CATEGORY_PALETTE[index.unsigned_abs() as usize % CATEGORY_PALETTE.len()]
}

/// Convert a flat `[x0, y0, x1, y1, ...]` list into polygon points.
/// A closing point equal to the first is dropped; the drawing routine
/// closes polygons itself.
fn polygon_points(flat: &[f64]) -> Vec<Point<i32>> {
    let mut points: Vec<Point<i32>> = flat
        .chunks_exact(2)
        .map(|xy| Point::new(xy[0].round() as i32, xy[1].round() as i32))
        .collect();

    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    points
}

impl Draw for AnnotationRecord {
    fn draw(&self, canvas: &mut RgbaImage) {
        let [r, g, b] = self
            .color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or_else(|| palette_color(self.category_id.unwrap_or(self.id)));
        let fill = Rgba([r, g, b, ANNOTATION_ALPHA]);

        let (width, height) = canvas.dimensions();
        let mut overlay = RgbaImage::new(width, height);
        let mut drew = false;

        for polygon in &self.segmentation {
            let points = polygon_points(polygon);
            if points.len() < 3 {
                continue;
            }
            draw_polygon_mut(&mut overlay, &points, fill);
            drew = true;
        }

        if drew {
            imageops::overlay(canvas, &overlay, 0, 0);
        }
    }
}

/// Decode stored bytes and probe the image dimensions. Fails when the data
/// is not a decodable image.
pub fn probe_dimensions(data: &[u8]) -> anyhow::Result<(u32, u32)> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;
    Ok(img.dimensions())
}

/// Decode `data` and compose every non-deleted, non-empty annotation onto
/// it, in the order given. Returns the composed image with its source path.
pub fn render(
    path: &str,
    data: &[u8],
    annotations: &[AnnotationRecord],
) -> anyhow::Result<RenderedImage> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;

    // Normalize to RGBA so overlays compose against a known channel order.
    let mut canvas = img.to_rgba8();

    for annotation in annotations {
        if annotation.deleted || annotation.is_empty() {
            continue;
        }
        annotation.draw(&mut canvas);
    }

    Ok(RenderedImage {
        image: canvas,
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotia_core::models::MetadataMap;
    use image::ImageFormat;

    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buffer
    }

    fn white_image(width: u32, height: u32) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        ))
    }

    fn annotation(segmentation: Vec<Vec<f64>>, deleted: bool) -> AnnotationRecord {
        AnnotationRecord {
            id: 1,
            image_id: 1,
            dataset_id: None,
            category_id: Some(0),
            width: 64,
            height: 64,
            area: 100.0,
            segmentation,
            color: Some("#ff0000".into()),
            deleted,
            metadata: MetadataMap::new(),
            events: vec![],
        }
    }

    #[test]
    fn probe_dimensions_reads_header() {
        let data = white_image(120, 80);
        assert_eq!(probe_dimensions(&data).unwrap(), (120, 80));
    }

    #[test]
    fn probe_dimensions_rejects_garbage() {
        assert!(probe_dimensions(b"not an image").is_err());
    }

    #[test]
    fn render_composes_annotation_fill() {
        let data = white_image(64, 64);
        let triangle = annotation(
            vec![vec![8.0, 8.0, 56.0, 8.0, 8.0, 56.0]],
            false,
        );

        let rendered = render("/datasets/cats/img.png", &data, &[triangle]).unwrap();

        assert_eq!(rendered.path, "/datasets/cats/img.png");
        // A pixel well inside the triangle picks up the red overlay.
        let inside = rendered.image.get_pixel(16, 16);
        assert!(inside[0] > inside[1]);
        // A corner outside the triangle stays white.
        assert_eq!(*rendered.image.get_pixel(63, 63), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn deleted_and_empty_annotations_are_skipped() {
        let data = white_image(32, 32);
        let deleted = annotation(vec![vec![0.0, 0.0, 31.0, 0.0, 0.0, 31.0]], true);
        let empty = annotation(vec![], false);
        let degenerate = annotation(vec![vec![1.0, 1.0, 2.0, 2.0]], false);

        let rendered = render("/x.png", &data, &[deleted, empty, degenerate]).unwrap();

        let pixel = rendered.image.get_pixel(4, 4);
        assert_eq!(*pixel, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn closing_point_is_dropped() {
        let closed = polygon_points(&[0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
        assert_eq!(closed.len(), 3);
        assert_eq!(closed.first(), Some(&Point::new(0, 0)));
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(parse_hex_color("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("ff8000"), None);
        assert_eq!(parse_hex_color("#zzz"), None);
    }

    #[test]
    fn render_fails_on_undecodable_input() {
        assert!(render("/x.png", b"junk", &[]).is_err());
    }
}
