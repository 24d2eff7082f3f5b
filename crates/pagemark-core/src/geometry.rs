// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate transforms between the three spaces the editor works in.
//
// - Screen space: raw pointer coordinates plus the bounding rectangle of the
//   rendered page canvas.
// - Percentage space: 0–100 of the page's *unrotated* raster, top-left origin,
//   independent of zoom.
// - Document space: PDF points, bottom-left origin, used only by export.
//
// Annotations are stored in unrotated percentage space. A rotated page is
// displayed rotated, so pointer input is un-rotated before it reaches the
// store; export draws in the unrotated page coordinate system and lets the
// page's `/Rotate` entry turn both content and annotations together.
//
// Every function here is pure and total. Callers must guard against a
// zero-sized canvas before converting pointer input.

use serde::{Deserialize, Serialize};

use crate::types::Rotation;

/// Pointer position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of the rendered (possibly rotated, zoomed) page canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A canvas with no area cannot map pointer input.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.abs() > f64::EPSILON && self.height.abs() > f64::EPSILON)
    }
}

/// A point in percentage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

impl PercentPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Box of an annotation in percentage space.
///
/// For box-shaped annotations `width`/`height` are non-negative; for lines
/// they are the signed delta to the second endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-sized box anchored at `point`.
    pub fn at(point: PercentPoint) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    pub fn origin(&self) -> PercentPoint {
        PercentPoint::new(self.x, self.y)
    }

    /// Whether `point` lies inside the box, edges included. Works for
    /// negative extents too.
    pub fn contains(&self, point: PercentPoint) -> bool {
        let (x0, x1) = ordered(self.x, self.x + self.width);
        let (y0, y1) = ordered(self.y, self.y + self.height);
        (x0..=x1).contains(&point.x) && (y0..=y1).contains(&point.y)
    }

    /// Whether either extent exceeds `threshold` in magnitude.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.width.abs() > threshold || self.height.abs() > threshold
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Size of a document page in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A point in document space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocPoint {
    pub x: f64,
    pub y: f64,
}

impl DocPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in document space, anchored at its lower-left
/// corner as PDF drawing operators expect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DocRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Annotation bounds converted to document space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocBox {
    /// Left edge.
    pub x: f64,
    /// Top edge (the annotation's percentage `y` flipped).
    pub top: f64,
    /// Width in points, signed for lines.
    pub width: f64,
    /// Height in points, signed for lines.
    pub height: f64,
}

impl DocBox {
    /// The filled rectangle covering this box: lower edge at `top - height`.
    pub fn rect(&self) -> DocRect {
        DocRect::new(self.x, self.top - self.height, self.width, self.height)
    }

    /// Line endpoints: the second point moves down the page as `height` grows.
    pub fn line_endpoints(&self) -> (DocPoint, DocPoint) {
        (
            DocPoint::new(self.x, self.top),
            DocPoint::new(self.x + self.width, self.top - self.height),
        )
    }
}

// -- Screen <-> percentage ----------------------------------------------------

/// Map a pointer position to percentage space of the *displayed* canvas.
pub fn screen_to_percent(point: ScreenPoint, canvas: CanvasRect) -> PercentPoint {
    PercentPoint::new(
        (point.x - canvas.left) / canvas.width * 100.0,
        (point.y - canvas.top) / canvas.height * 100.0,
    )
}

/// Inverse of [`screen_to_percent`].
pub fn percent_to_screen(point: PercentPoint, canvas: CanvasRect) -> ScreenPoint {
    ScreenPoint::new(
        canvas.left + point.x / 100.0 * canvas.width,
        canvas.top + point.y / 100.0 * canvas.height,
    )
}

/// Map a point on the rotated display back to the unrotated raster.
pub fn unrotate(point: PercentPoint, rotation: Rotation) -> PercentPoint {
    match rotation {
        Rotation::Deg0 => point,
        Rotation::Deg90 => PercentPoint::new(point.y, 100.0 - point.x),
        Rotation::Deg180 => PercentPoint::new(100.0 - point.x, 100.0 - point.y),
        Rotation::Deg270 => PercentPoint::new(100.0 - point.y, point.x),
    }
}

/// Map a point on the unrotated raster to where it is displayed after a
/// clockwise rotation.
pub fn rotate(point: PercentPoint, rotation: Rotation) -> PercentPoint {
    match rotation {
        Rotation::Deg0 => point,
        Rotation::Deg90 => PercentPoint::new(100.0 - point.y, point.x),
        Rotation::Deg180 => PercentPoint::new(100.0 - point.x, 100.0 - point.y),
        Rotation::Deg270 => PercentPoint::new(point.y, 100.0 - point.x),
    }
}

/// Pointer position straight to unrotated percentage space.
pub fn pointer_to_page(point: ScreenPoint, canvas: CanvasRect, rotation: Rotation) -> PercentPoint {
    unrotate(screen_to_percent(point, canvas), rotation)
}

// -- Percentage <-> pixels ----------------------------------------------------

/// Convert a pixel-space box on a raster of `image_w` x `image_h` to bounds.
pub fn pixels_to_bounds(x0: f64, y0: f64, x1: f64, y1: f64, image_w: f64, image_h: f64) -> Bounds {
    Bounds::new(
        x0 / image_w * 100.0,
        y0 / image_h * 100.0,
        (x1 - x0) / image_w * 100.0,
        (y1 - y0) / image_h * 100.0,
    )
}

// -- Percentage <-> document --------------------------------------------------

/// `x_doc = x/100 * W`, `y_doc = H - y/100 * H`.
pub fn percent_to_document(point: PercentPoint, page: PageSize) -> DocPoint {
    DocPoint::new(
        point.x / 100.0 * page.width,
        page.height - point.y / 100.0 * page.height,
    )
}

/// Inverse of [`percent_to_document`].
pub fn document_to_percent(point: DocPoint, page: PageSize) -> PercentPoint {
    PercentPoint::new(
        point.x / page.width * 100.0,
        (page.height - point.y) / page.height * 100.0,
    )
}

/// Convert annotation bounds to document space, keeping line extents signed.
pub fn bounds_to_document(bounds: &Bounds, page: PageSize) -> DocBox {
    let origin = percent_to_document(bounds.origin(), page);
    DocBox {
        x: origin.x,
        top: origin.y,
        width: bounds.width / 100.0 * page.width,
        height: bounds.height / 100.0 * page.height,
    }
}

// -- Gesture shapes -----------------------------------------------------------

/// Axis-aligned box spanned by two corners, independent of drag direction.
pub fn normalize_box(anchor: PercentPoint, current: PercentPoint) -> Bounds {
    Bounds::new(
        anchor.x.min(current.x),
        anchor.y.min(current.y),
        (current.x - anchor.x).abs(),
        (current.y - anchor.y).abs(),
    )
}

/// Direction-preserving line from `anchor` to `current`.
pub fn line_between(anchor: PercentPoint, current: PercentPoint) -> Bounds {
    Bounds::new(anchor.x, anchor.y, current.x - anchor.x, current.y - anchor.y)
}

/// Distance from `point` to the segment described by line bounds, in
/// percentage units.
pub fn distance_to_line(bounds: &Bounds, point: PercentPoint) -> f64 {
    let (ax, ay) = (bounds.x, bounds.y);
    let (dx, dy) = (bounds.width, bounds.height);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq <= f64::EPSILON {
        0.0
    } else {
        (((point.x - ax) * dx + (point.y - ay) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    ((point.x - cx).powi(2) + (point.y - cy).powi(2)).sqrt()
}

// -- Viewport -----------------------------------------------------------------

/// Padding kept around the page when fitting it into the editor container.
pub const FIT_PADDING_PX: f64 = 64.0;
/// Lowest zoom the auto-fit will choose.
pub const MIN_FIT_ZOOM_PERCENT: u32 = 20;

/// Zoom (in percent) that fits a raster of `image_w` x `image_h` into the
/// container, accounting for the displayed rotation.
pub fn fit_zoom(
    container_w: f64,
    container_h: f64,
    image_w: f64,
    image_h: f64,
    rotation: Rotation,
) -> u32 {
    let (shown_w, shown_h) = if rotation.is_sideways() {
        (image_h, image_w)
    } else {
        (image_w, image_h)
    };
    if shown_w <= 0.0 || shown_h <= 0.0 {
        return MIN_FIT_ZOOM_PERCENT;
    }
    let scale_x = (container_w - FIT_PADDING_PX) / shown_w;
    let scale_y = (container_h - FIT_PADDING_PX) / shown_h;
    let zoom = (scale_x.min(scale_y) * 100.0).floor();
    if zoom < MIN_FIT_ZOOM_PERCENT as f64 {
        MIN_FIT_ZOOM_PERCENT
    } else {
        zoom as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn screen_percent_round_trip() {
        let canvas = CanvasRect::new(37.5, 120.0, 812.0, 1148.0);
        for step in 0..=20 {
            let p = step as f64 * 5.0;
            let original = PercentPoint::new(p, 100.0 - p);
            let back = screen_to_percent(percent_to_screen(original, canvas), canvas);
            assert!(close(back.x, original.x) && close(back.y, original.y), "{p}");
        }
    }

    #[test]
    fn zoom_does_not_change_percentages() {
        let point = ScreenPoint::new(150.0, 250.0);
        let small = screen_to_percent(point, CanvasRect::new(100.0, 200.0, 100.0, 100.0));
        let big = screen_to_percent(
            ScreenPoint::new(200.0, 300.0),
            CanvasRect::new(100.0, 200.0, 200.0, 200.0),
        );
        assert!(close(small.x, big.x) && close(small.y, big.y));
    }

    #[test]
    fn document_space_flips_y() {
        let page = PageSize::new(210.0, 297.0);
        let doc = percent_to_document(PercentPoint::new(10.0, 10.0), page);
        assert!(close(doc.x, 21.0));
        assert!(close(doc.y, 267.3));
        let back = document_to_percent(doc, page);
        assert!(close(back.x, 10.0) && close(back.y, 10.0));
    }

    #[test]
    fn box_lower_edge_is_top_minus_height() {
        let page = PageSize::new(200.0, 400.0);
        let doc = bounds_to_document(&Bounds::new(50.0, 25.0, 10.0, 10.0), page);
        let rect = doc.rect();
        assert!(close(rect.x, 100.0));
        assert!(close(rect.y, 300.0 - 40.0));
        assert!(close(rect.width, 20.0));
        assert!(close(rect.height, 40.0));
    }

    #[test]
    fn line_endpoints_keep_direction() {
        let page = PageSize::new(100.0, 100.0);
        let doc = bounds_to_document(&Bounds::new(50.0, 50.0, -20.0, 30.0), page);
        let (start, end) = doc.line_endpoints();
        assert!(close(start.x, 50.0) && close(start.y, 50.0));
        assert!(close(end.x, 30.0) && close(end.y, 20.0));
    }

    #[test]
    fn rectangle_normalization_is_direction_independent() {
        let a = PercentPoint::new(10.0, 20.0);
        let b = PercentPoint::new(40.0, 60.0);
        let c = PercentPoint::new(10.0, 60.0);
        let d = PercentPoint::new(40.0, 20.0);
        let expected = Bounds::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(normalize_box(a, b), expected);
        assert_eq!(normalize_box(b, a), expected);
        assert_eq!(normalize_box(c, d), expected);
        assert_eq!(normalize_box(d, c), expected);
    }

    #[test]
    fn rotate_and_unrotate_are_inverse() {
        let point = PercentPoint::new(12.0, 70.0);
        for rotation in [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            let back = unrotate(rotate(point, rotation), rotation);
            assert!(close(back.x, point.x) && close(back.y, point.y), "{rotation:?}");
        }
    }

    #[test]
    fn quarter_turn_moves_top_left_to_top_right() {
        let shown = rotate(PercentPoint::new(0.0, 0.0), Rotation::Deg90);
        assert!(close(shown.x, 100.0) && close(shown.y, 0.0));
        let raster = pointer_to_page(
            ScreenPoint::new(100.0, 0.0),
            CanvasRect::new(0.0, 0.0, 100.0, 100.0),
            Rotation::Deg90,
        );
        assert!(close(raster.x, 0.0) && close(raster.y, 0.0));
    }

    #[test]
    fn distance_to_segment() {
        let line = Bounds::new(0.0, 0.0, 10.0, 0.0);
        assert!(close(distance_to_line(&line, PercentPoint::new(5.0, 3.0)), 3.0));
        assert!(close(distance_to_line(&line, PercentPoint::new(14.0, 3.0)), 5.0));
    }

    #[test]
    fn fit_zoom_swaps_for_sideways_pages() {
        // 1000x600 container, 1000x2000 raster.
        assert_eq!(fit_zoom(1064.0, 664.0, 1000.0, 2000.0, Rotation::Deg0), 30);
        assert_eq!(fit_zoom(2064.0, 1064.0, 1000.0, 2000.0, Rotation::Deg90), 100);
        assert_eq!(fit_zoom(1000.0, 1000.0, 0.0, 10.0, Rotation::Deg0), 20);
    }

    #[test]
    fn degenerate_canvas_is_detected() {
        assert!(CanvasRect::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(!CanvasRect::new(0.0, 0.0, 10.0, 10.0).is_degenerate());
    }
}
