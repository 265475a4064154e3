//! Deterministic reconstruction of the drawing layer from a list of
//! drawing-target actions. Stateless with respect to the history log: given
//! the same ordered actions and a cleared surface, the output is
//! pixel-identical every time.

use kurbo::{BezPath, ParamCurve, ParamCurveArclen, Point as KPoint, Vec2};
use crate::actions::DrawingAction;
use crate::raster::{Paint, Surface};
use crate::types::{DrawingKind, Point};

const ARCLEN_ACCURACY: f64 = 0.1;

/// Clears the surface, then applies every action in the given order.
pub fn replay<'a, I>(surface: &mut Surface, actions: I)
where
    I: IntoIterator<Item = &'a DrawingAction>,
{
    surface.clear();
    for action in actions {
        apply_drawing_action(surface, action);
    }
}

/// Renders one drawing action. Paint state (composite mode, dash phase) is
/// scoped to this call; nothing bleeds into the next action.
pub fn apply_drawing_action(surface: &mut Surface, action: &DrawingAction) {
    if action.points.is_empty() {
        return;
    }
    let paint = Paint::for_action(action);
    match action.kind {
        DrawingKind::Pencil | DrawingKind::Eraser => {
            if action.points.len() == 1 {
                let p = action.start();
                surface.stamp_dab(p.x, p.y, paint.width / 2.0, &paint);
                return;
            }
            let path = polyline(&action.points);
            stroke_path(surface, &path, &paint);
        }
        DrawingKind::Line => {
            let mut path = BezPath::new();
            path.move_to(action.start().to_kurbo());
            path.line_to(action.end().to_kurbo());
            stroke_path(surface, &path, &paint);
        }
        DrawingKind::Curve => {
            let path = spline_through(&action.points);
            stroke_path(surface, &path, &paint);
        }
        DrawingKind::CurveArrow => {
            let path = spline_through(&action.points);
            stroke_path(surface, &path, &paint);
            arrowheads_for(surface, &action.points, &paint);
        }
    }
}

fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            path.move_to(p.to_kurbo());
        } else {
            path.line_to(p.to_kurbo());
        }
    }
    path
}

/// Catmull-Rom-style cubic spline through all points: each segment's control
/// points sit at 1/6 of the local neighbor displacement, clamped at the ends.
pub(crate) fn spline_through(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if points.is_empty() {
        return path;
    }
    path.move_to(points[0].to_kurbo());
    if points.len() == 2 {
        path.line_to(points[1].to_kurbo());
        return path;
    }
    let last = points.len() - 1;
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        let c1 = KPoint::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0);
        let c2 = KPoint::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0);
        path.curve_to(c1, c2, p2.to_kurbo());
    }
    path
}

/// Walks the path by arclength and stamps dabs at a fixed spacing, skipping
/// the "off" runs of the dash cycle. The dash phase accumulates across the
/// whole path, not per segment.
pub(crate) fn stroke_path(surface: &mut Surface, path: &BezPath, paint: &Paint) {
    let radius = (paint.width / 2.0).max(0.5);
    let step = (paint.width * 0.25).max(0.5);
    let mut travelled = 0.0;
    let mut t_dist = 0.0;
    for seg in path.segments() {
        let seg_len = seg.arclen(ARCLEN_ACCURACY);
        while t_dist <= seg_len {
            let t = seg.inv_arclen(t_dist, ARCLEN_ACCURACY);
            let pos = seg.eval(t);
            if dash_on(paint.dash, travelled + t_dist) {
                surface.stamp_dab(pos.x, pos.y, radius, paint);
            }
            t_dist += step;
        }
        t_dist -= seg_len;
        travelled += seg_len;
    }
}

fn dash_on(dash: Option<[f64; 2]>, dist: f64) -> bool {
    match dash {
        None => true,
        Some([on, off]) => dist % (on + off) <= on,
    }
}

fn arrowheads_for(surface: &mut Surface, points: &[Point], paint: &Paint) {
    if points.len() < 2 {
        return;
    }
    let first = points[0].to_kurbo();
    let second = points[1].to_kurbo();
    let last = points[points.len() - 1].to_kurbo();
    let before_last = points[points.len() - 2].to_kurbo();
    draw_arrowhead(surface, last, before_last, paint);
    draw_arrowhead(surface, first, second, paint);
}

/// Two angled wings at `tip`, pointing back toward `from`, each 30 degrees
/// off the shaft and `max(10, 2 * width)` long. Always solid regardless of
/// the shaft's dash pattern.
pub(crate) fn draw_arrowhead(surface: &mut Surface, tip: KPoint, from: KPoint, paint: &Paint) {
    let shaft = tip - from;
    let len = shaft.hypot();
    if len < 1e-6 {
        return;
    }
    let back = shaft * (-1.0 / len);
    let wing_len = (paint.width * 2.0).max(10.0);
    let head_paint = paint.without_dash();
    for angle in [std::f64::consts::FRAC_PI_6, -std::f64::consts::FRAC_PI_6] {
        let dir = rotate(back, angle);
        let end = KPoint::new(tip.x + dir.x * wing_len, tip.y + dir.y * wing_len);
        let mut wing = BezPath::new();
        wing.move_to(tip);
        wing.line_to(end);
        stroke_path(surface, &wing, &head_paint);
    }
}

fn rotate(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StrokeStyle;

    fn pencil(points: Vec<Point>, color: &str, width: f64) -> DrawingAction {
        DrawingAction {
            kind: DrawingKind::Pencil,
            points,
            color: color.to_string(),
            width,
            style: StrokeStyle::Solid,
        }
    }

    #[test]
    fn spline_passes_through_every_input_point() {
        let points = vec![
            Point::new(10.0, 10.0),
            Point::new(30.0, 40.0),
            Point::new(60.0, 20.0),
            Point::new(90.0, 50.0),
        ];
        let path = spline_through(&points);
        let on_curve: Vec<KPoint> = path
            .segments()
            .map(|seg| seg.eval(1.0))
            .collect();
        assert_eq!(on_curve.len(), points.len() - 1);
        for (seg_end, expect) in on_curve.iter().zip(points.iter().skip(1)) {
            assert!((seg_end.x - expect.x).abs() < 1e-9);
            assert!((seg_end.y - expect.y).abs() < 1e-9);
        }
    }

    #[test]
    fn single_point_stroke_stamps_one_dab() {
        let mut surface = Surface::new(20, 20);
        let action = pencil(vec![Point::new(10.0, 10.0)], "#ff0000", 4.0);
        apply_drawing_action(&mut surface, &action);
        assert_eq!(surface.pixel(10, 10), [255, 0, 0, 255]);
        assert_eq!(surface.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn dotted_stroke_covers_fewer_pixels_than_solid() {
        let points = vec![Point::new(5.0, 10.0), Point::new(55.0, 10.0)];
        let mut solid = Surface::new(60, 20);
        apply_drawing_action(&mut solid, &pencil(points.clone(), "#000000", 4.0));
        let mut dotted = Surface::new(60, 20);
        let mut action = pencil(points, "#000000", 4.0);
        action.style = StrokeStyle::Dotted;
        apply_drawing_action(&mut dotted, &action);
        let count = |s: &Surface| s.to_vec().chunks_exact(4).filter(|px| px[3] != 0).count();
        assert!(count(&dotted) > 0);
        assert!(count(&dotted) < count(&solid));
    }

    #[test]
    fn curve_arrow_adds_pixels_beyond_the_bare_curve() {
        let points = vec![
            Point::new(20.0, 40.0),
            Point::new(40.0, 20.0),
            Point::new(60.0, 40.0),
        ];
        let mut curve = Surface::new(80, 80);
        let mut action = pencil(points, "#000000", 3.0);
        action.kind = DrawingKind::Curve;
        apply_drawing_action(&mut curve, &action);
        let mut arrow = Surface::new(80, 80);
        action.kind = DrawingKind::CurveArrow;
        apply_drawing_action(&mut arrow, &action);
        let count = |s: &Surface| s.to_vec().chunks_exact(4).filter(|px| px[3] != 0).count();
        assert!(count(&arrow) > count(&curve));
    }
}
