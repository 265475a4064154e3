use annotate_engine::{
    AnnotationEngine, CropRegion, DrawingKind, Element, ElementShape, FilterKind, Point,
    StrokeStyle,
};
use image::{Rgba, RgbaImage};
use std::io::Cursor;

fn rect_element(x: f64, y: f64, width: f64, height: f64) -> Element {
    Element {
        id: 0,
        stroke: "#df4b26".to_string(),
        stroke_width: 2.0,
        fill: "transparent".to_string(),
        draggable: true,
        shape: ElementShape::Rect { x, y, width, height },
    }
}

fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn rectangle_add_move_undo_redo_round_trip() {
    let mut engine = AnnotationEngine::new(200, 200);
    let id = engine.add_element(rect_element(10.0, 10.0, 40.0, 30.0)).unwrap();
    assert!(engine.move_element(id, rect_element(60.0, 80.0, 40.0, 30.0)));

    let rect_x = |engine: &AnnotationEngine| match engine.element(id).map(|e| e.shape.clone()) {
        Some(ElementShape::Rect { x, .. }) => Some(x),
        _ => None,
    };

    assert_eq!(rect_x(&engine), Some(60.0));

    assert!(engine.undo());
    assert_eq!(rect_x(&engine), Some(10.0));

    assert!(engine.undo());
    assert!(engine.element(id).is_none());

    assert!(engine.redo());
    assert_eq!(rect_x(&engine), Some(10.0));

    assert!(engine.redo());
    assert_eq!(rect_x(&engine), Some(60.0));
    assert!(!engine.can_redo());
}

#[test]
fn undo_n_then_redo_n_reproduces_exact_state() {
    let mut engine = AnnotationEngine::new(120, 120);
    assert!(engine.load_image(&png_bytes(120, 120, [200, 80, 40, 255])).contains("success"));
    engine
        .draw_stroke(
            DrawingKind::Pencil,
            vec![Point::new(10.0, 10.0), Point::new(60.0, 10.0)],
            "#ff0000",
            3.0,
            StrokeStyle::Solid,
        )
        .unwrap();
    let rect_id = engine.add_element(rect_element(20.0, 20.0, 30.0, 30.0)).unwrap();
    assert!(engine.move_element(rect_id, rect_element(50.0, 50.0, 30.0, 30.0)));
    assert!(engine.apply_filter(FilterKind::Grayscale));
    engine
        .draw_stroke(
            DrawingKind::Eraser,
            vec![Point::new(30.0, 5.0), Point::new(30.0, 15.0)],
            "#000000",
            8.0,
            StrokeStyle::Solid,
        )
        .unwrap();

    let n = engine.action_count();
    assert_eq!(n, 6);
    let base = engine.base_pixels();
    let drawing = engine.drawing_pixels();
    let elements = engine.get_elements();

    for _ in 0..n {
        assert!(engine.undo());
    }
    assert!(!engine.can_undo());
    assert!(engine.base_pixels().iter().all(|&b| b == 0));
    assert!(engine.drawing_pixels().iter().all(|&b| b == 0));
    assert_eq!(engine.get_elements(), "[]");

    for _ in 0..n {
        assert!(engine.redo());
    }
    assert!(!engine.can_redo());
    assert_eq!(engine.base_pixels(), base);
    assert_eq!(engine.drawing_pixels(), drawing);
    assert_eq!(engine.get_elements(), elements);
}

#[test]
fn new_action_after_undo_discards_the_redoable_suffix() {
    let mut engine = AnnotationEngine::new(100, 100);
    for i in 0..3 {
        engine
            .draw_stroke(
                DrawingKind::Pencil,
                vec![Point::new(10.0 + i as f64 * 10.0, 10.0), Point::new(20.0 + i as f64 * 10.0, 10.0)],
                "#000000",
                2.0,
                StrokeStyle::Solid,
            )
            .unwrap();
    }
    assert!(engine.undo());
    assert!(engine.undo());
    assert!(engine.can_redo());

    engine
        .draw_stroke(
            DrawingKind::Pencil,
            vec![Point::new(80.0, 80.0), Point::new(90.0, 90.0)],
            "#000000",
            2.0,
            StrokeStyle::Solid,
        )
        .unwrap();
    assert!(!engine.can_redo());
    // one surviving action plus the new one
    assert_eq!(engine.action_count(), 2);
    assert!(!engine.redo());
}

#[test]
fn undo_and_redo_on_empty_history_are_noops() {
    let mut engine = AnnotationEngine::new(50, 50);
    assert!(!engine.undo());
    assert!(!engine.redo());
    assert!(!engine.can_undo());
    assert!(!engine.can_redo());
    assert_eq!(engine.action_count(), 0);
}

#[test]
fn filter_undo_restores_base_bytes_exactly() {
    let mut engine = AnnotationEngine::new(60, 60);
    assert!(engine.load_image(&png_bytes(60, 60, [180, 90, 30, 255])).contains("success"));
    let original = engine.base_pixels();

    assert!(engine.apply_filter(FilterKind::Grayscale));
    assert_ne!(engine.base_pixels(), original);

    assert!(engine.undo());
    assert_eq!(engine.base_pixels(), original);
}

#[test]
fn crop_is_reversible_by_snapshot_restore() {
    let mut engine = AnnotationEngine::new(40, 40);
    assert!(engine.load_image(&png_bytes(40, 40, [10, 60, 200, 255])).contains("success"));
    let original = engine.base_pixels();

    assert!(engine.crop(CropRegion::new(10, 10, 20, 20)));
    assert_eq!(engine.base_width(), 20);
    assert_eq!(engine.base_height(), 20);

    assert!(engine.undo());
    assert_eq!(engine.base_width(), 40);
    assert_eq!(engine.base_pixels(), original);
}

#[test]
fn flatten_is_a_logged_reversible_action() {
    let mut engine = AnnotationEngine::new(100, 100);
    let id = engine.add_element(rect_element(10.0, 10.0, 40.0, 30.0)).unwrap();
    let blank_drawing = engine.drawing_pixels();

    assert!(engine.flatten());
    assert!(engine.element(id).is_none());
    let flattened_drawing = engine.drawing_pixels();
    assert_ne!(flattened_drawing, blank_drawing);

    assert!(engine.undo());
    assert!(engine.element(id).is_some());
    assert_eq!(engine.drawing_pixels(), blank_drawing);

    assert!(engine.redo());
    assert!(engine.element(id).is_none());
    assert_eq!(engine.drawing_pixels(), flattened_drawing);
}

#[test]
fn strokes_after_flatten_keep_the_flattened_pixels() {
    let mut engine = AnnotationEngine::new(100, 100);
    engine.add_element(rect_element(10.0, 10.0, 40.0, 30.0)).unwrap();
    assert!(engine.flatten());
    let border = engine.drawing_surface().pixel(10, 10);
    assert_eq!(border[3], 255);

    // a later stroke triggers a replay; the flattened rect must survive it
    engine
        .draw_stroke(
            DrawingKind::Pencil,
            vec![Point::new(80.0, 80.0), Point::new(90.0, 90.0)],
            "#000000",
            3.0,
            StrokeStyle::Solid,
        )
        .unwrap();
    assert_eq!(engine.drawing_surface().pixel(10, 10), border);
    assert_eq!(engine.drawing_surface().pixel(85, 85)[3], 255);

    assert!(engine.undo());
    assert_eq!(engine.drawing_surface().pixel(10, 10), border);
    assert_eq!(engine.drawing_surface().pixel(85, 85)[3], 0);

    assert!(engine.redo());
    assert_eq!(engine.drawing_surface().pixel(10, 10), border);
    assert_eq!(engine.drawing_surface().pixel(85, 85)[3], 255);
}

#[test]
fn degenerate_shapes_never_reach_the_log() {
    let mut engine = AnnotationEngine::new(100, 100);
    assert!(engine.add_element(rect_element(0.0, 0.0, 2.0, 2.0)).is_none());
    assert!(engine.draw_stroke(DrawingKind::Pencil, vec![], "#000000", 2.0, StrokeStyle::Solid).is_none());
    assert_eq!(engine.action_count(), 0);
}

#[test]
fn move_keeps_element_identity_stable() {
    let mut engine = AnnotationEngine::new(100, 100);
    let id = engine.add_element(rect_element(10.0, 10.0, 20.0, 20.0)).unwrap();
    assert!(engine.move_element(id, rect_element(40.0, 40.0, 20.0, 20.0)));
    assert!(engine.move_element(id, rect_element(70.0, 70.0, 20.0, 20.0)));
    assert_eq!(engine.element(id).map(|e| e.id), Some(id));
    assert_eq!(engine.live_elements().len(), 1);
}
