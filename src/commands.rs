use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;
use wasm_bindgen::prelude::*;
use crate::elements::{Element, ElementShape};
use crate::engine::AnnotationEngine;
use crate::filters::{CropRegion, FilterKind};
use crate::types::{DrawingKind, Point, StrokeStyle};

#[wasm_bindgen]
impl AnnotationEngine {
    pub fn execute_command(&mut self, cmd_json: &str) -> String {
        #[derive(Deserialize)]
        struct Command {
            action: String,
            #[serde(default)]
            params: serde_json::Value,
        }

        let cmd: Command = match serde_json::from_str(cmd_json) {
            Ok(c) => c,
            Err(e) => return format!("{{\"error\": \"Invalid JSON: {}\"}}", e),
        };

        match cmd.action.as_str() {
            "draw_stroke" => {
                let kind = match cmd.params["kind"].as_str().and_then(DrawingKind::from_name) {
                    Some(k) => k,
                    None => return "{ \"error\": \"Unknown stroke kind\" }".to_string(),
                };
                let points = parse_points(&cmd.params["points"]);
                let color = cmd.params["color"].as_str().unwrap_or("#df4b26");
                let width = cmd.params["width"].as_f64().unwrap_or(3.0);
                let style = cmd.params["style"]
                    .as_str()
                    .and_then(StrokeStyle::from_name)
                    .unwrap_or(StrokeStyle::Solid);
                match self.draw_stroke(kind, points, color, width, style) {
                    Some(id) => format!("{{\"success\": true, \"id\": {}}}", id),
                    None => "{ \"error\": \"Empty stroke\" }".to_string(),
                }
            }
            "add_element" => {
                let element = match element_from_params(&cmd.params) {
                    Some(e) => e,
                    None => return "{ \"error\": \"Invalid element params\" }".to_string(),
                };
                match self.add_element(element) {
                    Some(id) => format!("{{\"success\": true, \"id\": {}}}", id),
                    None => "{ \"error\": \"Element too small\" }".to_string(),
                }
            }
            "move_element" => {
                let id = cmd.params["id"].as_u64().map(|v| v as u32).unwrap_or(0);
                let mut data = match self.element(id) {
                    Some(e) => e.clone(),
                    None => return "{ \"error\": \"Element not found\" }".to_string(),
                };
                patch_element(&mut data, &cmd.params);
                if data.is_degenerate() {
                    return "{ \"error\": \"Element too small\" }".to_string();
                }
                if self.move_element(id, data) {
                    "{ \"success\": true }".to_string()
                } else {
                    "{ \"error\": \"Element not found\" }".to_string()
                }
            }
            "load_image" => {
                // accepts raw base64 or a full data URL
                let encoded = match cmd.params["data"].as_str() {
                    Some(s) => s.rsplit(',').next().unwrap_or(s),
                    None => return "{ \"error\": \"Missing image data\" }".to_string(),
                };
                match general_purpose::STANDARD.decode(encoded) {
                    Ok(bytes) => self.load_image(&bytes),
                    Err(_) => "{ \"error\": \"Invalid base64 image data\" }".to_string(),
                }
            }
            "undo" => format!("{{\"success\": {}}}", self.undo()),
            "redo" => format!("{{\"success\": {}}}", self.redo()),
            "apply_filter" => {
                let filter = match cmd.params["filter"].as_str().and_then(FilterKind::from_name) {
                    Some(f) => f,
                    None => return "{ \"error\": \"Unknown filter\" }".to_string(),
                };
                if self.apply_filter(filter) {
                    "{ \"success\": true }".to_string()
                } else {
                    "{ \"error\": \"No base image\" }".to_string()
                }
            }
            "crop" => {
                let region = CropRegion::new(
                    cmd.params["x"].as_u64().unwrap_or(0) as u32,
                    cmd.params["y"].as_u64().unwrap_or(0) as u32,
                    cmd.params["width"].as_u64().unwrap_or(0) as u32,
                    cmd.params["height"].as_u64().unwrap_or(0) as u32,
                );
                if self.crop(region) {
                    "{ \"success\": true }".to_string()
                } else {
                    "{ \"error\": \"Empty crop region\" }".to_string()
                }
            }
            "flatten" => {
                if self.flatten() {
                    "{ \"success\": true }".to_string()
                } else {
                    "{ \"error\": \"No live elements\" }".to_string()
                }
            }
            "get_history" => self.get_history(),
            "get_elements" => self.get_elements(),
            "export" => format!("{{\"success\": true, \"data_url\": \"{}\"}}", self.export_data_url()),
            _ => format!("{{\"error\": \"Unknown action: {}\"}}", cmd.action),
        }
    }
}

fn parse_points(value: &serde_json::Value) -> Vec<Point> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|p| Point::new(p["x"].as_f64().unwrap_or(0.0), p["y"].as_f64().unwrap_or(0.0)))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_point(value: &serde_json::Value) -> Option<Point> {
    match (value["x"].as_f64(), value["y"].as_f64()) {
        (Some(x), Some(y)) => Some(Point::new(x, y)),
        _ => None,
    }
}

fn element_from_params(params: &serde_json::Value) -> Option<Element> {
    let shape = match params["kind"].as_str()? {
        "rectangle" => ElementShape::Rect {
            x: params["x"].as_f64().unwrap_or(0.0),
            y: params["y"].as_f64().unwrap_or(0.0),
            width: params["width"].as_f64().unwrap_or(0.0),
            height: params["height"].as_f64().unwrap_or(0.0),
        },
        "circle" => ElementShape::Circle {
            x: params["x"].as_f64().unwrap_or(0.0),
            y: params["y"].as_f64().unwrap_or(0.0),
            radius: params["radius"].as_f64().unwrap_or(0.0),
        },
        "arrow" => ElementShape::Arrow {
            start: parse_point(&params["start"])?,
            end: parse_point(&params["end"])?,
        },
        "double_arrow" => ElementShape::DoubleArrow {
            start: parse_point(&params["start"])?,
            end: parse_point(&params["end"])?,
        },
        "text" => ElementShape::Text {
            x: params["x"].as_f64().unwrap_or(0.0),
            y: params["y"].as_f64().unwrap_or(0.0),
            text: params["text"].as_str().unwrap_or("").to_string(),
            font_size: params["font_size"].as_f64().unwrap_or(24.0),
        },
        _ => return None,
    };
    Some(Element {
        id: params["id"].as_u64().map(|v| v as u32).unwrap_or(0),
        stroke: params["stroke"].as_str().unwrap_or("#df4b26").to_string(),
        stroke_width: params["stroke_width"].as_f64().unwrap_or(2.0),
        fill: params["fill"].as_str().unwrap_or("transparent").to_string(),
        draggable: params["draggable"].as_bool().unwrap_or(true),
        shape,
    })
}

fn patch_element(element: &mut Element, params: &serde_json::Value) {
    if let Some(v) = params["stroke"].as_str() { element.stroke = v.to_string(); }
    if let Some(v) = params["stroke_width"].as_f64() { element.stroke_width = v; }
    if let Some(v) = params["fill"].as_str() { element.fill = v.to_string(); }
    if let Some(v) = params["draggable"].as_bool() { element.draggable = v; }
    match &mut element.shape {
        ElementShape::Rect { x, y, width, height } => {
            if let Some(v) = params["x"].as_f64() { *x = v; }
            if let Some(v) = params["y"].as_f64() { *y = v; }
            if let Some(v) = params["width"].as_f64() { *width = v; }
            if let Some(v) = params["height"].as_f64() { *height = v; }
        }
        ElementShape::Circle { x, y, radius } => {
            if let Some(v) = params["x"].as_f64() { *x = v; }
            if let Some(v) = params["y"].as_f64() { *y = v; }
            if let Some(v) = params["radius"].as_f64() { *radius = v; }
        }
        ElementShape::Arrow { start, end } | ElementShape::DoubleArrow { start, end } => {
            if let Some(p) = parse_point(&params["start"]) { *start = p; }
            if let Some(p) = parse_point(&params["end"]) { *end = p; }
        }
        ElementShape::Text { x, y, text, font_size } => {
            if let Some(v) = params["x"].as_f64() { *x = v; }
            if let Some(v) = params["y"].as_f64() { *y = v; }
            if let Some(v) = params["text"].as_str() { *text = v.to_string(); }
            if let Some(v) = params["font_size"].as_f64() { *font_size = v; }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_stroke_command_appends_to_the_log() {
        let mut engine = AnnotationEngine::new(100, 100);
        let res = engine.execute_command(
            r##"{"action": "draw_stroke", "params": {"kind": "pencil", "points": [{"x": 10, "y": 10}, {"x": 20, "y": 10}], "color": "#ff0000", "width": 3}}"##,
        );
        assert!(res.contains("success"), "unexpected response: {res}");
        assert_eq!(engine.action_count(), 1);
        assert!(engine.can_undo());
    }

    #[test]
    fn unknown_action_reports_an_error() {
        let mut engine = AnnotationEngine::new(100, 100);
        let res = engine.execute_command(r#"{"action": "frobnicate", "params": {}}"#);
        assert!(res.contains("Unknown action"));
    }

    #[test]
    fn add_then_move_element_via_commands() {
        let mut engine = AnnotationEngine::new(200, 200);
        let res = engine.execute_command(
            r#"{"action": "add_element", "params": {"kind": "rectangle", "x": 10, "y": 10, "width": 40, "height": 30}}"#,
        );
        assert!(res.contains("success"), "unexpected response: {res}");
        let res = engine.execute_command(r#"{"action": "move_element", "params": {"id": 1, "x": 60}}"#);
        assert!(res.contains("success"), "unexpected response: {res}");
        match engine.element(1).map(|e| &e.shape) {
            Some(ElementShape::Rect { x, .. }) => assert_eq!(*x, 60.0),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn load_image_command_decodes_base64() {
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([5, 6, 7, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        let encoded = general_purpose::STANDARD.encode(&bytes);

        let mut engine = AnnotationEngine::new(8, 8);
        let res = engine.execute_command(&format!(
            "{{\"action\": \"load_image\", \"params\": {{\"data\": \"{}\"}}}}",
            encoded
        ));
        assert!(res.contains("success"), "unexpected response: {res}");
        assert_eq!(engine.base_width(), 8);
        assert_eq!(engine.action_count(), 1);

        let res = engine.execute_command(&format!(
            "{{\"action\": \"load_image\", \"params\": {{\"data\": \"data:image/png;base64,{}\"}}}}",
            encoded
        ));
        assert!(res.contains("success"), "unexpected response: {res}");

        let res = engine.execute_command(r#"{"action": "load_image", "params": {"data": "!!!"}}"#);
        assert!(res.contains("error"));
    }

    #[test]
    fn degenerate_move_reports_a_distinct_error() {
        let mut engine = AnnotationEngine::new(200, 200);
        let res = engine.execute_command(
            r#"{"action": "add_element", "params": {"kind": "rectangle", "x": 10, "y": 10, "width": 40, "height": 30}}"#,
        );
        assert!(res.contains("success"), "unexpected response: {res}");

        let res = engine.execute_command(r#"{"action": "move_element", "params": {"id": 1, "width": 2}}"#);
        assert!(res.contains("too small"), "unexpected response: {res}");
        assert_eq!(engine.action_count(), 1);

        let res = engine.execute_command(r#"{"action": "move_element", "params": {"id": 99, "x": 5}}"#);
        assert!(res.contains("not found"), "unexpected response: {res}");
    }

    #[test]
    fn undersized_element_never_reaches_the_log() {
        let mut engine = AnnotationEngine::new(200, 200);
        let res = engine.execute_command(
            r#"{"action": "add_element", "params": {"kind": "rectangle", "x": 0, "y": 0, "width": 2, "height": 2}}"#,
        );
        assert!(res.contains("error"));
        assert_eq!(engine.action_count(), 0);
    }
}
