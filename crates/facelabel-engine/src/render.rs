use facelabel_core::{DrawCommand, OverlayFrame};
use std::io::{self, Write};

/// Draws one overlay frame. Each call replaces the previous frame.
pub trait Renderer {
    fn render(&mut self, frame: &OverlayFrame) -> io::Result<()>;
}

/// Human-readable overlay listing, one line per draw command.
pub struct TextRenderer<W> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, frame: &OverlayFrame) -> io::Result<()> {
        let labels: Vec<&str> = frame.statuses.iter().map(|s| s.label()).collect();
        writeln!(
            self.out,
            "tick {}: {} face(s) [{}]",
            frame.tick,
            frame.face_count(),
            labels.join(", ")
        )?;
        for command in &frame.commands {
            match command {
                DrawCommand::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                } => writeln!(self.out, "  rect ({x:.1}, {y:.1}) {width:.1}x{height:.1}")?,
                DrawCommand::Text { text, x, y } => {
                    writeln!(self.out, "  text ({x:.1}, {y:.1}) {text:?}")?
                }
                DrawCommand::Points { points } => {
                    writeln!(self.out, "  points {}", points.len())?
                }
            }
        }
        self.out.flush()
    }
}

/// One JSON object per frame (newline-delimited).
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, frame: &OverlayFrame) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facelabel_core::{compose, BoundingBox, FaceRecord, Status};

    fn frame() -> OverlayFrame {
        let mut record = FaceRecord::from_region(BoundingBox::new(10.0, 30.0, 40.0, 40.0));
        record.landmarks = Some(vec![(1.0, 1.0); 5]);
        OverlayFrame {
            tick: 4,
            statuses: vec![Status::NotReal],
            commands: compose(&record, Status::NotReal),
        }
    }

    #[test]
    fn test_text_renderer_output() {
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(&frame()).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "tick 4: 1 face(s) [not real]",
                "  rect (10.0, 30.0) 40.0x40.0",
                "  text (10.0, 20.0) \"not real\"",
                "  points 5",
            ]
        );
    }

    #[test]
    fn test_text_renderer_empty_frame() {
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(&OverlayFrame::default()).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(text, "tick 0: 0 face(s) []\n");
    }

    #[test]
    fn test_json_renderer_output() {
        let mut renderer = JsonRenderer::new(Vec::new());
        renderer.render(&frame()).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["tick"], 4);
        assert_eq!(value["statuses"][0], "not_real");
        assert_eq!(value["commands"][0]["kind"], "stroke_rect");
        assert_eq!(value["commands"][1]["text"], "not real");
    }
}
