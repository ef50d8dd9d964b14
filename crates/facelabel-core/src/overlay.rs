//! Renderer-agnostic overlay for one detection frame.
//!
//! Layout relative to the face box `(x, y, w, h)`:
//! status label centred above at `(x + w/2 - 20, y - 10)`, then gender, age
//! and dominant expression stacked below the box at 20 px steps.

use crate::debouncer::StatusDebouncer;
use crate::random::RandomSource;
use crate::types::{FaceRecord, Status};
use serde::Serialize;

// --- Layout constants (display pixels) ---
const LABEL_OFFSET_X: f32 = 20.0;
const LABEL_OFFSET_Y: f32 = 10.0;
const LINE_STEP: f32 = 20.0;

/// One drawing primitive. The renderer clears its surface once per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
    },
    Points {
        points: Vec<(f32, f32)>,
    },
}

/// Everything drawn for one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OverlayFrame {
    pub tick: u64,
    /// Status assigned to each face, in detection order.
    pub statuses: Vec<Status>,
    pub commands: Vec<DrawCommand>,
}

impl OverlayFrame {
    pub fn face_count(&self) -> usize {
        self.statuses.len()
    }
}

/// Draw commands for a single face.
pub fn compose(record: &FaceRecord, status: Status) -> Vec<DrawCommand> {
    let region = &record.region;
    let below = region.bottom();
    let mut commands = vec![
        DrawCommand::StrokeRect {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        },
        DrawCommand::Text {
            text: status.label().to_string(),
            x: region.center_x() - LABEL_OFFSET_X,
            y: region.y - LABEL_OFFSET_Y,
        },
    ];

    if let Some(gender) = &record.gender {
        let probability = record.gender_probability.unwrap_or(0.0);
        commands.push(DrawCommand::Text {
            text: format!("{gender} ({})", percent(probability)),
            x: region.x,
            y: below + LINE_STEP,
        });
    }

    if let Some(age) = record.age {
        commands.push(DrawCommand::Text {
            text: format!("Age: {}", age.round() as i64),
            x: region.x,
            y: below + 2.0 * LINE_STEP,
        });
    }

    if let Some((name, confidence)) = record.dominant_expression() {
        commands.push(DrawCommand::Text {
            text: format!("Expression: {name} ({})", percent(confidence)),
            x: region.x,
            y: below + 3.0 * LINE_STEP,
        });
    }

    if let Some(points) = record.landmarks.as_ref().filter(|p| !p.is_empty()) {
        commands.push(DrawCommand::Points {
            points: points.clone(),
        });
    }

    commands
}

/// Start a debouncer frame, evaluate it once per record (identity = list
/// position) and compose the full overlay for this tick.
pub fn compose_frame<R: RandomSource>(
    tick: u64,
    records: &[FaceRecord],
    debouncer: &mut StatusDebouncer<R>,
) -> OverlayFrame {
    debouncer.begin_frame();
    let mut frame = OverlayFrame {
        tick,
        statuses: Vec::with_capacity(records.len()),
        commands: Vec::new(),
    };
    for (identity, record) in records.iter().enumerate() {
        let status = debouncer.evaluate(Some(identity));
        frame.statuses.push(status);
        frame.commands.extend(compose(record, status));
    }
    frame
}

fn percent(fraction: f32) -> String {
    format!("{:.1}%", fraction * 100.0)
}
