use serde::{Deserialize, Serialize};
use std::fmt;

/// Label shown next to a detected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Real,
    NotReal,
}

impl Status {
    /// Display text drawn above the face.
    pub fn label(self) -> &'static str {
        match self {
            Status::Real => "real",
            Status::NotReal => "not real",
        }
    }

    pub fn is_real(self) -> bool {
        self == Status::Real
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bounding box of a detected face, in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Top edge y-coordinate plus height.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

/// One face as reported by the external detection model for a single frame.
///
/// Only `region` is required. Age, gender and expressions are pass-through
/// values from the model and are drawn verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub region: BoundingBox,
    #[serde(default)]
    pub landmarks: Option<Vec<(f32, f32)>>,
    #[serde(default)]
    pub age: Option<f32>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Confidence of `gender` in [0, 1].
    #[serde(default)]
    pub gender_probability: Option<f32>,
    /// Expression name to confidence in [0, 1], in the order the model
    /// reported them. Serialized as a JSON object.
    #[serde(default, with = "ordered_map")]
    pub expressions: Vec<(String, f32)>,
}

impl FaceRecord {
    /// A record carrying only a bounding box.
    pub fn from_region(region: BoundingBox) -> Self {
        Self {
            region,
            landmarks: None,
            age: None,
            gender: None,
            gender_probability: None,
            expressions: Vec::new(),
        }
    }

    /// Highest-confidence expression. Ties resolve to the expression the
    /// model reported first.
    pub fn dominant_expression(&self) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for &(ref name, confidence) in &self.expressions {
            match best {
                Some((_, c)) if confidence <= c => {}
                _ => best = Some((name.as_str(), confidence)),
            }
        }
        best
    }
}

/// Object keys kept in document order.
mod ordered_map {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(
        entries: &[(String, f32)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (name, value) in entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, f32)>, D::Error> {
        struct Entries;

        impl<'de> Visitor<'de> for Entries {
            type Value = Vec<(String, f32)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of expression names to confidences")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, f32>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(Entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(Status::Real.label(), "real");
        assert_eq!(Status::NotReal.to_string(), "not real");
        assert_eq!(Status::default(), Status::Real);
    }

    #[test]
    fn test_dominant_expression() {
        let mut face = FaceRecord::from_region(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        face.expressions.push(("neutral".into(), 0.2));
        face.expressions.push(("happy".into(), 0.7));
        face.expressions.push(("sad".into(), 0.1));
        assert_eq!(face.dominant_expression(), Some(("happy", 0.7)));
    }

    #[test]
    fn test_dominant_expression_tie_prefers_reported_first() {
        let face: FaceRecord = serde_json::from_str(
            r#"{"region":{"x":0,"y":0,"width":10,"height":10},
                "expressions":{"surprised":0.5,"neutral":0.1,"angry":0.5}}"#,
        )
        .unwrap();
        let names: Vec<&str> = face.expressions.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["surprised", "neutral", "angry"]);
        assert_eq!(face.dominant_expression(), Some(("surprised", 0.5)));
    }

    #[test]
    fn test_expressions_serialize_as_object() {
        let mut face = FaceRecord::from_region(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        face.expressions.push(("sad".into(), 0.25));
        face.expressions.push(("happy".into(), 0.5));
        let json = serde_json::to_value(&face).unwrap();
        assert_eq!(json["expressions"], serde_json::json!({"sad": 0.25, "happy": 0.5}));
    }

    #[test]
    fn test_dominant_expression_empty() {
        let face = FaceRecord::from_region(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(face.dominant_expression().is_none());
    }

    #[test]
    fn test_record_deserializes_with_only_region() {
        let face: FaceRecord =
            serde_json::from_str(r#"{"region":{"x":1,"y":2,"width":3,"height":4}}"#).unwrap();
        assert_eq!(face.region, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        assert!(face.age.is_none());
        assert!(face.expressions.is_empty());
    }
}
