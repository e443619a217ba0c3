use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_COLOR_LEN: usize = 64;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pen,
    Eraser,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One freehand mark as it travels on the wire and sits in a session's history.
///
/// The color is carried under the `stroke` key, matching the canvas line
/// attributes the drawing clients use.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub tool: Tool,
    #[serde(with = "points_format")]
    pub points: Vec<Point>,
    #[serde(rename = "stroke")]
    pub color: String,
    pub stroke_width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrokeLimits {
    pub max_points: usize,
}

impl Default for StrokeLimits {
    fn default() -> Self {
        Self { max_points: 10_000 }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StrokeError {
    #[error("stroke has no points")]
    NoPoints,
    #[error("stroke has {count} points, limit is {max}")]
    TooManyPoints { count: usize, max: usize },
    #[error("stroke contains a non-finite coordinate")]
    NonFinitePoint,
    #[error("stroke color is empty")]
    EmptyColor,
    #[error("stroke color is longer than {} bytes", MAX_COLOR_LEN)]
    ColorTooLong,
    #[error("stroke width {0} is not a positive number")]
    InvalidWidth(f64),
}

impl Stroke {
    pub fn validate(&self, limits: &StrokeLimits) -> Result<(), StrokeError> {
        validate_points(&self.points, 0, limits)?;
        if self.color.is_empty() {
            return Err(StrokeError::EmptyColor);
        }
        if self.color.len() > MAX_COLOR_LEN {
            return Err(StrokeError::ColorTooLong);
        }
        if !self.stroke_width.is_finite() || self.stroke_width <= 0.0 {
            return Err(StrokeError::InvalidWidth(self.stroke_width));
        }
        Ok(())
    }
}

/// Checks a batch of points about to land on a stroke that already holds
/// `existing` points.
pub fn validate_points(
    points: &[Point],
    existing: usize,
    limits: &StrokeLimits,
) -> Result<(), StrokeError> {
    if points.is_empty() {
        return Err(StrokeError::NoPoints);
    }
    let count = existing + points.len();
    if count > limits.max_points {
        return Err(StrokeError::TooManyPoints {
            count,
            max: limits.max_points,
        });
    }
    if !points.iter().all(Point::is_finite) {
        return Err(StrokeError::NonFinitePoint);
    }
    Ok(())
}

/// Points are emitted as a flat `[x0, y0, x1, y1, ...]` list and accepted
/// either flat or as `{x, y}` objects.
pub mod points_format {
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Point;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Flat(Vec<f64>),
        Objects(Vec<Point>),
    }

    pub fn serialize<S: Serializer>(points: &[Point], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(points.len() * 2))?;
        for point in points {
            seq.serialize_element(&point.x)?;
            seq.serialize_element(&point.y)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point>, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Flat(values) => {
                if values.len() % 2 != 0 {
                    return Err(D::Error::custom("flattened point list has an odd length"));
                }
                Ok(values
                    .chunks_exact(2)
                    .map(|pair| Point {
                        x: pair[0],
                        y: pair[1],
                    })
                    .collect())
            }
            Repr::Objects(points) => Ok(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen(points: Vec<Point>) -> Stroke {
        Stroke {
            tool: Tool::Pen,
            points,
            color: "#000".into(),
            stroke_width: 3.0,
        }
    }

    #[test]
    fn parses_flattened_points() {
        let stroke: Stroke = serde_json::from_str(
            r##"{"tool":"pen","points":[0,0,5,5],"stroke":"#000","strokeWidth":3}"##,
        )
        .unwrap();
        assert_eq!(
            stroke.points,
            vec![Point { x: 0.0, y: 0.0 }, Point { x: 5.0, y: 5.0 }]
        );
        assert_eq!(stroke.tool, Tool::Pen);
        assert_eq!(stroke.color, "#000");
    }

    #[test]
    fn parses_point_objects_and_emits_flat() {
        let stroke: Stroke = serde_json::from_str(
            r##"{"tool":"eraser","points":[{"x":1.5,"y":2}],"stroke":"#fff","strokeWidth":10}"##,
        )
        .unwrap();
        let value = serde_json::to_value(&stroke).unwrap();
        assert_eq!(value["points"], serde_json::json!([1.5, 2.0]));
        assert_eq!(value["tool"], "eraser");
        assert_eq!(value["strokeWidth"], 10.0);
    }

    #[test]
    fn rejects_malformed_shapes() {
        let odd = r##"{"tool":"pen","points":[0,0,5],"stroke":"#000","strokeWidth":3}"##;
        assert!(serde_json::from_str::<Stroke>(odd).is_err());

        let not_array = r##"{"tool":"pen","points":"0,0","stroke":"#000","strokeWidth":3}"##;
        assert!(serde_json::from_str::<Stroke>(not_array).is_err());

        let unknown_tool = r##"{"tool":"brush","points":[0,0],"stroke":"#000","strokeWidth":3}"##;
        assert!(serde_json::from_str::<Stroke>(unknown_tool).is_err());

        let numeric_color = r#"{"tool":"pen","points":[0,0],"stroke":0,"strokeWidth":3}"#;
        assert!(serde_json::from_str::<Stroke>(numeric_color).is_err());
    }

    #[test]
    fn validate_checks_points_color_and_width() {
        let limits = StrokeLimits::default();
        assert_eq!(pen(vec![]).validate(&limits), Err(StrokeError::NoPoints));

        let mut stroke = pen(vec![Point { x: 0.0, y: f64::NAN }]);
        assert_eq!(stroke.validate(&limits), Err(StrokeError::NonFinitePoint));

        stroke.points = vec![Point { x: 1.0, y: 1.0 }];
        stroke.stroke_width = 0.0;
        assert_eq!(stroke.validate(&limits), Err(StrokeError::InvalidWidth(0.0)));

        stroke.stroke_width = 2.0;
        stroke.color.clear();
        assert_eq!(stroke.validate(&limits), Err(StrokeError::EmptyColor));

        stroke.color = "#123456".into();
        assert_eq!(stroke.validate(&limits), Ok(()));
    }

    #[test]
    fn point_limit_counts_existing_points() {
        let limits = StrokeLimits { max_points: 3 };
        let batch = [Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }];
        assert_eq!(validate_points(&batch, 1, &limits), Ok(()));
        assert_eq!(
            validate_points(&batch, 2, &limits),
            Err(StrokeError::TooManyPoints { count: 4, max: 3 })
        );
    }
}
