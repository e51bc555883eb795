//! The scenario exchange format: JSON export with fixed precision,
//! field-level validated import.

use std::error::Error;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use trisim_core::{Body, BodyId};

/// Decimal digits retained for numeric body fields on export.
const EXPORT_DIGITS: i32 = 6;

/// Minimum body count accepted on import.
///
/// The algorithm is defined for N ≥ 2; every shipped preset uses 3.
const MIN_BODIES: usize = 2;

// ── ScenarioError ────────────────────────────────────────────────

/// Errors detected while importing a scenario.
///
/// Import is all-or-nothing: any error leaves the caller's simulation
/// state untouched. Body indices in messages are 1-based, matching the
/// numbering users see in the configuration UI.
#[derive(Debug, PartialEq)]
pub enum ScenarioError {
    /// The input was not valid JSON.
    Parse {
        /// The underlying parser message.
        reason: String,
    },
    /// The top-level value had no `bodies` array.
    MissingBodies,
    /// Fewer than the minimum number of bodies.
    TooFewBodies {
        /// How many bodies the input contained.
        found: usize,
    },
    /// A body is missing one of its seven required fields.
    MissingField {
        /// 1-based body index.
        body: usize,
        /// The absent field.
        field: &'static str,
    },
    /// A numeric body field was not a finite JSON number.
    NotANumber {
        /// 1-based body index.
        body: usize,
        /// The offending field.
        field: &'static str,
    },
    /// A body's `color` was not a string.
    NotAString {
        /// 1-based body index.
        body: usize,
        /// The offending field.
        field: &'static str,
    },
    /// A top-level setting had the wrong type.
    InvalidSetting {
        /// The offending setting key.
        key: &'static str,
    },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { reason } => write!(f, "invalid JSON: {reason}"),
            Self::MissingBodies => write!(f, "configuration must contain a bodies array"),
            Self::TooFewBodies { found } => {
                write!(
                    f,
                    "configuration must contain at least {MIN_BODIES} bodies, found {found}"
                )
            }
            Self::MissingField { body, field } => {
                write!(f, "body {body} missing required field: {field}")
            }
            Self::NotANumber { body, field } => {
                write!(f, "body {body} field {field} must be a finite number")
            }
            Self::NotAString { body, field } => {
                write!(f, "body {body} field {field} must be a string")
            }
            Self::InvalidSetting { key } => {
                write!(f, "setting {key} has the wrong type")
            }
        }
    }
}

impl Error for ScenarioError {}

// ── Scenario ─────────────────────────────────────────────────────

/// A load/export configuration unit: body list plus simulation
/// parameters.
///
/// Serializes to the camelCase JSON shape the original exchange format
/// uses; [`export_json`](Scenario::export_json) additionally truncates
/// numeric body fields to six decimal digits.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// The body collection, in insertion order.
    pub bodies: Vec<Body>,
    /// Time-acceleration multiplier.
    pub time_speed: f64,
    /// Display-only: trail length in samples.
    pub trail_length: u32,
    /// Display-only: whether velocity vectors are drawn.
    pub show_velocity_vectors: bool,
    /// Timestamp recorded at export time, if any. Opaque passthrough.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    /// Free-form description. Opaque passthrough.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Scenario {
    /// A scenario with the given bodies and the default settings
    /// (speed 1.0, trail 100, vectors hidden).
    pub fn new(bodies: Vec<Body>) -> Self {
        Self {
            bodies,
            time_speed: 1.0,
            trail_length: 100,
            show_velocity_vectors: false,
            exported_at: None,
            description: None,
        }
    }

    /// Serialize to pretty-printed JSON with numeric body fields
    /// rounded to six decimal digits.
    ///
    /// The rounding matches the original export truncation; importing
    /// the result reproduces bodies and speed within 1e-6.
    pub fn export_json(&self) -> String {
        let rounded = Self {
            bodies: self.bodies.iter().map(round_body).collect(),
            ..self.clone()
        };
        // Scenario contains no map keys or non-string types that can
        // fail serialization.
        serde_json::to_string_pretty(&rounded).expect("scenario serialization cannot fail")
    }

    /// Parse and validate a scenario from JSON.
    ///
    /// Validation is synchronous and complete before returning: at
    /// least [`MIN_BODIES`] bodies, all seven fields present on every
    /// body, and `x, y, vx, vy, mass` finite. Errors identify the
    /// offending body and field.
    pub fn from_json(input: &str) -> Result<Self, ScenarioError> {
        let value: Value = serde_json::from_str(input).map_err(|e| ScenarioError::Parse {
            reason: e.to_string(),
        })?;

        let raw_bodies = value
            .get("bodies")
            .and_then(Value::as_array)
            .ok_or(ScenarioError::MissingBodies)?;
        if raw_bodies.len() < MIN_BODIES {
            return Err(ScenarioError::TooFewBodies {
                found: raw_bodies.len(),
            });
        }

        let mut bodies = Vec::with_capacity(raw_bodies.len());
        for (index, raw) in raw_bodies.iter().enumerate() {
            bodies.push(parse_body(raw, index + 1)?);
        }

        let time_speed = optional_number(&value, "timeSpeed")?.unwrap_or(1.0);
        let trail_length = match optional_number(&value, "trailLength")? {
            Some(v) => v.max(1.0) as u32,
            None => 100,
        };
        let show_velocity_vectors = match value.get("showVelocityVectors") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(ScenarioError::InvalidSetting {
                    key: "showVelocityVectors",
                })
            }
        };

        Ok(Self {
            bodies,
            time_speed,
            trail_length,
            show_velocity_vectors,
            exported_at: value
                .get("exportedAt")
                .and_then(Value::as_str)
                .map(str::to_owned),
            description: value
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
    }
}

/// Round a value to [`EXPORT_DIGITS`] decimal digits.
fn round6(v: f64) -> f64 {
    let scale = 10f64.powi(EXPORT_DIGITS);
    (v * scale).round() / scale
}

fn round_body(body: &Body) -> Body {
    Body {
        x: round6(body.x),
        y: round6(body.y),
        vx: round6(body.vx),
        vy: round6(body.vy),
        mass: round6(body.mass),
        ..body.clone()
    }
}

/// Extract one body, checking presence and finiteness of every field.
fn parse_body(raw: &Value, body_index: usize) -> Result<Body, ScenarioError> {
    let field = |name: &'static str| -> Result<&Value, ScenarioError> {
        match raw.get(name) {
            None | Some(Value::Null) => Err(ScenarioError::MissingField {
                body: body_index,
                field: name,
            }),
            Some(v) => Ok(v),
        }
    };
    let numeric = |name: &'static str| -> Result<f64, ScenarioError> {
        field(name)?
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or(ScenarioError::NotANumber {
                body: body_index,
                field: name,
            })
    };

    let id = field("id")?
        .as_u64()
        .ok_or(ScenarioError::NotANumber {
            body: body_index,
            field: "id",
        })?;
    let color = field("color")?
        .as_str()
        .ok_or(ScenarioError::NotAString {
            body: body_index,
            field: "color",
        })?
        .to_owned();

    Ok(Body {
        id: BodyId(id as u32),
        x: numeric("x")?,
        y: numeric("y")?,
        vx: numeric("vx")?,
        vy: numeric("vy")?,
        mass: numeric("mass")?,
        color,
    })
}

/// Read an optional finite number from a top-level key.
fn optional_number(value: &Value, key: &'static str) -> Result<Option<f64>, ScenarioError> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or(ScenarioError::InvalidSetting { key }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_bodies() -> Vec<Body> {
        vec![
            Body::new(1u32, -0.97000436, 0.24308753, 0.466203685, 0.43236573, 1.0, "#ff0000"),
            Body::new(2u32, 0.97000436, -0.24308753, 0.466203685, 0.43236573, 1.0, "#00ff00"),
            Body::new(3u32, 0.0, 0.0, -0.93240737, -0.86473146, 1.0, "#0000ff"),
        ]
    }

    // ── Round trip ───────────────────────────────────────────

    #[test]
    fn export_then_import_reproduces_bodies_and_speed() {
        let mut scenario = Scenario::new(three_bodies());
        scenario.time_speed = 2.5;
        scenario.trail_length = 250;

        let imported = Scenario::from_json(&scenario.export_json()).unwrap();

        assert_eq!(imported.time_speed, 2.5);
        assert_eq!(imported.trail_length, 250);
        assert_eq!(imported.bodies.len(), 3);
        for (a, b) in scenario.bodies.iter().zip(imported.bodies.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.color, b.color);
            assert!((a.x - b.x).abs() < 1e-6);
            assert!((a.y - b.y).abs() < 1e-6);
            assert!((a.vx - b.vx).abs() < 1e-6);
            assert!((a.vy - b.vy).abs() < 1e-6);
            assert!((a.mass - b.mass).abs() < 1e-6);
        }
    }

    #[test]
    fn export_truncates_to_six_digits() {
        let mut scenario = Scenario::new(three_bodies());
        scenario.bodies[0].x = 0.123456789;
        let json = scenario.export_json();
        assert!(json.contains("0.123457"));
        assert!(!json.contains("0.123456789"));
    }

    #[test]
    fn export_uses_camel_case_keys() {
        let json = Scenario::new(three_bodies()).export_json();
        assert!(json.contains("\"timeSpeed\""));
        assert!(json.contains("\"trailLength\""));
        assert!(json.contains("\"showVelocityVectors\""));
    }

    // ── Import validation ────────────────────────────────────

    #[test]
    fn import_rejects_invalid_json() {
        match Scenario::from_json("{not json") {
            Err(ScenarioError::Parse { .. }) => {}
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn import_rejects_missing_bodies() {
        match Scenario::from_json(r#"{"timeSpeed": 1.0}"#) {
            Err(ScenarioError::MissingBodies) => {}
            other => panic!("expected MissingBodies, got {other:?}"),
        }
    }

    #[test]
    fn import_rejects_single_body() {
        let json = r##"{"bodies": [
            {"id": 1, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#fff"}
        ]}"##;
        match Scenario::from_json(json) {
            Err(ScenarioError::TooFewBodies { found: 1 }) => {}
            other => panic!("expected TooFewBodies, got {other:?}"),
        }
    }

    #[test]
    fn import_names_the_missing_field_and_body() {
        let json = r##"{"bodies": [
            {"id": 1, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#fff"},
            {"id": 2, "x": 0, "y": 0, "vy": 0, "mass": 1, "color": "#fff"}
        ]}"##;
        match Scenario::from_json(json) {
            Err(ScenarioError::MissingField { body: 2, field: "vx" }) => {}
            other => panic!("expected MissingField body 2 vx, got {other:?}"),
        }
    }

    #[test]
    fn import_rejects_non_numeric_field() {
        let json = r##"{"bodies": [
            {"id": 1, "x": "zero", "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#fff"},
            {"id": 2, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#fff"}
        ]}"##;
        match Scenario::from_json(json) {
            Err(ScenarioError::NotANumber { body: 1, field: "x" }) => {}
            other => panic!("expected NotANumber body 1 x, got {other:?}"),
        }
    }

    #[test]
    fn import_rejects_null_field_as_missing() {
        let json = r##"{"bodies": [
            {"id": 1, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": null, "color": "#fff"},
            {"id": 2, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#fff"}
        ]}"##;
        match Scenario::from_json(json) {
            Err(ScenarioError::MissingField { body: 1, field: "mass" }) => {}
            other => panic!("expected MissingField body 1 mass, got {other:?}"),
        }
    }

    #[test]
    fn import_rejects_non_string_color() {
        let json = r##"{"bodies": [
            {"id": 1, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": 7},
            {"id": 2, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#fff"}
        ]}"##;
        match Scenario::from_json(json) {
            Err(ScenarioError::NotAString { body: 1, field: "color" }) => {}
            other => panic!("expected NotAString body 1 color, got {other:?}"),
        }
    }

    #[test]
    fn import_defaults_settings_when_absent() {
        let json = r##"{"bodies": [
            {"id": 1, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#fff"},
            {"id": 2, "x": 1, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#000"}
        ]}"##;
        let scenario = Scenario::from_json(json).unwrap();
        assert_eq!(scenario.time_speed, 1.0);
        assert_eq!(scenario.trail_length, 100);
        assert!(!scenario.show_velocity_vectors);
    }

    #[test]
    fn import_rejects_wrong_typed_time_speed() {
        let json = r##"{"bodies": [
            {"id": 1, "x": 0, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#fff"},
            {"id": 2, "x": 1, "y": 0, "vx": 0, "vy": 0, "mass": 1, "color": "#000"}
        ], "timeSpeed": "fast"}"##;
        match Scenario::from_json(json) {
            Err(ScenarioError::InvalidSetting { key: "timeSpeed" }) => {}
            other => panic!("expected InvalidSetting timeSpeed, got {other:?}"),
        }
    }

    #[test]
    fn import_accepts_two_bodies() {
        let json = r##"{"bodies": [
            {"id": 1, "x": -1, "y": 0, "vx": 0, "vy": -0.5, "mass": 1, "color": "#fff"},
            {"id": 2, "x": 1, "y": 0, "vx": 0, "vy": 0.5, "mass": 1, "color": "#000"}
        ]}"##;
        let scenario = Scenario::from_json(json).unwrap();
        assert_eq!(scenario.bodies.len(), 2);
        assert_eq!(scenario.bodies[0].id, BodyId(1));
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = ScenarioError::MissingField { body: 2, field: "vy" };
        assert_eq!(err.to_string(), "body 2 missing required field: vy");
        let err = ScenarioError::NotANumber { body: 1, field: "mass" };
        assert!(err.to_string().contains("finite number"));
    }
}
