use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one active contact.
///
/// Only unique among contacts that are currently down; the input system is free to hand the
/// same value to a later contact once the earlier one has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub u64);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ContactId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// 2D coordinate in the overlay's local space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`, `t` in 0..=1
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Lifecycle stage of a contact within one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Cancelled,
}

impl ContactPhase {
    /// Ended or Cancelled
    pub fn is_terminal(self) -> bool {
        matches!(self, ContactPhase::Ended | ContactPhase::Cancelled)
    }
}

impl fmt::Display for ContactPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactPhase::Began => write!(f, "began"),
            ContactPhase::Moved => write!(f, "moved"),
            ContactPhase::Stationary => write!(f, "stationary"),
            ContactPhase::Ended => write!(f, "ended"),
            ContactPhase::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSample {
    pub id: ContactId,
    pub phase: ContactPhase,
    pub position: Point,
}

impl ContactSample {
    pub fn new(id: impl Into<ContactId>, phase: ContactPhase, position: impl Into<Point>) -> Self {
        Self {
            id: id.into(),
            phase,
            position: position.into(),
        }
    }

    pub fn began(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, ContactPhase::Began, (x, y))
    }

    pub fn moved(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, ContactPhase::Moved, (x, y))
    }

    pub fn stationary(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, ContactPhase::Stationary, (x, y))
    }

    pub fn ended(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, ContactPhase::Ended, (x, y))
    }

    pub fn cancelled(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, ContactPhase::Cancelled, (x, y))
    }
}

/// Samples delivered atomically by the input system, one per active contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBatch {
    pub samples: Vec<ContactSample>,
}

impl EventBatch {
    pub fn new(samples: Vec<ContactSample>) -> Self {
        Self { samples }
    }

    pub fn single(sample: ContactSample) -> Self {
        Self {
            samples: vec![sample],
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContactSample> {
        self.samples.iter()
    }
}

impl FromIterator<ContactSample> for EventBatch {
    fn from_iter<I: IntoIterator<Item = ContactSample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Anything flowing through the display's dispatch path.
///
/// Only touch batches concern the overlay; everything else is passed along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    Touches(EventBatch),
    Other { kind: String },
}

impl InputEvent {
    pub fn touches(&self) -> Option<&EventBatch> {
        match self {
            InputEvent::Touches(batch) => Some(batch),
            InputEvent::Other { .. } => None,
        }
    }
}

impl From<EventBatch> for InputEvent {
    fn from(batch: EventBatch) -> Self {
        InputEvent::Touches(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(ContactPhase::Ended.is_terminal());
        assert!(ContactPhase::Cancelled.is_terminal());
        assert!(!ContactPhase::Began.is_terminal());
        assert!(!ContactPhase::Moved.is_terminal());
        assert!(!ContactPhase::Stationary.is_terminal());
    }

    #[test]
    fn test_point_lerp() {
        let a = Point::new(0.0, 10.0);
        let b = Point::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.5), Point::new(5.0, 15.0));
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn test_input_event_json_shape() {
        let json = r#"{
            "type": "touches",
            "samples": [
                { "id": 7, "phase": "began", "position": { "x": 10.0, "y": 12.5 } }
            ]
        }"#;

        let event: InputEvent = serde_json::from_str(json).unwrap();
        let batch = event.touches().expect("touch batch");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.samples[0], ContactSample::began(7, 10.0, 12.5));

        let other: InputEvent = serde_json::from_str(r#"{ "type": "other", "kind": "key" }"#).unwrap();
        assert!(other.touches().is_none());
    }
}
