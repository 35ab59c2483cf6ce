//! Pose-estimation collaborator output.

use serde::{Deserialize, Serialize};

/// A normalized body landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another landmark.
    pub fn distance(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Result of running pose estimation on one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseDetection {
    /// A person was found; landmarks are in detector order.
    Found(Vec<Landmark>),
    /// No person in the frame.
    NotFound,
}

impl PoseDetection {
    /// Build a detection, treating an empty landmark list as not found.
    pub fn from_landmarks(landmarks: Vec<Landmark>) -> Self {
        if landmarks.is_empty() {
            Self::NotFound
        } else {
            Self::Found(landmarks)
        }
    }

    pub fn landmarks(&self) -> Option<&[Landmark]> {
        match self {
            Self::Found(landmarks) => Some(landmarks),
            Self::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.3, 0.4, 0.0);
        assert!((a.distance(&b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_landmarks_are_not_found() {
        assert_eq!(PoseDetection::from_landmarks(vec![]), PoseDetection::NotFound);
    }

    #[test]
    fn test_landmark_z_defaults_to_zero() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.1,"y":0.2}"#).unwrap();
        assert_eq!(lm.z, 0.0);
    }
}
