use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A named anatomical keypoint produced by pose estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LandmarkKind {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One frame's worth of detected keypoints. Immutable after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    landmarks: HashMap<LandmarkKind, Landmark>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: LandmarkKind, landmark: Landmark) {
        self.landmarks.insert(kind, landmark);
    }

    pub fn with(mut self, kind: LandmarkKind, x: f64, y: f64, visibility: f64) -> Self {
        self.insert(kind, Landmark { x, y, visibility });
        self
    }

    /// Landmark position, or `None` if it is missing or below the visibility
    /// floor.
    pub fn visible_point(&self, kind: LandmarkKind, min_visibility: f64) -> Option<Point> {
        self.landmarks
            .get(&kind)
            .filter(|lm| lm.visibility >= min_visibility)
            .map(Landmark::point)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

/// What the pose provider saw in one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "landmarks")]
pub enum PoseFrame {
    NoDetection,
    Detected(LandmarkSet),
}

/// Black-box source of per-frame keypoints. Camera acquisition and ML
/// inference live behind this seam.
pub trait PoseProvider: Send {
    /// Next frame, `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<PoseFrame>>;
}

/// Reads one JSON-encoded [`PoseFrame`] per line from a file or pipe, so any
/// upstream pose-estimation process can drive the monitor.
pub struct JsonlPoseProvider<R> {
    reader: R,
    line: String,
}

impl JsonlPoseProvider<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open pose input {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl JsonlPoseProvider<BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: BufRead> JsonlPoseProvider<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead + Send> PoseProvider for JsonlPoseProvider<R> {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .context("failed to read pose frame")?;
            if read == 0 {
                return Ok(None);
            }

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let frame: PoseFrame =
                serde_json::from_str(trimmed).context("malformed pose frame")?;
            return Ok(Some(frame));
        }
    }
}
