use serde::{Deserialize, Serialize};

use crate::geometry::{self, Point};
use crate::pose::{LandmarkKind, LandmarkSet};

/// Angle thresholds for the monitored exercise, in degrees.
///
/// The squat profile keeps two knee thresholds: the subject counts as having
/// entered the exercise once both knees bend below `knee_engaged_max_degrees`,
/// and counts as fully descended once both pass `knee_descended_max_degrees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThresholdProfile {
    pub knee_engaged_max_degrees: f64,
    pub knee_descended_max_degrees: f64,
    pub back_good_min_degrees: f64,
    pub back_good_max_degrees: f64,
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self::squat()
    }
}

impl ThresholdProfile {
    /// Canonical squat profile: engage below 150°, full depth below 120°,
    /// good back band [85°, 100°].
    pub fn squat() -> Self {
        Self {
            knee_engaged_max_degrees: 150.0,
            knee_descended_max_degrees: 120.0,
            back_good_min_degrees: 85.0,
            back_good_max_degrees: 100.0,
        }
    }

    /// Straight-back profile: a single rule, back held above 140°. No
    /// separate depth threshold.
    pub fn straight_back() -> Self {
        Self {
            knee_engaged_max_degrees: 150.0,
            knee_descended_max_degrees: 150.0,
            back_good_min_degrees: 140.0,
            back_good_max_degrees: 180.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerdictKind {
    Good,
    TooUpright,
    TooBent,
    NotDescendedEnough,
    Waiting,
    NoDetection,
}

impl VerdictKind {
    /// The subject is in the exercise posture.
    pub fn is_engaged(&self) -> bool {
        matches!(
            self,
            VerdictKind::Good
                | VerdictKind::TooUpright
                | VerdictKind::TooBent
                | VerdictKind::NotDescendedEnough
        )
    }

    /// A posture fault worth feedback.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            VerdictKind::TooUpright | VerdictKind::TooBent | VerdictKind::NotDescendedEnough
        )
    }
}

/// The angles a verdict was derived from, for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleReadout {
    pub back: Option<f64>,
    pub knee_left: Option<f64>,
    pub knee_right: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub kind: VerdictKind,
    pub angles: AngleReadout,
}

impl Verdict {
    pub fn no_detection() -> Self {
        Self {
            kind: VerdictKind::NoDetection,
            angles: AngleReadout::default(),
        }
    }
}

/// Endpoint of an angle ray: a landmark, or the midpoint of two.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    Single(LandmarkKind),
    Midpoint(LandmarkKind, LandmarkKind),
}

impl Anchor {
    fn resolve(&self, set: &LandmarkSet, min_visibility: f64) -> Option<Point> {
        match *self {
            Anchor::Single(kind) => set.visible_point(kind, min_visibility),
            Anchor::Midpoint(a, b) => {
                let pa = set.visible_point(a, min_visibility)?;
                let pb = set.visible_point(b, min_visibility)?;
                Some(Point::midpoint(pa, pb))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum AngleForm {
    Atan2,
    Acos,
}

#[derive(Debug, Clone, Copy)]
enum AngleName {
    Back,
    KneeLeft,
    KneeRight,
}

struct AngleSpec {
    name: AngleName,
    a: Anchor,
    vertex: Anchor,
    b: Anchor,
    form: AngleForm,
}

/// The back angle sits at the shoulder midpoint, between the hip midpoint and
/// the nose; knee angles sit at each knee between hip and ankle.
const ANGLE_TABLE: [AngleSpec; 3] = [
    AngleSpec {
        name: AngleName::Back,
        a: Anchor::Midpoint(LandmarkKind::LeftHip, LandmarkKind::RightHip),
        vertex: Anchor::Midpoint(LandmarkKind::LeftShoulder, LandmarkKind::RightShoulder),
        b: Anchor::Single(LandmarkKind::Nose),
        form: AngleForm::Atan2,
    },
    AngleSpec {
        name: AngleName::KneeLeft,
        a: Anchor::Single(LandmarkKind::LeftHip),
        vertex: Anchor::Single(LandmarkKind::LeftKnee),
        b: Anchor::Single(LandmarkKind::LeftAnkle),
        form: AngleForm::Acos,
    },
    AngleSpec {
        name: AngleName::KneeRight,
        a: Anchor::Single(LandmarkKind::RightHip),
        vertex: Anchor::Single(LandmarkKind::RightKnee),
        b: Anchor::Single(LandmarkKind::RightAnkle),
        form: AngleForm::Acos,
    },
];

fn measure_angles(set: &LandmarkSet, min_visibility: f64) -> AngleReadout {
    let mut readout = AngleReadout::default();
    for spec in &ANGLE_TABLE {
        let angle = (|| {
            let a = spec.a.resolve(set, min_visibility)?;
            let vertex = spec.vertex.resolve(set, min_visibility)?;
            let b = spec.b.resolve(set, min_visibility)?;
            match spec.form {
                AngleForm::Atan2 => geometry::angle_between(a, vertex, b),
                AngleForm::Acos => geometry::angle_between_acos(a, vertex, b),
            }
        })();

        match spec.name {
            AngleName::Back => readout.back = angle,
            AngleName::KneeLeft => readout.knee_left = angle,
            AngleName::KneeRight => readout.knee_right = angle,
        }
    }
    readout
}

/// Classify one frame's landmarks. Pure: the same landmarks and profile
/// always yield the same verdict.
pub fn classify(set: &LandmarkSet, profile: &ThresholdProfile, min_visibility: f64) -> Verdict {
    let angles = measure_angles(set, min_visibility);

    let (Some(back), Some(knee_left), Some(knee_right)) =
        (angles.back, angles.knee_left, angles.knee_right)
    else {
        return Verdict {
            kind: VerdictKind::NoDetection,
            angles,
        };
    };

    let engaged = knee_left < profile.knee_engaged_max_degrees
        && knee_right < profile.knee_engaged_max_degrees;
    if !engaged {
        return Verdict {
            kind: VerdictKind::Waiting,
            angles,
        };
    }

    let kind = if knee_left >= profile.knee_descended_max_degrees
        || knee_right >= profile.knee_descended_max_degrees
    {
        VerdictKind::NotDescendedEnough
    } else if back > profile.back_good_max_degrees {
        VerdictKind::TooUpright
    } else if back < profile.back_good_min_degrees {
        VerdictKind::TooBent
    } else {
        VerdictKind::Good
    };

    Verdict { kind, angles }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A subject whose knee and back angles come out close to the requested
    /// values. Knees at the given angle between vertical hip-knee and the
    /// ankle ray; back tilted so hip-shoulder-nose opens to `back_deg`.
    fn subject(knee_left_deg: f64, knee_right_deg: f64, back_deg: f64) -> LandmarkSet {
        let mut set = LandmarkSet::new();

        for (hip, knee, ankle, knee_deg, x) in [
            (
                LandmarkKind::LeftHip,
                LandmarkKind::LeftKnee,
                LandmarkKind::LeftAnkle,
                knee_left_deg,
                0.4,
            ),
            (
                LandmarkKind::RightHip,
                LandmarkKind::RightKnee,
                LandmarkKind::RightAnkle,
                knee_right_deg,
                0.6,
            ),
        ] {
            // Hip straight above the knee; ankle placed so the interior
            // angle at the knee equals knee_deg.
            set.insert(
                hip,
                crate::pose::Landmark {
                    x,
                    y: 0.5,
                    visibility: 1.0,
                },
            );
            set.insert(
                knee,
                crate::pose::Landmark {
                    x,
                    y: 0.7,
                    visibility: 1.0,
                },
            );
            let theta = knee_deg.to_radians();
            set.insert(
                ankle,
                crate::pose::Landmark {
                    x: x + 0.2 * theta.sin(),
                    y: 0.7 - 0.2 * theta.cos(),
                    visibility: 1.0,
                },
            );
        }

        // Shoulders straight above the hip midpoint; nose placed so the
        // angle at the shoulder midpoint equals back_deg.
        for (shoulder, x) in [
            (LandmarkKind::LeftShoulder, 0.4),
            (LandmarkKind::RightShoulder, 0.6),
        ] {
            set.insert(
                shoulder,
                crate::pose::Landmark {
                    x,
                    y: 0.3,
                    visibility: 1.0,
                },
            );
        }
        let theta = back_deg.to_radians();
        set.insert(
            LandmarkKind::Nose,
            crate::pose::Landmark {
                x: 0.5 + 0.1 * theta.sin(),
                y: 0.3 + 0.1 * theta.cos(),
                visibility: 1.0,
            },
        );

        set
    }

    #[test]
    fn deep_squat_with_neutral_back_is_good() {
        let set = subject(100.0, 98.0, 92.0);
        let verdict = classify(&set, &ThresholdProfile::squat(), 0.5);
        assert_eq!(verdict.kind, VerdictKind::Good);
        assert!((verdict.angles.back.unwrap() - 92.0).abs() < 1.0);
    }

    #[test]
    fn upright_back_is_flagged() {
        let set = subject(100.0, 98.0, 110.0);
        let verdict = classify(&set, &ThresholdProfile::squat(), 0.5);
        assert_eq!(verdict.kind, VerdictKind::TooUpright);
    }

    #[test]
    fn collapsed_back_is_flagged() {
        let set = subject(100.0, 98.0, 60.0);
        let verdict = classify(&set, &ThresholdProfile::squat(), 0.5);
        assert_eq!(verdict.kind, VerdictKind::TooBent);
    }

    #[test]
    fn straight_legs_mean_waiting() {
        let set = subject(160.0, 158.0, 92.0);
        let verdict = classify(&set, &ThresholdProfile::squat(), 0.5);
        assert_eq!(verdict.kind, VerdictKind::Waiting);
    }

    #[test]
    fn shallow_bend_is_not_descended_enough() {
        // Engaged (below 150) but short of full depth (120).
        let set = subject(135.0, 132.0, 92.0);
        let verdict = classify(&set, &ThresholdProfile::squat(), 0.5);
        assert_eq!(verdict.kind, VerdictKind::NotDescendedEnough);
    }

    #[test]
    fn hidden_knee_yields_no_detection() {
        let mut set = subject(100.0, 98.0, 92.0);
        set.insert(
            LandmarkKind::LeftKnee,
            crate::pose::Landmark {
                x: 0.4,
                y: 0.7,
                visibility: 0.2,
            },
        );
        let verdict = classify(&set, &ThresholdProfile::squat(), 0.5);
        assert_eq!(verdict.kind, VerdictKind::NoDetection);
    }

    #[test]
    fn empty_landmark_set_yields_no_detection() {
        let verdict = classify(&LandmarkSet::new(), &ThresholdProfile::squat(), 0.5);
        assert_eq!(verdict.kind, VerdictKind::NoDetection);
    }

    #[test]
    fn classification_is_deterministic() {
        let set = subject(100.0, 98.0, 92.0);
        let profile = ThresholdProfile::squat();
        let first = classify(&set, &profile, 0.5);
        let second = classify(&set, &profile, 0.5);
        assert_eq!(first, second);
    }

    #[test]
    fn straight_back_profile_uses_single_band() {
        let profile = ThresholdProfile::straight_back();
        let bent = subject(100.0, 98.0, 120.0);
        assert_eq!(classify(&bent, &profile, 0.5).kind, VerdictKind::TooBent);
        let straight = subject(100.0, 98.0, 160.0);
        assert_eq!(classify(&straight, &profile, 0.5).kind, VerdictKind::Good);
    }
}
