use serde::{Deserialize, Serialize};

use super::classifier::{Verdict, VerdictKind};

/// Lifecycle phase of the monitoring loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MonitorPhase {
    /// Subject not in the exercise posture.
    Idle,
    /// Subject just entered the exercise posture; one confirmation frame
    /// is required before verdicts are surfaced.
    Engaged,
    /// Subject sustained the exercise posture; verdicts are acted on.
    Analyzing,
}

impl Default for MonitorPhase {
    fn default() -> Self {
        MonitorPhase::Idle
    }
}

/// Tracks the idle → engaged → analyzing progression across frames.
/// Runs for the lifetime of the monitoring session; there is no terminal
/// phase.
#[derive(Debug, Clone, Default)]
pub struct PostureStateMachine {
    phase: MonitorPhase,
}

impl PostureStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    /// Advance one frame. Returns the verdict to act on, which exists only
    /// while the machine is in `Analyzing` with the subject still engaged.
    pub fn observe(&mut self, verdict: &Verdict) -> Option<VerdictKind> {
        let engaged = verdict.kind.is_engaged();

        self.phase = match self.phase {
            MonitorPhase::Idle => {
                if engaged {
                    MonitorPhase::Engaged
                } else {
                    MonitorPhase::Idle
                }
            }
            // One full extra frame of confirmation, whatever it classified as.
            MonitorPhase::Engaged => MonitorPhase::Analyzing,
            MonitorPhase::Analyzing => {
                if engaged {
                    MonitorPhase::Analyzing
                } else {
                    MonitorPhase::Idle
                }
            }
        };

        if self.phase == MonitorPhase::Analyzing && engaged {
            Some(verdict.kind)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::classifier::AngleReadout;

    fn verdict(kind: VerdictKind) -> Verdict {
        Verdict {
            kind,
            angles: AngleReadout::default(),
        }
    }

    #[test]
    fn engaged_frames_walk_idle_engaged_analyzing() {
        let mut machine = PostureStateMachine::new();
        assert_eq!(machine.phase(), MonitorPhase::Idle);

        assert!(machine.observe(&verdict(VerdictKind::Good)).is_none());
        assert_eq!(machine.phase(), MonitorPhase::Engaged);

        assert_eq!(
            machine.observe(&verdict(VerdictKind::Good)),
            Some(VerdictKind::Good)
        );
        assert_eq!(machine.phase(), MonitorPhase::Analyzing);

        assert_eq!(
            machine.observe(&verdict(VerdictKind::TooUpright)),
            Some(VerdictKind::TooUpright)
        );
        assert_eq!(machine.phase(), MonitorPhase::Analyzing);
    }

    #[test]
    fn disengaging_returns_to_idle_from_analyzing() {
        let mut machine = PostureStateMachine::new();
        machine.observe(&verdict(VerdictKind::Good));
        machine.observe(&verdict(VerdictKind::Good));
        assert_eq!(machine.phase(), MonitorPhase::Analyzing);

        assert!(machine.observe(&verdict(VerdictKind::Waiting)).is_none());
        assert_eq!(machine.phase(), MonitorPhase::Idle);
    }

    #[test]
    fn waiting_frames_never_leave_idle() {
        let mut machine = PostureStateMachine::new();
        for _ in 0..3 {
            assert!(machine.observe(&verdict(VerdictKind::Waiting)).is_none());
            assert_eq!(machine.phase(), MonitorPhase::Idle);
        }
    }

    #[test]
    fn engaged_phase_surfaces_nothing() {
        let mut machine = PostureStateMachine::new();
        // First engaged frame is classified but not acted on.
        assert!(machine.observe(&verdict(VerdictKind::TooBent)).is_none());
    }

    #[test]
    fn blip_engagement_passes_through_analyzing_silently() {
        let mut machine = PostureStateMachine::new();
        machine.observe(&verdict(VerdictKind::Good));
        assert_eq!(machine.phase(), MonitorPhase::Engaged);

        // The confirmation frame came back disengaged: the one-step advance
        // still happens, but no verdict is surfaced.
        assert!(machine.observe(&verdict(VerdictKind::NoDetection)).is_none());
        assert_eq!(machine.phase(), MonitorPhase::Analyzing);

        assert!(machine.observe(&verdict(VerdictKind::Waiting)).is_none());
        assert_eq!(machine.phase(), MonitorPhase::Idle);
    }
}
