use photo_map_core::AnchorId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calibration workflow step. Serialized as its number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Step {
    /// Awaiting the tap for anchor A.
    #[default]
    AwaitingA,
    /// Anchor A set; awaiting the tap for anchor B.
    AwaitingB,
    /// Calibrated; live projection active.
    Navigating,
    /// Awaiting the replacement tap for anchor A.
    EditingA,
    /// Awaiting the replacement tap for anchor B.
    EditingB,
    /// Validating anchor A against the full transform.
    ValidatingA,
    /// Reserved for point-C refinement; no transition enters it.
    RefiningC,
    /// Validating anchor A's GPS stability before anchor B exists.
    StabilizingA,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown workflow step {0}")]
pub struct UnknownStep(pub u8);

impl TryFrom<u8> for Step {
    type Error = UnknownStep;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Ok(match v {
            0 => Step::AwaitingA,
            1 => Step::AwaitingB,
            2 => Step::Navigating,
            3 => Step::EditingA,
            4 => Step::EditingB,
            5 => Step::ValidatingA,
            6 => Step::RefiningC,
            7 => Step::StabilizingA,
            other => return Err(UnknownStep(other)),
        })
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        match step {
            Step::AwaitingA => 0,
            Step::AwaitingB => 1,
            Step::Navigating => 2,
            Step::EditingA => 3,
            Step::EditingB => 4,
            Step::ValidatingA => 5,
            Step::RefiningC => 6,
            Step::StabilizingA => 7,
        }
    }
}

impl Step {
    /// Steps in which the live GPS position is projected for display.
    #[inline]
    pub fn shows_live_position(self) -> bool {
        matches!(
            self,
            Step::Navigating | Step::ValidatingA | Step::StabilizingA
        )
    }

    /// Steps that run a quality-assessment loop.
    #[inline]
    pub fn is_validation(self) -> bool {
        matches!(self, Step::ValidatingA | Step::StabilizingA)
    }

    /// Steps awaiting a replacement tap for an existing anchor.
    #[inline]
    pub fn is_editing(self) -> bool {
        matches!(self, Step::EditingA | Step::EditingB)
    }

    /// Steps in which tapping an existing marker starts editing it.
    #[inline]
    pub fn allows_marker_edit(self) -> bool {
        matches!(self, Step::Navigating | Step::ValidatingA)
    }

    #[inline]
    pub fn editing(id: AnchorId) -> Step {
        match id {
            AnchorId::A => Step::EditingA,
            AnchorId::B => Step::EditingB,
        }
    }

    /// Anchors that must exist for this step to make sense.
    pub fn required_anchors(self) -> &'static [AnchorId] {
        match self {
            Step::AwaitingA => &[],
            Step::AwaitingB | Step::StabilizingA => &[AnchorId::A],
            Step::Navigating
            | Step::EditingA
            | Step::EditingB
            | Step::ValidatingA
            | Step::RefiningC => &[AnchorId::A, AnchorId::B],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::AwaitingA => "awaiting A",
            Step::AwaitingB => "awaiting B",
            Step::Navigating => "navigating",
            Step::EditingA => "editing A",
            Step::EditingB => "editing B",
            Step::ValidatingA => "validating A",
            Step::RefiningC => "refining C",
            Step::StabilizingA => "stabilizing A",
        };
        write!(f, "{} ({name})", u8::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_round_trips() {
        for n in 0u8..8 {
            let step = Step::try_from(n).expect("known step");
            assert_eq!(u8::from(step), n);
        }
        assert_eq!(Step::try_from(8), Err(UnknownStep(8)));
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&Step::StabilizingA).expect("serialize");
        assert_eq!(json, "7");
        assert!(serde_json::from_str::<Step>("42").is_err());
    }
}
