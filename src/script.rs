//! Loader script: the fixed, ordered list of words the intro reveals.

use std::collections::BTreeSet;

use thiserror::Error;

/// One scripted word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Word to display. Never empty once part of a [`Script`].
    pub text: String,
    /// Char positions drawn filled; every other position is outlined.
    pub emphasis_mask: BTreeSet<usize>,
    /// How long the word stays on screen before the next one.
    pub hold_ms: u32,
    /// Set on the last word only.
    pub is_final: bool,
}

impl Step {
    /// Convenience constructor used by the constant tables and tests.
    pub fn new(text: &str, emphasis: &[usize], hold_ms: u32, is_final: bool) -> Self {
        Self {
            text: text.to_owned(),
            emphasis_mask: emphasis.iter().copied().collect(),
            hold_ms,
            is_final,
        }
    }

    /// Number of letters, counted in chars rather than bytes.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the letter at `index` is drawn filled.
    pub fn is_filled(&self, index: usize) -> bool {
        self.emphasis_mask.contains(&index)
    }
}

/// Reasons a list of steps cannot become a [`Script`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("script has no steps")]
    Empty,
    #[error("step {index} has empty text")]
    EmptyText { index: usize },
    #[error("step {index} marks letter {letter} but only has {len} letters")]
    MaskOutOfRange { index: usize, letter: usize, len: usize },
    #[error("no step is marked final")]
    NoFinal,
    #[error("{count} steps are marked final, expected exactly one")]
    MultipleFinal { count: usize },
    #[error("final step is at position {index}, expected the last position {last}")]
    FinalNotLast { index: usize, last: usize },
}

/// Validated, immutable sequence of steps.
///
/// Invariant: non-empty, exactly one final step, and it is the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Result<Self, ScriptError> {
        if steps.is_empty() {
            return Err(ScriptError::Empty);
        }

        for (index, step) in steps.iter().enumerate() {
            let len = step.len();
            if len == 0 {
                return Err(ScriptError::EmptyText { index });
            }
            if let Some(&letter) = step.emphasis_mask.iter().find(|&&i| i >= len) {
                return Err(ScriptError::MaskOutOfRange { index, letter, len });
            }
        }

        let finals: Vec<usize> = steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_final)
            .map(|(i, _)| i)
            .collect();
        let last = steps.len() - 1;
        match finals.as_slice() {
            [] => Err(ScriptError::NoFinal),
            [index] if *index != last => Err(ScriptError::FinalNotLast { index: *index, last }),
            [_] => Ok(Self { steps }),
            many => Err(ScriptError::MultipleFinal { count: many.len() }),
        }
    }

    /// The intro sequence shown on the landing page.
    pub fn reference() -> Self {
        let steps = REFERENCE_STEPS
            .iter()
            .map(|&(text, mask, hold_ms, is_final)| Step::new(text, mask, hold_ms, is_final))
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; kept for the usual `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of every hold, i.e. when the final word's hold elapses.
    pub fn total_hold_ms(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.hold_ms)).sum()
    }
}

impl TryFrom<Vec<Step>> for Script {
    type Error = ScriptError;

    fn try_from(steps: Vec<Step>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

// (text, filled letters, hold, final)
const REFERENCE_STEPS: &[(&str, &[usize], u32, bool)] = &[
    ("IDEAS", &[0, 2, 3], 600, false),
    ("TAKING", &[0, 2, 4, 5], 600, false),
    ("SHAPE", &[0, 2, 3], 650, false),
    ("NITHIN", &[0, 2, 3, 5], 1000, true),
];
