//! Per-letter styling the presenter derives from the current step.

use crate::script::Step;
use crate::timeline::TimelineSnapshot;

/// Total stagger spread across a word: the first letter lands at 0ms, the
/// last one just short of this.
pub const LETTER_STAGGER_MS: f32 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Filled,
    Outlined,
}

impl Fill {
    /// CSS class the static page styles.
    pub fn class(self) -> &'static str {
        match self {
            Fill::Filled => "filled",
            Fill::Outlined => "outlined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterStyle {
    pub ch: char,
    pub index: usize,
    pub fill: Fill,
    /// Reveal delay; letters further right land later.
    pub delay_ms: f32,
}

/// One entry per letter of `step`, in order.
pub fn letter_styles(step: &Step) -> Vec<LetterStyle> {
    let total = step.len();
    step.text
        .chars()
        .enumerate()
        .map(|(index, ch)| LetterStyle {
            ch,
            index,
            fill: if step.is_filled(index) { Fill::Filled } else { Fill::Outlined },
            delay_ms: index as f32 / total as f32 * LETTER_STAGGER_MS,
        })
        .collect()
}

/// Whether the word on screen has to be rebuilt for `next`.
///
/// Compares the whole step: a repeated word with a different mask or final
/// flag is a different word.
pub fn needs_redraw(shown: Option<&Step>, next: Option<&Step>) -> bool {
    shown != next
}

/// Only the final word zooms, and only once the zoom has been triggered.
pub fn zoom_applies(snapshot: &TimelineSnapshot) -> bool {
    snapshot.zoom_triggered && snapshot.current_step.as_ref().is_some_and(|s| s.is_final)
}
