//! Fixed delays between the loader's closing phases.

/// Delays (ms) for the zoom, split and hand-off phases.
///
/// Each delay is measured from the previous transition. `pre_split_ms` is
/// kept shorter than the zoom's visual duration so the split starts while
/// the zoom is still running; `pre_complete_ms` matches the split's visual
/// duration. The presenter's CSS owns the visual durations, so the two have
/// to be kept in step by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDelays {
    /// From the final word's hold elapsing to the zoom trigger.
    pub pre_zoom_ms: u32,
    /// From the zoom trigger to the split trigger.
    pub pre_split_ms: u32,
    /// From the split trigger to completion.
    pub pre_complete_ms: u32,
}

impl PhaseDelays {
    pub const DEFAULT_PRE_ZOOM_MS: u32 = 200;
    pub const DEFAULT_PRE_SPLIT_MS: u32 = 700;
    pub const DEFAULT_PRE_COMPLETE_MS: u32 = 1000;

    /// Total time spent after the last hold, zoom through completion.
    pub fn tail_ms(&self) -> u64 {
        u64::from(self.pre_zoom_ms) + u64::from(self.pre_split_ms) + u64::from(self.pre_complete_ms)
    }

    /// Applies `key = value` overrides, as read from `data-*` attributes.
    ///
    /// Unknown keys and unparsable values are logged and skipped; the
    /// previous value is kept.
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, raw) in overrides {
            let slot = match key {
                "pre-zoom-ms" | "preZoomMs" => &mut self.pre_zoom_ms,
                "pre-split-ms" | "preSplitMs" => &mut self.pre_split_ms,
                "pre-complete-ms" | "preCompleteMs" => &mut self.pre_complete_ms,
                other => {
                    log::warn!("ignoring unknown loader option {other:?}");
                    continue;
                }
            };
            match raw.trim().parse::<u32>() {
                Ok(ms) => *slot = ms,
                Err(err) => log::warn!("ignoring loader option {key}={raw:?}: {err}"),
            }
        }
        self
    }
}

impl Default for PhaseDelays {
    fn default() -> Self {
        Self {
            pre_zoom_ms: Self::DEFAULT_PRE_ZOOM_MS,
            pre_split_ms: Self::DEFAULT_PRE_SPLIT_MS,
            pre_complete_ms: Self::DEFAULT_PRE_COMPLETE_MS,
        }
    }
}
