const HOVER_DELAY_SECONDS: f64 = 0.040;

/// Debounced hover target. A candidate must stay under the pointer for
/// `HOVER_DELAY_SECONDS` before it replaces what is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(in crate::app) enum HoverDebounce {
    #[default]
    Idle,
    Pending {
        candidate: Option<usize>,
        deadline: f64,
        shown: Option<usize>,
    },
    Committed(usize),
}

impl HoverDebounce {
    pub(in crate::app) fn shown(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Pending { shown, .. } => shown,
            Self::Committed(index) => Some(index),
        }
    }

    fn settled(shown: Option<usize>) -> Self {
        shown.map_or(Self::Idle, Self::Committed)
    }

    pub(in crate::app) fn observe(&mut self, candidate: Option<usize>, now: f64) {
        let shown = self.shown();
        if candidate == shown {
            *self = Self::settled(shown);
            return;
        }

        if let Self::Pending {
            candidate: pending, ..
        } = *self
            && pending == candidate
        {
            return;
        }

        *self = Self::Pending {
            candidate,
            deadline: now + HOVER_DELAY_SECONDS,
            shown,
        };
    }

    /// Commits a due candidate. Returns true when the shown node changed.
    pub(in crate::app) fn poll(&mut self, now: f64) -> bool {
        let Self::Pending {
            candidate,
            deadline,
            shown,
        } = *self
        else {
            return false;
        };

        if now < deadline {
            return false;
        }

        *self = Self::settled(candidate);
        candidate != shown
    }

    pub(in crate::app) fn deadline(self) -> Option<f64> {
        match self {
            Self::Pending { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    pub(in crate::app) fn reset(&mut self) {
        *self = Self::Idle;
    }
}
