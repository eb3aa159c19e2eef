/// Engine lifecycle: nothing executes until the first reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Constructed but never reset.
    #[default]
    Uninitialized,
    /// Power-on values applied; `step()` may run.
    Ready,
}

impl RunState {
    /// Returns `true` once the engine has been reset.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}
