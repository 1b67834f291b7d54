use std::time::Duration;

/// What the dispatcher does when every sender queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaturationPolicy {
    /// Refuse immediately with [`DispatchError::Saturated`](crate::DispatchError::Saturated).
    #[default]
    FailFast,

    /// Wait up to `timeout` for queue space, then refuse.
    Block { timeout: Duration },
}

impl SaturationPolicy {
    /// Maximum wait for queue space (`None` for fail-fast).
    pub fn wait_budget(&self) -> Option<Duration> {
        match self {
            SaturationPolicy::FailFast => None,
            SaturationPolicy::Block { timeout } => Some(*timeout),
        }
    }
}
