/// Rate limit for proximity reactions.
///
/// Engaged by a detection and released by the next slow tick, so at most one
/// reaction happens per cooldown window. Detections while engaged are not
/// queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Throttle {
    #[default]
    Open,
    Throttled,
}

impl Throttle {
    pub fn is_open(self) -> bool {
        self == Throttle::Open
    }

    pub fn engage(&mut self) {
        *self = Throttle::Throttled;
    }

    /// Reopens the gate. Returns `true` only if it was engaged.
    pub fn release(&mut self) -> bool {
        let was_throttled = *self == Throttle::Throttled;
        *self = Throttle::Open;
        was_throttled
    }
}
