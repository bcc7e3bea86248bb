//! Pan gesture tracking.
//!
//! While a pan gesture is active every pointer sample is mapped against the
//! origin latched when the gesture began, not the live grab origin that the
//! compositor keeps moving underneath it.

/// Where the pan gesture is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanState {
    Idle,
    Panning { origin: (f32, f32) },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanSession {
    state: PanState,
}

impl Default for PanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PanSession {
    pub fn new() -> Self {
        Self {
            state: PanState::Idle,
        }
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, PanState::Panning { .. })
    }

    /// Advance the state machine for one pointer sample.
    ///
    /// `qualifying` is "primary button held, pan modifier held, pointer
    /// moving". `live_origin` is read only when a new gesture starts. The
    /// sample that ends a gesture still maps against the latched origin, so
    /// the release lands where the last drag sample did.
    /// Returns the origin to map this sample against.
    pub fn update(&mut self, qualifying: bool, live_origin: (f32, f32)) -> (f32, f32) {
        match (self.state, qualifying) {
            (PanState::Panning { origin }, true) => origin,
            (PanState::Idle, true) => {
                log::debug!("pan start, origin latched at {:?}", live_origin);
                self.state = PanState::Panning {
                    origin: live_origin,
                };
                live_origin
            }
            (PanState::Panning { origin }, false) => {
                log::debug!("pan end");
                self.state = PanState::Idle;
                origin
            }
            (PanState::Idle, false) => live_origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_uses_live_origin() {
        let mut pan = PanSession::new();
        assert_eq!(pan.update(false, (10.0, 20.0)), (10.0, 20.0));
        assert_eq!(pan.update(false, (11.0, 21.0)), (11.0, 21.0));
        assert!(!pan.is_panning());
    }

    #[test]
    fn test_origin_latched_for_whole_gesture() {
        let mut pan = PanSession::new();
        assert_eq!(pan.update(true, (100.0, 50.0)), (100.0, 50.0));
        assert!(pan.is_panning());
        assert_eq!(pan.update(true, (140.0, 90.0)), (100.0, 50.0));
        assert_eq!(pan.update(true, (300.0, 10.0)), (100.0, 50.0));
    }

    #[test]
    fn test_next_gesture_latches_fresh_origin() {
        let mut pan = PanSession::new();
        pan.update(true, (100.0, 50.0));
        pan.update(true, (140.0, 90.0));
        assert_eq!(pan.update(false, (140.0, 90.0)), (100.0, 50.0));
        assert!(!pan.is_panning());
        assert_eq!(pan.update(false, (140.0, 90.0)), (140.0, 90.0));
        assert_eq!(pan.update(true, (140.0, 90.0)), (140.0, 90.0));
        assert_eq!(pan.update(true, (200.0, 90.0)), (140.0, 90.0));
    }

    #[test]
    fn test_ending_sample_uses_latched_origin() {
        let mut pan = PanSession::new();
        pan.update(true, (0.0, 0.0));
        assert_eq!(pan.update(false, (400.0, 300.0)), (0.0, 0.0));
        assert!(!pan.is_panning());
    }
}
