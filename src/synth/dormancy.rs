//! Which oscillators anyone is listening to.
//!
//! An oscillator with no pin on any of its output rows cannot be heard, so
//! there is no point running its waveform levels. The tracker counts live
//! output routes per oscillator across both matrices; the engine puts
//! realized voices with a count of zero to sleep.

use crate::{blueprint::Source, matrix::connection::RoutingEvent};

#[derive(Debug, Clone, Default)]
pub struct DormancyTracker {
    routes: Vec<usize>,
}

impl DormancyTracker {
    pub fn new(oscillators: usize) -> Self {
        Self {
            routes: vec![0; oscillators],
        }
    }

    /// Fold one routing change in. Returns the oscillator whose route count
    /// moved, if any.
    pub fn apply(&mut self, event: &RoutingEvent) -> Option<usize> {
        let Source::OscillatorChannel { osc, .. } = event.source() else {
            return None;
        };
        let count = self.routes.get_mut(osc)?;
        if event.is_connect() {
            *count += 1;
        } else {
            *count = count.saturating_sub(1);
        }
        Some(osc)
    }

    pub fn routes(&self, osc: usize) -> usize {
        self.routes.get(osc).copied().unwrap_or(0)
    }

    /// Whether an oscillator should be asleep.
    pub fn is_idle(&self, osc: usize) -> bool {
        self.routes(osc) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{DestinationKind, OscChannel};

    fn event(connect: bool, source: Source) -> RoutingEvent {
        let destination = DestinationKind::OutputBus { bus: 0 };
        if connect {
            RoutingEvent::Connected {
                row: 0,
                col: 0,
                source,
                destination,
            }
        } else {
            RoutingEvent::Disconnected {
                row: 0,
                col: 0,
                source,
                destination,
            }
        }
    }

    fn osc(osc: usize, channel: OscChannel) -> Source {
        Source::OscillatorChannel { osc, channel }
    }

    #[test]
    fn test_counts_both_channels() {
        let mut tracker = DormancyTracker::new(12);
        assert!(tracker.is_idle(4));
        tracker.apply(&event(true, osc(4, OscChannel::SineSaw)));
        tracker.apply(&event(true, osc(4, OscChannel::TriPulse)));
        assert_eq!(tracker.routes(4), 2);

        tracker.apply(&event(false, osc(4, OscChannel::SineSaw)));
        assert!(!tracker.is_idle(4));
        tracker.apply(&event(false, osc(4, OscChannel::TriPulse)));
        assert!(tracker.is_idle(4));
    }

    #[test]
    fn test_other_sources_are_ignored() {
        let mut tracker = DormancyTracker::new(12);
        assert_eq!(tracker.apply(&event(true, Source::NoiseGenerator { index: 0 })), None);
        assert_eq!(tracker.apply(&event(true, osc(20, OscChannel::SineSaw))), None);
    }

    #[test]
    fn test_count_never_underflows() {
        let mut tracker = DormancyTracker::new(2);
        tracker.apply(&event(false, osc(1, OscChannel::SineSaw)));
        assert_eq!(tracker.routes(1), 0);
    }
}
