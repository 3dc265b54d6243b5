//! Collision listeners that record what they are told.

use cuberain_physics::listener::{CollisionListener, ContactKind};
use cuberain_physics::pair::{BodyHandle, BodyPair};

/// One callback as received, handles in delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedEvent {
    pub kind: ContactKind,
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl RecordedEvent {
    pub fn pair(&self) -> BodyPair {
        BodyPair::new(self.a, self.b)
    }
}

// ---------------------------------------------------------------------------
// RecordingListener
// ---------------------------------------------------------------------------

/// Listener that keeps every callback it receives.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<RecordedEvent>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn began(&self) -> Vec<BodyPair> {
        self.of_kind(ContactKind::Began)
    }

    pub fn ended(&self) -> Vec<BodyPair> {
        self.of_kind(ContactKind::Ended)
    }

    pub fn mentions(&self, handle: BodyHandle) -> bool {
        self.events.iter().any(|e| e.a == handle || e.b == handle)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn of_kind(&self, kind: ContactKind) -> Vec<BodyPair> {
        self.events
            .iter()
            .filter(|e| e.kind == kind)
            .map(RecordedEvent::pair)
            .collect()
    }
}

impl CollisionListener for RecordingListener {
    fn on_collision(&mut self, a: BodyHandle, b: BodyHandle) {
        self.events.push(RecordedEvent {
            kind: ContactKind::Began,
            a,
            b,
        });
    }

    fn on_separation(&mut self, a: BodyHandle, b: BodyHandle) {
        self.events.push(RecordedEvent {
            kind: ContactKind::Ended,
            a,
            b,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let a = BodyHandle::from_parts(0, 0);
        let b = BodyHandle::from_parts(1, 0);
        let mut listener = RecordingListener::new();
        listener.on_collision(b, a);
        listener.on_separation(a, b);

        assert_eq!(listener.len(), 2);
        assert_eq!(listener.events[0].a, b);
        assert_eq!(listener.began(), vec![BodyPair::new(a, b)]);
        assert_eq!(listener.ended(), vec![BodyPair::new(a, b)]);
        assert!(listener.mentions(a));
        assert!(!listener.mentions(BodyHandle::from_parts(2, 0)));
    }
}
