//! Impact highlighting: which cubes are touching something, or were until
//! a moment ago.

use std::collections::BTreeMap;

use cuberain_physics::listener::CollisionListener;
use cuberain_physics::pair::{BodyHandle, BodyPair};

use crate::cube::CubeId;

// ---------------------------------------------------------------------------
// ContactCollector
// ---------------------------------------------------------------------------

/// Contact transitions buffered during one step, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedContacts {
    pub began: Vec<BodyPair>,
    pub ended: Vec<BodyPair>,
}

/// Listener that buffers contact transitions until the scene drains them
/// after the step.
#[derive(Debug, Default)]
pub struct ContactCollector {
    contacts: CollectedContacts,
}

impl ContactCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered since the last drain.
    pub fn drain(&mut self) -> CollectedContacts {
        std::mem::take(&mut self.contacts)
    }
}

impl CollisionListener for ContactCollector {
    fn on_collision(&mut self, a: BodyHandle, b: BodyHandle) {
        self.contacts.began.push(BodyPair::new(a, b));
    }

    fn on_separation(&mut self, a: BodyHandle, b: BodyHandle) {
        self.contacts.ended.push(BodyPair::new(a, b));
    }
}

// ---------------------------------------------------------------------------
// Highlights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct Glow {
    /// Open contacts the cube takes part in.
    contacts: u32,
    /// Scene time of the latest Began, or of the Ended that closed the
    /// last contact.
    since: f64,
}

/// Highlight state per cube, on the scene clock.
///
/// A cube stays lit while it has at least one open contact. Once its last
/// contact ends it fades out `ttl` seconds later, unless it is hit again.
#[derive(Debug, Clone, Default)]
pub struct Highlights {
    glows: BTreeMap<CubeId, Glow>,
}

impl Highlights {
    pub fn new() -> Self {
        Self::default()
    }

    /// A contact involving `cube` began at `now`.
    pub fn touch(&mut self, cube: CubeId, now: f64) {
        let glow = self.glows.entry(cube).or_insert(Glow {
            contacts: 0,
            since: now,
        });
        glow.contacts += 1;
        glow.since = now;
    }

    /// A contact involving `cube` ended at `now`. The fade starts when the
    /// last open contact goes.
    pub fn release(&mut self, cube: CubeId, now: f64) {
        if let Some(glow) = self.glows.get_mut(&cube) {
            glow.contacts = glow.contacts.saturating_sub(1);
            if glow.contacts == 0 {
                glow.since = now;
            }
        }
    }

    /// Drop released highlights older than `ttl`; returns the cubes that
    /// went dark.
    pub fn expire(&mut self, now: f64, ttl: f64) -> Vec<CubeId> {
        let expired: Vec<CubeId> = self
            .glows
            .iter()
            .filter(|&(_, glow)| glow.contacts == 0 && now - glow.since > ttl)
            .map(|(&id, _)| id)
            .collect();
        for id in &expired {
            self.glows.remove(id);
        }
        expired
    }

    pub fn forget(&mut self, cube: CubeId) -> bool {
        self.glows.remove(&cube).is_some()
    }

    pub fn is_highlighted(&self, cube: CubeId) -> bool {
        self.glows.contains_key(&cube)
    }

    /// Highlighted cubes that still have an open contact.
    pub fn touching(&self) -> usize {
        self.glows.values().filter(|glow| glow.contacts > 0).count()
    }

    pub fn len(&self) -> usize {
        self.glows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CubeId> + '_ {
        self.glows.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(i: u32) -> BodyHandle {
        BodyHandle::from_parts(i, 0)
    }

    #[test]
    fn collector_keeps_both_kinds_in_order() {
        let mut collector = ContactCollector::new();
        collector.on_collision(handle(2), handle(1));
        collector.on_collision(handle(2), handle(3));
        collector.on_separation(handle(4), handle(5));

        let contacts = collector.drain();
        assert_eq!(
            contacts.began,
            vec![BodyPair::new(handle(1), handle(2)), BodyPair::new(handle(2), handle(3))]
        );
        assert_eq!(contacts.ended, vec![BodyPair::new(handle(4), handle(5))]);
        assert_eq!(collector.drain(), CollectedContacts::default());
    }

    #[test]
    fn released_highlight_expires_after_ttl() {
        let mut highlights = Highlights::new();
        highlights.touch(CubeId(0), 0.0);
        highlights.touch(CubeId(1), 0.0);
        highlights.release(CubeId(0), 0.1);
        highlights.release(CubeId(1), 0.3);

        assert!(highlights.expire(0.35, 0.25).is_empty());
        assert_eq!(highlights.expire(0.4, 0.25), vec![CubeId(0)]);
        assert!(!highlights.is_highlighted(CubeId(0)));
        assert!(highlights.is_highlighted(CubeId(1)));
    }

    #[test]
    fn open_contact_keeps_cube_lit() {
        let mut highlights = Highlights::new();
        highlights.touch(CubeId(3), 0.0);
        assert!(highlights.expire(10.0, 0.25).is_empty());
        assert!(highlights.is_highlighted(CubeId(3)));
        assert_eq!(highlights.touching(), 1);
    }

    #[test]
    fn fade_waits_for_last_contact() {
        let mut highlights = Highlights::new();
        highlights.touch(CubeId(5), 0.0);
        highlights.touch(CubeId(5), 0.1);
        highlights.release(CubeId(5), 0.2);
        assert_eq!(highlights.glows[&CubeId(5)].contacts, 1);
        assert!(highlights.expire(1.0, 0.25).is_empty());

        highlights.release(CubeId(5), 1.0);
        assert_eq!(highlights.touching(), 0);
        assert!(highlights.expire(1.2, 0.25).is_empty());
        assert_eq!(highlights.expire(1.3, 0.25), vec![CubeId(5)]);
    }

    #[test]
    fn release_of_unknown_cube_is_ignored() {
        let mut highlights = Highlights::new();
        highlights.release(CubeId(9), 0.0);
        assert!(highlights.is_empty());
    }

    #[test]
    fn forget_removes_entry() {
        let mut highlights = Highlights::new();
        highlights.touch(CubeId(2), 0.0);
        assert!(highlights.forget(CubeId(2)));
        assert!(!highlights.forget(CubeId(2)));
        assert!(highlights.is_empty());
    }
}
