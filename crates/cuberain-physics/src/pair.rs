//! Body identity and canonical contact pairs.

use std::cmp::Ordering;
use std::fmt;

use rapier3d::prelude::RigidBodyHandle;

// ---------------------------------------------------------------------------
// BodyHandle
// ---------------------------------------------------------------------------

/// Identity of a body registered with a [`PhysicsWorld`](crate::world::PhysicsWorld).
///
/// Wraps the engine arena handle (index + generation). A handle is never
/// reused for a different body: the generation changes when a slot is
/// recycled. Ordering is `(index, generation)` and does not change while the
/// body stays registered.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) RigidBodyHandle);

impl BodyHandle {
    /// The underlying engine handle.
    pub const fn raw(self) -> RigidBodyHandle {
        self.0
    }

    /// Arena `(index, generation)`.
    pub fn parts(self) -> (u32, u32) {
        self.0.into_raw_parts()
    }

    /// Rebuild from arena parts. Used by fixtures and serializers.
    pub fn from_parts(index: u32, generation: u32) -> Self {
        Self(RigidBodyHandle::from_raw_parts(index, generation))
    }
}

impl From<RigidBodyHandle> for BodyHandle {
    fn from(handle: RigidBodyHandle) -> Self {
        Self(handle)
    }
}

impl Ord for BodyHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts().cmp(&other.parts())
    }
}

impl PartialOrd for BodyHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (index, generation) = self.parts();
        write!(f, "BodyHandle({index}v{generation})")
    }
}

// ---------------------------------------------------------------------------
// BodyPair
// ---------------------------------------------------------------------------

/// Unordered pair of bodies in contact, stored lower handle first.
///
/// `BodyPair::new(a, b) == BodyPair::new(b, a)` for every `a`, `b`, so a set
/// of pairs never holds both orientations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyPair {
    first: BodyHandle,
    second: BodyHandle,
}

impl BodyPair {
    /// Canonicalize `(a, b)`.
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if b < a {
            Self {
                first: b,
                second: a,
            }
        } else {
            Self {
                first: a,
                second: b,
            }
        }
    }

    /// Lower handle.
    pub const fn first(&self) -> BodyHandle {
        self.first
    }

    /// Higher handle.
    pub const fn second(&self) -> BodyHandle {
        self.second
    }

    /// Both handles, lower first.
    pub const fn handles(&self) -> (BodyHandle, BodyHandle) {
        (self.first, self.second)
    }

    /// Whether `handle` takes part in this pair.
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.first == handle || self.second == handle
    }

    /// The partner of `handle`, if `handle` is in the pair.
    pub fn other(&self, handle: BodyHandle) -> Option<BodyHandle> {
        if self.first == handle {
            Some(self.second)
        } else if self.second == handle {
            Some(self.first)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
