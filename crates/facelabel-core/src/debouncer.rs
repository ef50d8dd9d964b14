//! Debounced "real" / "not real" status per detected face.
//!
//! Two policies decide when a face's label may change:
//!
//! - **Cooldown**: after each redraw the label is frozen for a random number of
//!   evaluations in `[COOLDOWN_MIN, COOLDOWN_MIN + COOLDOWN_SPAN)`. By default a
//!   single cooldown is shared by every face, so all faces show the same label
//!   and each evaluation (whichever face triggers it) advances the same counter.
//!   [`Policy::PerFaceCooldown`] keys the cooldown per identity instead.
//! - **Flip**: each identity keeps its own label and, once known, redraws it
//!   with probability [`FLIP_PROBABILITY`] per evaluation. No minimum dwell.
//!
//! Identities are positions in the per-frame detection list. They are not
//! stable track IDs: if detection order changes between frames, labels follow
//! the list position, not the physical face.

use crate::random::{RandomSource, StdRandom};
use crate::types::Status;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// --- Named constants ---
/// Probability that a redraw yields [`Status::Real`].
pub const REAL_PROBABILITY: f64 = 0.8;
/// Lower bound (inclusive) of a fresh cooldown, in evaluations.
pub const COOLDOWN_MIN: u32 = 200;
/// Width of the cooldown range; upper bound is `COOLDOWN_MIN + COOLDOWN_SPAN` (exclusive).
pub const COOLDOWN_SPAN: u32 = 100;
/// Per-evaluation redraw probability for a known identity under [`Policy::Flip`].
pub const FLIP_PROBABILITY: f64 = 0.02;

/// Identity used by keyed policies when the caller passes no identity.
const IMPLICIT_IDENTITY: usize = 0;

/// Draw a status: REAL with probability [`REAL_PROBABILITY`].
pub fn draw_status<R: RandomSource + ?Sized>(rng: &mut R) -> Status {
    if rng.next_f64() < REAL_PROBABILITY {
        Status::Real
    } else {
        Status::NotReal
    }
}

/// Draw a cooldown length in `[COOLDOWN_MIN, COOLDOWN_MIN + COOLDOWN_SPAN)`.
pub fn draw_cooldown<R: RandomSource + ?Sized>(rng: &mut R) -> u32 {
    let offset = (rng.next_f64() * f64::from(COOLDOWN_SPAN)).floor() as u32;
    COOLDOWN_MIN + offset.min(COOLDOWN_SPAN - 1)
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown policy {0:?} (expected shared-cooldown, per-face-cooldown or flip)")]
pub struct UnknownPolicy(pub String);

/// Which rule decides when a face's status is redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// One cooldown shared by every face.
    #[default]
    SharedCooldown,
    /// One cooldown per identity.
    PerFaceCooldown,
    /// Per-identity label with a small per-evaluation flip chance.
    Flip,
}

impl Policy {
    pub fn name(self) -> &'static str {
        match self {
            Policy::SharedCooldown => "shared-cooldown",
            Policy::PerFaceCooldown => "per-face-cooldown",
            Policy::Flip => "flip",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared-cooldown" | "shared" | "cooldown" => Ok(Policy::SharedCooldown),
            "per-face-cooldown" | "per-face" => Ok(Policy::PerFaceCooldown),
            "flip" => Ok(Policy::Flip),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// Cooldown state machine: `Cooling(n)` counts down to zero, and an
/// evaluation at zero redraws the status and restarts the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cooldown {
    status: Status,
    remaining: u32,
}

impl Cooldown {
    /// Expired cooldown showing REAL; the first evaluation redraws.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remaining(status: Status, remaining: u32) -> Self {
        Self { status, remaining }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Advance one evaluation and return the status to display.
    ///
    /// An expired cooldown consumes two draws: status first, then length.
    pub fn evaluate<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Status {
        if self.is_expired() {
            self.status = draw_status(rng);
            self.remaining = draw_cooldown(rng);
            tracing::trace!(status = %self.status, cooldown = self.remaining, "status redrawn");
        } else {
            self.remaining -= 1;
        }
        self.status
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    last_seen: u64,
}

/// Per-identity values stamped with the frame they were last evaluated in.
#[derive(Debug, Clone)]
pub struct IdentityTable<T> {
    slots: HashMap<usize, Slot<T>>,
}

impl<T> Default for IdentityTable<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<T> IdentityTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, identity: usize) -> Option<&T> {
        self.slots.get(&identity).map(|s| &s.value)
    }

    pub fn insert(&mut self, identity: usize, value: T, frame: u64) {
        self.slots.insert(
            identity,
            Slot {
                value,
                last_seen: frame,
            },
        );
    }

    /// Mutable access that also marks the identity as seen in `frame`.
    fn touch(&mut self, identity: usize, frame: u64) -> Option<&mut T> {
        self.slots.get_mut(&identity).map(|slot| {
            slot.last_seen = frame;
            &mut slot.value
        })
    }

    /// Drop identities last seen more than `max_idle` frames before `frame`.
    /// Returns how many were dropped.
    pub fn evict_idle(&mut self, frame: u64, max_idle: u64) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| frame.saturating_sub(slot.last_seen) <= max_idle);
        before - self.slots.len()
    }
}

#[derive(Debug, Clone)]
enum PolicyState {
    Shared(Cooldown),
    PerFace(IdentityTable<Cooldown>),
    Flip(IdentityTable<Status>),
}

/// Owns the status state for one overlay and the random source that drives it.
///
/// Construct one per rendering loop and call [`evaluate`](Self::evaluate) once
/// per rendered face per frame, in detection order.
#[derive(Debug, Clone)]
pub struct StatusDebouncer<R = StdRandom> {
    rng: R,
    state: PolicyState,
    frame: u64,
    evict_after: Option<u64>,
}

impl<R: RandomSource> StatusDebouncer<R> {
    pub fn new(policy: Policy, rng: R) -> Self {
        let state = match policy {
            Policy::SharedCooldown => PolicyState::Shared(Cooldown::new()),
            Policy::PerFaceCooldown => PolicyState::PerFace(IdentityTable::new()),
            Policy::Flip => PolicyState::Flip(IdentityTable::new()),
        };
        Self {
            rng,
            state,
            frame: 0,
            evict_after: None,
        }
    }

    /// Shared-cooldown debouncer starting from an explicit cooldown state.
    pub fn from_cooldown(cooldown: Cooldown, rng: R) -> Self {
        Self {
            rng,
            state: PolicyState::Shared(cooldown),
            frame: 0,
            evict_after: None,
        }
    }

    /// Forget keyed identities not evaluated during the last `frames` frames.
    /// Has no effect on the shared cooldown.
    pub fn with_idle_eviction(mut self, frames: u64) -> Self {
        self.evict_after = Some(frames);
        self
    }

    pub fn policy(&self) -> Policy {
        match self.state {
            PolicyState::Shared(_) => Policy::SharedCooldown,
            PolicyState::PerFace(_) => Policy::PerFaceCooldown,
            PolicyState::Flip(_) => Policy::Flip,
        }
    }

    /// Current frame counter, advanced by [`begin_frame`](Self::begin_frame).
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Mark the start of a new detection frame and apply idle eviction.
    /// Returns the number of identities evicted.
    pub fn begin_frame(&mut self) -> usize {
        self.frame += 1;
        let Some(max_idle) = self.evict_after else {
            return 0;
        };
        let evicted = match &mut self.state {
            PolicyState::Shared(_) => 0,
            PolicyState::PerFace(table) => table.evict_idle(self.frame, max_idle),
            PolicyState::Flip(table) => table.evict_idle(self.frame, max_idle),
        };
        if evicted > 0 {
            tracing::debug!(evicted, frame = self.frame, "evicted idle identities");
        }
        evicted
    }

    /// Status to display for `identity` this evaluation.
    ///
    /// The shared cooldown ignores `identity`. Keyed policies treat `None`
    /// as the single implicit face.
    pub fn evaluate(&mut self, identity: Option<usize>) -> Status {
        let key = identity.unwrap_or(IMPLICIT_IDENTITY);
        let frame = self.frame;
        match &mut self.state {
            PolicyState::Shared(cooldown) => cooldown.evaluate(&mut self.rng),
            PolicyState::PerFace(table) => match table.touch(key, frame) {
                Some(cooldown) => cooldown.evaluate(&mut self.rng),
                None => {
                    let mut cooldown = Cooldown::new();
                    let status = cooldown.evaluate(&mut self.rng);
                    table.insert(key, cooldown, frame);
                    status
                }
            },
            PolicyState::Flip(table) => evaluate_flip(table, key, frame, &mut self.rng),
        }
    }

    /// Number of identities holding a status. The shared cooldown counts as one.
    pub fn tracked(&self) -> usize {
        match &self.state {
            PolicyState::Shared(_) => 1,
            PolicyState::PerFace(table) => table.len(),
            PolicyState::Flip(table) => table.len(),
        }
    }

    /// Stored status for `identity`, if known. The shared cooldown always answers.
    pub fn status_of(&self, identity: usize) -> Option<Status> {
        match &self.state {
            PolicyState::Shared(cooldown) => Some(cooldown.status()),
            PolicyState::PerFace(table) => table.get(identity).map(Cooldown::status),
            PolicyState::Flip(table) => table.get(identity).copied(),
        }
    }

    /// Remaining cooldown for `identity`; `None` under the flip policy or for
    /// an unknown identity.
    pub fn cooldown_of(&self, identity: Option<usize>) -> Option<u32> {
        match &self.state {
            PolicyState::Shared(cooldown) => Some(cooldown.remaining()),
            PolicyState::PerFace(table) => table
                .get(identity.unwrap_or(IMPLICIT_IDENTITY))
                .map(Cooldown::remaining),
            PolicyState::Flip(_) => None,
        }
    }

    /// Seed a keyed identity with a known status. Under a cooldown policy the
    /// status is stored with an expired cooldown. Ignored by the shared cooldown.
    pub fn insert_status(&mut self, identity: usize, status: Status) {
        let frame = self.frame;
        match &mut self.state {
            PolicyState::Shared(_) => {}
            PolicyState::PerFace(table) => {
                table.insert(identity, Cooldown::with_remaining(status, 0), frame)
            }
            PolicyState::Flip(table) => table.insert(identity, status, frame),
        }
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

impl StatusDebouncer<StdRandom> {
    /// Debouncer driven by `rand`, seeded when `seed` is given.
    pub fn with_seed(policy: Policy, seed: Option<u64>) -> Self {
        Self::new(policy, StdRandom::from_seed_option(seed))
    }
}

/// Unknown identities always get a fresh draw; known ones consume one flip
/// draw and only redraw below [`FLIP_PROBABILITY`].
fn evaluate_flip<R: RandomSource + ?Sized>(
    table: &mut IdentityTable<Status>,
    identity: usize,
    frame: u64,
    rng: &mut R,
) -> Status {
    if let Some(stored) = table.touch(identity, frame) {
        if rng.next_f64() >= FLIP_PROBABILITY {
            return *stored;
        }
        let status = draw_status(rng);
        *stored = status;
        tracing::trace!(identity, status = %status, "status flipped");
        return status;
    }
    let status = draw_status(rng);
    tracing::trace!(identity, status = %status, "new identity");
    table.insert(identity, status, frame);
    status
}
