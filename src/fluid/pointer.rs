use std::collections::VecDeque;

use kurbo::{Point, Vec2};

/// Pointer sink of an interactivity pass. Coordinates are normalized to `0..=1`, origin top-left.
pub trait Interactivity {
    /// Latest pointer state; `du`/`dv` are the normalized deltas since the previous event.
    fn set_pointer(&mut self, u: f32, v: f32, du: f32, dv: f32, active: bool);

    /// Queue a radial burst at a point.
    fn add_click(&mut self, u: f32, v: f32);
}

/// Kind of impulse a splat injects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplatKind {
    /// Velocity along the pointer delta plus a dye impulse.
    Move,
    /// Radial velocity burst away from the point plus a dye impulse.
    Click,
}

/// One queued impulse in normalized viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Splat {
    /// Impulse kind.
    pub kind: SplatKind,
    /// Horizontal position.
    pub u: f32,
    /// Vertical position, top down.
    pub v: f32,
    /// Horizontal pointer delta; zero for clicks.
    pub du: f32,
    /// Vertical pointer delta; zero for clicks.
    pub dv: f32,
}

/// Bounded FIFO of pending splats. Beyond the cap the oldest entry is dropped.
#[derive(Debug)]
pub struct SplatQueue {
    items: VecDeque<Splat>,
    cap: usize,
    dropped: u64,
}

impl SplatQueue {
    /// An empty queue holding at most `cap` splats (at least one).
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            items: VecDeque::with_capacity(cap),
            cap,
            dropped: 0,
        }
    }

    /// Append a splat, evicting the oldest when full.
    pub fn push(&mut self, splat: Splat) {
        if self.items.len() == self.cap {
            self.items.pop_front();
            self.dropped += 1;
            tracing::trace!(dropped = self.dropped, "splat queue full; dropped oldest");
        }
        self.items.push_back(splat);
    }

    /// Take every queued splat in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = Splat> + '_ {
        self.items.drain(..)
    }

    /// Queued splat count.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Capacity.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Splats discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Drop every queued splat.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Coalesces the host's pointer stream into the splat queue, applied once per frame.
#[derive(Debug)]
pub struct PointerInput {
    queue: SplatQueue,
    noise_px: f32,
    viewport: (u32, u32),
    position: Point,
    /// Pointer speed of the last accepted move, in viewport pixels per event.
    speed_px: f32,
    active: bool,
}

impl PointerInput {
    /// Input with a `cap`-entry queue and a `noise_px` move threshold.
    pub fn new(cap: usize, noise_px: f32) -> Self {
        Self {
            queue: SplatQueue::new(cap),
            noise_px: noise_px.max(0.0),
            viewport: (1, 1),
            position: Point::new(0.5, 0.5),
            speed_px: 0.0,
            active: false,
        }
    }

    /// Viewport used to convert normalized deltas into pixels.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    /// Last pointer position.
    pub fn position(&self) -> [f32; 2] {
        [self.position.x as f32, self.position.y as f32]
    }

    /// Whether the pointer is pressed or hovering as active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Speed of the last accepted move.
    pub fn speed_px(&self) -> f32 {
        self.speed_px
    }

    /// Pending splats.
    pub fn queue(&self) -> &SplatQueue {
        &self.queue
    }

    /// Whether any splat waits for the next frame.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Record a pointer event; active moves above the noise threshold queue a splat.
    pub fn pointer(&mut self, u: f32, v: f32, du: f32, dv: f32, active: bool) {
        if !(u.is_finite() && v.is_finite() && du.is_finite() && dv.is_finite()) {
            tracing::debug!("ignoring non-finite pointer event");
            return;
        }
        let (u, v) = (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0));
        self.position = Point::new(f64::from(u), f64::from(v));
        self.active = active;
        if !active {
            self.speed_px = 0.0;
            return;
        }
        let px = Vec2::new(
            f64::from(du) * f64::from(self.viewport.0),
            f64::from(dv) * f64::from(self.viewport.1),
        )
        .hypot() as f32;
        if px < self.noise_px {
            self.speed_px = 0.0;
            return;
        }
        self.speed_px = px;
        self.queue.push(Splat {
            kind: SplatKind::Move,
            u,
            v,
            du,
            dv,
        });
    }

    /// Queue a click burst at a point.
    pub fn click(&mut self, u: f32, v: f32) {
        if !(u.is_finite() && v.is_finite()) {
            tracing::debug!("ignoring non-finite click");
            return;
        }
        self.queue.push(Splat {
            kind: SplatKind::Click,
            u: u.clamp(0.0, 1.0),
            v: v.clamp(0.0, 1.0),
            du: 0.0,
            dv: 0.0,
        });
    }

    /// Take the pending splats for this frame.
    pub fn drain(&mut self) -> Vec<Splat> {
        self.queue.drain().collect()
    }

    /// Drop pending splats and forget the pointer.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.active = false;
        self.speed_px = 0.0;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fluid/pointer.rs"]
mod tests;
