//! Per-frame tick contract
//!
//! Hosts call [`Tick::tick`] once per display refresh with the elapsed time in
//! whole milliseconds. [`FrameClock`] produces such deltas for a fixed frame
//! rate, which is what headless runs and tests use in place of a real
//! display loop.

/// Something driven once per frame by the host loop
pub trait Tick {
    /// Advance by `dt_ms` milliseconds
    fn tick(&mut self, dt_ms: u32);
}

/// Fixed-rate source of whole-millisecond frame deltas
///
/// The fractional part of each frame is carried forward, so at 60fps the
/// deltas alternate between 16 and 17 ms and every 60 frames sum to exactly
/// 1000 ms.
#[derive(Clone, Debug)]
pub struct FrameClock {
    frame_ms: f64,
    carry: f64,
    elapsed_ms: u64,
    frames: u64,
}

impl FrameClock {
    /// Clock for `fps` frames per second
    ///
    /// Non-positive or non-finite rates fall back to 60fps.
    pub fn new(fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            tracing::warn!("FrameClock: invalid fps {}, using 60", fps);
            60.0
        };
        Self {
            frame_ms: 1000.0 / fps,
            carry: 0.0,
            elapsed_ms: 0,
            frames: 0,
        }
    }

    /// Delta for the next frame
    ///
    /// Frames longer than `u32::MAX` ms are clamped, dropping the excess.
    pub fn next_delta(&mut self) -> u32 {
        let exact = self.frame_ms + self.carry;
        // Small epsilon keeps 1000/60 * 3 from landing a hair under 50
        let whole = (exact + 1e-9).floor();
        let delta = if whole < f64::from(u32::MAX) {
            self.carry = exact - whole;
            whole as u32
        } else {
            self.carry = 0.0;
            u32::MAX
        };
        self.elapsed_ms += u64::from(delta);
        self.frames += 1;
        delta
    }

    /// Advance `target` by one frame, returning the delta used
    pub fn advance<T: Tick + ?Sized>(&mut self, target: &mut T) -> u32 {
        let dt = self.next_delta();
        target.tick(dt);
        dt
    }

    /// Total milliseconds handed out so far
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Frames handed out so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
