//! Seeded random stream shared by maze generation and pursuit AI.
//!
//! [`MazeRng`] is a 32-bit mulberry mix generator. Its output sequence is
//! pinned bit-for-bit so that a seed reproduces the same maze on every run and
//! in every implementation that follows the same mixing function. Consumers
//! never depend on the concrete type: they accept any [`RngCore`] and use the
//! helpers on [`RandomExt`], which lets tests substitute fixed-sequence
//! sources such as `rand::rngs::mock::StepRng`.

use rand::RngCore;

const MIX_INCREMENT: u32 = 0x6d2b_79f5;
const UNIT_SCALE: f64 = 4_294_967_296.0;

/// Deterministic pseudo-random stream derived from a 32-bit seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeRng {
    state: u32,
}

impl MazeRng {
    /// Creates a generator positioned at the start of the stream for `seed`.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advances the stream and returns the next mixed 32-bit word.
    fn mix(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MIX_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl RngCore for MazeRng {
    fn next_u32(&mut self) -> u32 {
        self.mix()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.mix());
        let high = u64::from(self.mix());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.mix().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Sampling helpers layered over any random word source.
///
/// The formulas are fixed so that a given word sequence always yields the
/// same integers, picks and permutations.
pub trait RandomExt: RngCore {
    /// Float in `[0, 1)` computed as `next_u32() / 2^32`.
    fn unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / UNIT_SCALE
    }

    /// Integer in the inclusive range `[min, max]`.
    ///
    /// Computed as `floor(unit() * (max - min + 1)) + min`.
    fn int(&mut self, min: i64, max: i64) -> i64 {
        let span = (max - min + 1) as f64;
        (self.unit() * span).floor() as i64 + min
    }

    /// Returns `true` with probability `probability`.
    fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    /// Uniformly selected element, or `None` for an empty slice.
    fn pick<'a, T>(&mut self, list: &'a [T]) -> Option<&'a T> {
        if list.is_empty() {
            return None;
        }
        let last = list.len() as i64 - 1;
        let index = usize::try_from(self.int(0, last)).ok()?;
        list.get(index)
    }

    /// New vector holding `list` in Fisher-Yates order.
    fn shuffle<T: Clone>(&mut self, list: &[T]) -> Vec<T> {
        let mut shuffled = list.to_vec();
        for i in (1..shuffled.len()).rev() {
            let j = usize::try_from(self.int(0, i as i64)).unwrap_or(0);
            shuffled.swap(i, j);
        }
        shuffled
    }
}

impl<R: RngCore + ?Sized> RandomExt for R {}
