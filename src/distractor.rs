use crate::color::{Color, COLOR_SPACE_SIZE};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

/// Consecutive duplicate draws tolerated before falling back to a linear scan.
/// Only reachable with a degenerate random source.
pub const MAX_REJECTED_DRAWS: usize = 1024;

/// The candidate colors shown for one round: unique, shuffled, target included once
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistractorSet {
    colors: Vec<Color>,
}

impl DistractorSet {
    /// Build `size` unique candidates around `target` and shuffle them.
    ///
    /// `size` is clamped to `1..=2^24`; a size of one is just `[target]`.
    pub fn build<R: Rng + ?Sized>(target: Color, size: usize, rng: &mut R) -> Self {
        let size = size.clamp(1, COLOR_SPACE_SIZE as usize);
        let mut colors = Vec::with_capacity(size);
        colors.push(target);

        let mut rejected = 0;
        while colors.len() < size {
            let mut candidate = Color::generate(rng);
            if colors.contains(&candidate) {
                rejected += 1;
                if rejected < MAX_REJECTED_DRAWS {
                    continue;
                }
                while colors.contains(&candidate) {
                    candidate = candidate.successor();
                }
            }
            rejected = 0;
            colors.push(candidate);
        }

        colors.shuffle(rng);
        debug_assert!(colors.iter().all_unique());

        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<Color> {
        self.colors.get(idx).copied()
    }

    pub fn contains(&self, color: Color) -> bool {
        self.colors.contains(&color)
    }

    pub fn position(&self, color: Color) -> Option<usize> {
        self.colors.iter().position(|c| *c == color)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Color> {
        self.colors.iter()
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.colors
    }
}

impl<'a> IntoIterator for &'a DistractorSet {
    type Item = &'a Color;
    type IntoIter = std::slice::Iter<'a, Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter()
    }
}
