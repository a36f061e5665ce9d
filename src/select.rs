//! Policies choosing which detected candidate gets read.

use crate::detect::PlateCandidate;

pub trait CandidateSelector {
    /// Index into `candidates` of the one to read, `None` when empty.
    fn select(&self, candidates: &[PlateCandidate<'_>]) -> Option<usize>;
}

/// Take the first candidate in discovery order, whatever its shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl CandidateSelector for FirstCandidate {
    fn select(&self, candidates: &[PlateCandidate<'_>]) -> Option<usize> {
        if candidates.is_empty() { None } else { Some(0) }
    }
}

/// Largest enclosed area wins; ties go to the earlier candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestArea;

impl CandidateSelector for LargestArea {
    fn select(&self, candidates: &[PlateCandidate<'_>]) -> Option<usize> {
        candidates.iter().enumerate().fold(None, |best: Option<(usize, f64)>, (i, c)| {
            match best {
                Some((_, area)) if area >= c.area => best,
                _ => Some((i, c.area)),
            }
        }).map(|(i, _)| i)
    }
}

/// Aspect ratio closest to `ideal` wins; ties go to the earlier candidate.
#[derive(Debug, Clone, Copy)]
pub struct ClosestAspect {
    pub ideal: f64,
}

impl Default for ClosestAspect {
    fn default() -> Self {
        // single row plate, 520mm x 114mm
        Self { ideal: 4.56 }
    }
}

impl CandidateSelector for ClosestAspect {
    fn select(&self, candidates: &[PlateCandidate<'_>]) -> Option<usize> {
        candidates.iter().enumerate().fold(None, |best: Option<(usize, f64)>, (i, c)| {
            let distance = (c.aspect_ratio() - self.ideal).abs();
            match best {
                Some((_, d)) if d <= distance => best,
                _ => Some((i, distance)),
            }
        }).map(|(i, _)| i)
    }
}
