use std::time::Duration;

use crate::cells::Position;

/// How an explorer ranks the traversable neighbours it finds. The first ranked neighbour is the
/// one it moves to; the rest get their own explorers.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CandidateOrder {
    /// South, East, North, West.
    Preference,
    /// Closest to the exit by Manhattan distance first, ties broken by the preference order.
    NearestExit,
}

impl CandidateOrder {
    pub fn rank(&self, candidates: &mut [Position], exit: Option<Position>) {
        if let (CandidateOrder::NearestExit, Some(exit)) = (*self, exit) {
            // stable
            candidates.sort_by_key(|candidate| candidate.manhattan_distance(exit));
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExploreOptions {
    frame_delay: Duration,
    candidate_order: CandidateOrder,
}

impl ExploreOptions {
    #[inline]
    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    #[inline]
    pub fn candidate_order(&self) -> CandidateOrder {
        self.candidate_order
    }
}

impl Default for ExploreOptions {
    fn default() -> Self {
        ExploreOptionsBuilder::new().build()
    }
}

pub struct ExploreOptionsBuilder {
    options: ExploreOptions,
}

impl ExploreOptionsBuilder {
    pub fn new() -> ExploreOptionsBuilder {
        ExploreOptionsBuilder {
            options: ExploreOptions {
                frame_delay: Duration::from_millis(0),
                candidate_order: CandidateOrder::Preference,
            },
        }
    }

    /// Pause taken by an explorer after each snapshot it hands to the presentation sink.
    pub fn frame_delay(mut self, delay: Duration) -> ExploreOptionsBuilder {
        self.options.frame_delay = delay;
        self
    }

    pub fn candidate_order(mut self, order: CandidateOrder) -> ExploreOptionsBuilder {
        self.options.candidate_order = order;
        self
    }

    pub fn build(self) -> ExploreOptions {
        self.options
    }
}

impl Default for ExploreOptionsBuilder {
    fn default() -> Self {
        ExploreOptionsBuilder::new()
    }
}
