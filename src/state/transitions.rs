//! Fixpoint driver for chains of automatic transitions.

use std::{collections::VecDeque, time::Duration};

use tokio::time::sleep;

use crate::state::snapshot::Snapshot;

/// One element of a snapshot's `on_update` sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The next, more resolved snapshot.
    Advance(Snapshot),
    /// Suspend for real time before continuing with the following steps.
    Wait(Duration),
}

/// Lazily walks the `on_update` chain starting at a snapshot.
///
/// Each batch returned by [`Snapshot::on_update`] is drained completely.
/// Afterwards the last yielded snapshot is asked for its own batch. A leading
/// copy of that snapshot is skipped; if nothing else remains, no further
/// progress is possible without new input and the sequence ends.
pub struct StateSequence {
    pending: VecDeque<Step>,
    last: Snapshot,
}

impl StateSequence {
    /// Begin a chain from `start`. The first batch is always drained.
    pub fn new(start: Snapshot) -> Self {
        Self {
            pending: start.on_update().into(),
            last: start,
        }
    }

    /// Produce the next snapshot, sleeping through any `Wait` steps.
    pub async fn next(&mut self) -> Option<Snapshot> {
        loop {
            match self.pending.pop_front() {
                Some(Step::Advance(snapshot)) => {
                    self.last = snapshot.clone();
                    return Some(snapshot);
                }
                Some(Step::Wait(duration)) => sleep(duration).await,
                None => {
                    let mut batch: VecDeque<Step> = self.last.on_update().into();
                    if matches!(batch.front(), Some(Step::Advance(first)) if *first == self.last) {
                        batch.pop_front();
                    }
                    if batch.is_empty() {
                        return None;
                    }
                    self.pending = batch;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        react::{HOST_EMOJI, React, ReactSet},
        snapshot::{Phase, fixtures::*},
    };

    async fn drain(start: Snapshot) -> Vec<Snapshot> {
        let mut sequence = StateSequence::new(start);
        let mut out = Vec::new();
        while let Some(snapshot) = sequence.next().await {
            out.push(snapshot);
        }
        out
    }

    #[tokio::test]
    async fn stopped_yields_itself_once() {
        let start = stopped();
        assert_eq!(drain(start.clone()).await, vec![start]);
    }

    #[tokio::test]
    async fn idle_without_signups_adds_bot_reacts_then_stops() {
        let states = drain(idle()).await;
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].phase, Phase::Idle);
        assert!(states[0].reacts.contains(&React::new(BOT_ID, HOST_EMOJI)));
    }

    #[tokio::test]
    async fn chain_cascades_without_external_input() {
        let mut reacts = ReactSet::new();
        reacts.insert(React::new(ADMIN_ID, crate::state::react::SKIP_EMOJI));
        reacts.insert(React::new(1, HOST_EMOJI));
        reacts.insert(React::new(2, crate::state::react::CAPT_EMOJI));
        reacts.insert(React::new(3, crate::state::react::CAPT_EMOJI));
        reacts.insert(React::new(4, "x"));
        reacts.insert(React::new(5, "y"));
        let states = drain(idle().with_reacts(reacts)).await;
        let phases: Vec<_> = states.iter().map(|s| s.phase.name()).collect();
        assert_eq!(phases.first(), Some(&"idle"));
        assert_eq!(phases.last(), Some(&"picking"));
    }

    #[tokio::test]
    async fn settled_snapshot_is_yielded_before_advancing() {
        use crate::state::react::{CAPT_EMOJI, SKIP_EMOJI};

        let settled = idle().with_bot_reacts([HOST_EMOJI, CAPT_EMOJI]);
        let mut reacts = settled.reacts.clone();
        reacts.insert(React::new(ADMIN_ID, SKIP_EMOJI));
        let start = settled.with_reacts(reacts);

        let states = drain(start.clone()).await;
        assert_eq!(states[0], start);
        assert_eq!(states[1].phase.name(), "voting");
    }
}
