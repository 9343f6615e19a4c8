//! Contact collection and resolution
//!
//! Per step: `Idle` -> `Collecting` while the engine runs -> `Resolving` once it
//! returns -> `Idle` after [`ContactBuffer::resolve`]. Pairs are never
//! deduplicated; the candidate-death set in the lifecycle manager is.

use super::entity::{EntityId, Reaction};
use super::lifecycle::Lifecycle;
use crate::physics::ContactPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactPhase {
    #[default]
    Idle,
    /// The world is stepping and may record pairs
    Collecting,
    /// The step finished; pairs wait for resolution
    Resolving,
}

/// Summary of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactReport {
    /// Buffered pairs processed, duplicates included
    pub pairs_resolved: usize,
    /// `collide` calls that produced a reaction
    pub reactions: usize,
    /// Entities touched by any pair, in first-seen order
    pub touched: Vec<EntityId>,
}

/// Contact pairs reported during the current step
#[derive(Debug, Default)]
pub struct ContactBuffer {
    pairs: Vec<ContactPair>,
    phase: ContactPhase,
}

impl ContactBuffer {
    pub fn phase(&self) -> ContactPhase {
        self.phase
    }

    pub fn pairs(&self) -> &[ContactPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn begin_collecting(&mut self) {
        debug_assert_eq!(
            self.phase,
            ContactPhase::Idle,
            "contacts from the previous step were never resolved"
        );
        self.pairs.clear();
        self.phase = ContactPhase::Collecting;
    }

    /// Append a pair in the order the engine reported it
    pub fn record(&mut self, pair: ContactPair) {
        debug_assert_eq!(self.phase, ContactPhase::Collecting);
        self.pairs.push(pair);
    }

    pub fn finish_collecting(&mut self) {
        debug_assert_eq!(self.phase, ContactPhase::Collecting);
        self.phase = ContactPhase::Resolving;
    }

    /// Drop all pairs and return to `Idle`
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.phase = ContactPhase::Idle;
    }

    /// Run gameplay reactions for every buffered pair, in insertion order.
    ///
    /// Both entities of each pair become death candidates and `collide` runs
    /// in both directions. The buffer is cleared afterwards even when no
    /// pair caused anything.
    pub fn resolve(&mut self, lifecycle: &mut Lifecycle) -> ContactReport {
        debug_assert_ne!(self.phase, ContactPhase::Collecting);
        let mut report = ContactReport {
            pairs_resolved: self.pairs.len(),
            ..Default::default()
        };

        for pair in &self.pairs {
            let (Some(id_a), Some(id_b)) = (
                lifecycle.owner_of(pair.body_a),
                lifecycle.owner_of(pair.body_b),
            ) else {
                log::debug!("Contact with unowned body skipped: {:?}", pair);
                continue;
            };

            for id in [id_a, id_b] {
                if lifecycle.mark_candidate(id) {
                    report.touched.push(id);
                }
            }

            let reactions = match (lifecycle.get(id_a), lifecycle.get(id_b)) {
                (Some(a), Some(b)) => [a.collide(b), b.collide(a)],
                _ => continue,
            };
            for reaction in reactions {
                if let Reaction::Kill(target) = reaction {
                    if let Some(entity) = lifecycle.get_mut(target) {
                        entity.kill();
                    }
                    report.reactions += 1;
                }
            }
        }

        self.clear();
        report
    }
}
