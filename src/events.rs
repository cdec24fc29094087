//! Engine events and listener registry

use crate::config::DifficultyKey;
use crate::difficulty::Celebration;
use crate::scores::BestScores;
use crate::sim::GameState;

/// Observable engine changes, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StateChange(GameState),
    ScoreChange(u32),
    /// All best scores, after a new best for the active difficulty
    BestScoreChange(BestScores),
    /// Smoothed frames per second, about once a second
    FpsUpdate(u32),
    DifficultyChange(DifficultyKey),
    PhaseChange {
        index: usize,
        name: &'static str,
    },
    Milestone {
        score: u32,
        label: &'static str,
        celebration: Celebration,
    },
    /// Near misses so far this run
    NearMiss(u32),
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::StateChange(_) => "stateChange",
            EngineEvent::ScoreChange(_) => "scoreChange",
            EngineEvent::BestScoreChange(_) => "bestScoreChange",
            EngineEvent::FpsUpdate(_) => "fpsUpdate",
            EngineEvent::DifficultyChange(_) => "difficultyChange",
            EngineEvent::PhaseChange { .. } => "phaseChange",
            EngineEvent::Milestone { .. } => "milestone",
            EngineEvent::NearMiss(_) => "nearMiss",
        }
    }
}

/// Handle returned by `Engine::on`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&EngineEvent)>;

#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Returns false if `id` was not registered
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(i, _)| *i != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dispatch(&mut self, event: &EngineEvent) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_and_remove() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        let sink = seen.clone();
        let a = listeners.add(Box::new(move |e: &EngineEvent| sink.borrow_mut().push(e.name())));
        let sink = seen.clone();
        let b = listeners.add(Box::new(move |e: &EngineEvent| sink.borrow_mut().push(e.name())));
        assert_ne!(a, b);

        listeners.dispatch(&EngineEvent::ScoreChange(1));
        assert_eq!(seen.borrow().len(), 2);

        assert!(listeners.remove(a));
        assert!(!listeners.remove(a));
        listeners.dispatch(&EngineEvent::FpsUpdate(60));
        assert_eq!(*seen.borrow(), vec!["scoreChange", "scoreChange", "fpsUpdate"]);

        listeners.clear();
        assert!(listeners.is_empty());
    }
}
