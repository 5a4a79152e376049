//! Single-owner event queue.
//!
//! GPS fixes and taps arrive from different sources; pushing both into one
//! `Dispatcher` and draining it from one place keeps handling run-to-completion.
//! Wrap it in a `Mutex` or move it into a single task when sources live on
//! other threads.

use crate::event::{Effect, Event};
use crate::CalibrationWorkflow;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct Dispatcher {
    workflow: CalibrationWorkflow,
    queue: VecDeque<Event>,
}

impl Dispatcher {
    pub fn new(workflow: CalibrationWorkflow) -> Self {
        Self {
            workflow,
            queue: VecDeque::new(),
        }
    }

    /// Enqueue in arrival order.
    pub fn push(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Handle every queued event in order, returning all effects.
    pub fn drain(&mut self) -> Vec<Effect> {
        let mut all = Vec::new();
        self.drain_with(|_, _, effects| all.extend_from_slice(effects));
        all
    }

    /// Handle every queued event in order, calling `observe` after each with
    /// the workflow as it stands after that event.
    pub fn drain_with<F>(&mut self, mut observe: F)
    where
        F: FnMut(&CalibrationWorkflow, &Event, &[Effect]),
    {
        while let Some(event) = self.queue.pop_front() {
            let effects = self.workflow.handle(event.clone());
            observe(&self.workflow, &event, &effects);
        }
    }

    #[inline]
    pub fn workflow(&self) -> &CalibrationWorkflow {
        &self.workflow
    }

    pub fn into_workflow(self) -> CalibrationWorkflow {
        self.workflow
    }
}
