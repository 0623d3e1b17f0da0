// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence container: the set of trigger elements loaded for a show, the
//! callback registry, and the time-advance entry point.

use crate::action::Params;
use crate::show::{ConfigError, ShowDefinition};
use crate::trigger::{ElementId, TriggerElement};
use std::collections::HashMap;
use std::path::Path;

/// A registered action handler
pub type Handler = Box<dyn FnMut(&Params) + Send>;

/// The set of trigger elements defined by a show and the machinery to
/// advance them through time
///
/// `advance` is the single entry point for driving the show: a free-running
/// polling loop ([`ShowRunner`](crate::runner::ShowRunner)) or any external
/// time source (an audio playback clock) may call it with monotonically
/// increasing timestamps. `advance` is not reentrant; callers sharing a
/// sequence across threads must serialize access.
pub struct Sequence {
    elements: Vec<TriggerElement>,
    /// Indices into `elements` still capable of firing
    active: Vec<usize>,
    callbacks: HashMap<String, Handler>,
}

impl Sequence {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            active: Vec::new(),
            callbacks: HashMap::new(),
        }
    }

    /// Build a sequence from a parsed show definition
    pub fn from_definition(definition: &ShowDefinition) -> Result<Self, ConfigError> {
        let elements = definition.build_elements()?;
        let active = (0..elements.len()).collect();
        tracing::info!(elements = elements.len(), "show loaded");
        Ok(Self {
            elements,
            active,
            callbacks: HashMap::new(),
        })
    }

    /// Build a sequence from a show definition in a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::from_definition(&ShowDefinition::from_json_str(json)?)
    }

    /// Build a sequence from a show file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_definition(&ShowDefinition::from_file(path)?)
    }

    /// Schedule an element programmatically, alongside any loaded show
    pub fn push_element(&mut self, element: TriggerElement) -> ElementId {
        let id = element.id();
        self.active.push(self.elements.len());
        self.elements.push(element);
        id
    }

    /// Register the handler invoked for actions named `name`
    ///
    /// One handler per name; registering again overwrites.
    pub fn register_callback(
        &mut self,
        name: impl Into<String>,
        handler: impl FnMut(&Params) + Send + 'static,
    ) {
        self.callbacks.insert(name.into(), Box::new(handler));
    }

    /// Re-arm every element and repopulate the active set
    pub fn reset(&mut self) {
        for element in &mut self.elements {
            element.reset();
        }
        self.active = (0..self.elements.len()).collect();
    }

    /// Evaluate every active element against `time`, dispatch due actions,
    /// and retire spent elements; returns whether any element remains active
    ///
    /// Dispatch order is element load order, then action insertion order
    /// within an element. Actions with no registered handler are skipped.
    pub fn advance(&mut self, time: f64) -> bool {
        // Evaluate against a snapshot of the active set; removals are
        // applied afterwards.
        for slot in 0..self.active.len() {
            let index = self.active[slot];
            self.elements[index].evaluate(time);
            for action_index in self.elements[index].take_due() {
                let action = self.elements[index].action(action_index);
                match self.callbacks.get_mut(&action.name) {
                    Some(handler) => handler(&action.parameters),
                    None => {
                        tracing::debug!(action = %action.name, "no handler registered, skipping");
                    }
                }
            }
        }

        let elements = &self.elements;
        self.active.retain(|&index| {
            let spent = elements[index].is_spent();
            if spent {
                tracing::debug!(element = %elements[index].id().0, "trigger element complete");
            }
            !spent
        });

        !self.active.is_empty()
    }

    /// Whether any element can still fire
    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }

    /// Number of elements defined by the show
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of elements still capable of firing
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// All elements in load order
    pub fn elements(&self) -> impl Iterator<Item = &TriggerElement> {
        self.elements.iter()
    }

    /// Look up an element by ID
    pub fn element(&self, id: ElementId) -> Option<&TriggerElement> {
        self.elements.iter().find(|element| element.id() == id)
    }

    /// Distinct action names used by the show, in first-seen order
    pub fn action_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for element in &self.elements {
            for action in element.actions() {
                if !names.iter().any(|name| name == &action.name) {
                    names.push(action.name.clone());
                }
            }
        }
        names
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}
