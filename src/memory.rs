use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::Node,
    error::{LangError, span},
};

pub type Frame = HashMap<String, Rc<Node>>;

/// Variable bindings as a stack of frames.
///
/// Entering a scope pushes a *copy* of the current frame, so bindings made
/// later in the outer frame are never seen through the pushed copy.
#[derive(Debug, Default)]
pub struct Memory {
    frames: Vec<Frame>,
    current: Frame,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_scope(&mut self) {
        self.frames.push(self.current.clone());
        self.current = Frame::new();
    }

    /// Restores the most recently pushed frame. The global frame is never
    /// discarded.
    pub fn end_scope(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.current = frame;
        }
    }

    pub fn assign(&mut self, name: impl Into<String>, node: Rc<Node>) {
        self.current.insert(name.into(), node);
    }

    pub fn fetch(&self, name: &str, position: usize) -> Result<Rc<Node>, LangError> {
        std::iter::once(&self.current)
            .chain(self.frames.iter().rev())
            .find_map(|frame| frame.get(name))
            .cloned()
            .ok_or_else(|| LangError::UnboundVariable {
                name: name.to_string(),
                span: span(position, name.len()),
            })
    }

    /// Number of pushed frames; zero at global level.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
