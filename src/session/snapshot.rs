//! Session state and its immutable rollback copy.

use crate::classify::ConstArrays;
use crate::image::{Frame, PixelStack};
use crate::meta::{MetaMap, MetadataRegistry};

/// Everything a session mutates in memory between open and save.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub registry: MetadataRegistry,
    pub meta: MetaMap,
    pub const_arrays: ConstArrays,
    pub images: Option<PixelStack>,
    pub reference: Option<Frame>,
}

/// Deep copy taken once after load. Never updated; `reset()` clones it back.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    state: SessionState,
}

impl SessionSnapshot {
    pub fn capture(state: &SessionState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn restore(&self) -> SessionState {
        self.state.clone()
    }
}
