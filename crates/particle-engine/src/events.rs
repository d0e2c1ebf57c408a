//! Lifecycle notifications and per-frame context handed to hosts.

use std::time::Duration;

use serde::Serialize;

use crate::field::ScreenField;
use crate::particles::ParticleSystem;

/// Engine lifecycle transitions, in the order a host observes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    BuildStarted { generation: u64, columns: usize },
    BuildComplete { generation: u64, elapsed: Duration },
    AnimationStarted { particles: usize },
    AnimationStopped,
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::BuildStarted { .. } => "build_started",
            EngineEvent::BuildComplete { .. } => "build_complete",
            EngineEvent::AnimationStarted { .. } => "animation_started",
            EngineEvent::AnimationStopped => "animation_stopped",
        }
    }
}

/// State visible to the per-frame callback after a frame is committed.
pub struct FrameContext<'a> {
    pub field: &'a ScreenField,
    pub particles: &'a ParticleSystem,
    /// Committed frames since the animation started
    pub frame: u64,
    /// Last closed one-second window rate
    pub fps: f64,
}

pub type EventListener = Box<dyn FnMut(&EngineEvent)>;
pub type FrameCallback = Box<dyn for<'a> FnMut(&FrameContext<'a>)>;
