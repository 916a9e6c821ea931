use crate::effects::EffectKind;
use crate::food::FoodKind;
use crate::game::DeathReason;
use crate::snake::Position;

/// Things that happened during a tick which sound or visuals may react to.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Feedback {
    Turned,
    AteFood {
        position: Position,
        kind: FoodKind,
        combo: u32,
    },
    PowerUp {
        position: Position,
        kind: EffectKind,
    },
    EffectExpired(EffectKind),
    Collision {
        position: Position,
        reason: DeathReason,
    },
    /// Emitted once when the session ends.
    GameOver { final_score: u32 },
}

/// Receiver for [`Feedback`]; the engine never plays sound or draws itself.
pub trait FeedbackSink {
    fn emit(&mut self, feedback: Feedback);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn emit(&mut self, _feedback: Feedback) {}
}

impl FeedbackSink for Vec<Feedback> {
    fn emit(&mut self, feedback: Feedback) {
        self.push(feedback);
    }
}
