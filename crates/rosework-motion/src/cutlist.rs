//! Motion commands and the instruction sink.
//!
//! The synthesizer streams commands into a [`CutList`]; commands are only
//! ever appended, never rewritten, so later commands can assume the machine
//! state left by earlier ones (position, accumulated spindle rotation).

use serde::{Deserialize, Serialize};

use rosework_core::types::angle_check;

/// Speed class of a point-to-point move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speed {
    /// Rapid positioning move, no cutting.
    Fast,
    /// Linear-speed move: the first point of a cut.
    Velocity,
    /// Spindle-synchronized move: subsequent points of a cut.
    Rpm,
}

/// One atomic instruction in a synthesized toolpath.
///
/// The spindle coordinate `c` is in degrees and may exceed ±360 to express
/// multi-turn moves before wrap normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    /// Rapid move, no cut.
    RapidTo {
        /// Target radial position.
        x: f64,
        /// Target axial position.
        z: f64,
        /// Target spindle angle in degrees.
        c: f64,
    },
    /// First point of a cut at linear speed.
    VelocityTo {
        /// Target radial position.
        x: f64,
        /// Target axial position.
        z: f64,
        /// Target spindle angle in degrees.
        c: f64,
    },
    /// Subsequent cut point, spindle-synchronized.
    RpmTo {
        /// Target radial position.
        x: f64,
        /// Target axial position.
        z: f64,
        /// Target spindle angle in degrees.
        c: f64,
    },
    /// A full spindle revolution at constant XZ.
    FullTurn {
        /// Signed degrees of rotation, normally ±360.
        degrees: f64,
    },
    /// Human-readable annotation, passed through to consumers.
    Comment(String),
}

impl MotionCommand {
    /// The speed class, for point moves.
    pub fn speed(&self) -> Option<Speed> {
        match self {
            MotionCommand::RapidTo { .. } => Some(Speed::Fast),
            MotionCommand::VelocityTo { .. } => Some(Speed::Velocity),
            MotionCommand::RpmTo { .. } => Some(Speed::Rpm),
            _ => None,
        }
    }

    /// True for a velocity or rpm cut move.
    pub fn is_cut(&self) -> bool {
        matches!(
            self,
            MotionCommand::VelocityTo { .. } | MotionCommand::RpmTo { .. }
        )
    }
}

/// The instruction sink fed by toolpath synthesis.
pub trait CutList {
    /// Append a point move of the given speed class.
    fn go_to(&mut self, speed: Speed, x: f64, z: f64, c: f64);

    /// Append a full-turn command.
    fn turn(&mut self, degrees: f64);

    /// Append an annotation.
    fn comment(&mut self, text: &str);

    /// Normalize the accumulated spindle rotation if it has wound past a
    /// full turn, so later moves start from a wrapped angle.
    fn spindle_wrap_check(&mut self);
}

/// A growable list of motion commands; the standard [`CutList`] sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstructionList {
    commands: Vec<MotionCommand>,
    last_c: f64,
}

impl InstructionList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The commands appended so far, in traversal order.
    pub fn commands(&self) -> &[MotionCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Consume the list, yielding the command vector.
    pub fn into_commands(self) -> Vec<MotionCommand> {
        self.commands
    }

    /// Point moves only, with comments and turns filtered out.
    pub fn point_moves(&self) -> impl Iterator<Item = &MotionCommand> {
        self.commands.iter().filter(|c| c.speed().is_some())
    }
}

impl CutList for InstructionList {
    fn go_to(&mut self, speed: Speed, x: f64, z: f64, c: f64) {
        self.last_c = c;
        self.commands.push(match speed {
            Speed::Fast => MotionCommand::RapidTo { x, z, c },
            Speed::Velocity => MotionCommand::VelocityTo { x, z, c },
            Speed::Rpm => MotionCommand::RpmTo { x, z, c },
        });
    }

    fn turn(&mut self, degrees: f64) {
        self.commands.push(MotionCommand::FullTurn { degrees });
    }

    fn comment(&mut self, text: &str) {
        self.commands.push(MotionCommand::Comment(text.to_string()));
    }

    fn spindle_wrap_check(&mut self) {
        if self.last_c.abs() >= 360.0 {
            let wrapped = angle_check(self.last_c);
            // Realign the spindle coordinate without moving the cutter.
            if let Some(MotionCommand::RapidTo { x, z, .. }
            | MotionCommand::VelocityTo { x, z, .. }
            | MotionCommand::RpmTo { x, z, .. }) = self
                .commands
                .iter()
                .rev()
                .find(|c| c.speed().is_some())
                .cloned()
                .as_ref()
            {
                self.commands.push(MotionCommand::RapidTo {
                    x: *x,
                    z: *z,
                    c: wrapped,
                });
            }
            self.last_c = wrapped;
        }
    }
}
