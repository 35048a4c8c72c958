use bitflags::bitflags;

bitflags! {
    /// Buttons held during a tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u32 {
        const ACCELERATE = 1 << 0;
        const REVERSE = 1 << 1;
        const BOOST = 1 << 2;
        const HANDBRAKE = 1 << 3;
        const TURN_LEFT = 1 << 4;
        const TURN_RIGHT = 1 << 5;
    }
}

/// Raw driver intent for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawCommand {
    pub forward_move: f64,
    /// Analog side movement; ±400 is full lock.
    pub side_move: f64,
    pub buttons: Buttons,
    /// Elapsed tick time in seconds.
    pub frame_time: f64,
}

impl RawCommand {
    pub fn new(buttons: Buttons, frame_time: f64) -> Self {
        Self {
            buttons,
            frame_time,
            ..Default::default()
        }
    }

    pub fn with_side_move(self, side_move: f64) -> Self {
        Self { side_move, ..self }
    }

    pub fn turn(&self) -> Option<TurnDirection> {
        if self.buttons.contains(Buttons::TURN_LEFT) {
            Some(TurnDirection::Left)
        } else if self.buttons.contains(Buttons::TURN_RIGHT) {
            Some(TurnDirection::Right)
        } else {
            None
        }
    }

    pub fn drive(&self) -> DriveIntent {
        if self.buttons.contains(Buttons::ACCELERATE) {
            DriveIntent::Accelerate
        } else if self.buttons.contains(Buttons::REVERSE) {
            DriveIntent::Reverse
        } else {
            DriveIntent::Release
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// Steering lock for this direction.
    pub fn target(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveIntent {
    Accelerate,
    Reverse,
    Release,
}
