//! Directional key tracking.
//!
//! The controller is the sole writer of [`InputState`]. Key-down sets a flag,
//! key-up clears it, anything that is not an arrow key is ignored.

/// Keys as reported by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Unmapped,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(name: &str) -> Self {
        match name {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Unmapped,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::ArrowUp => Some(Direction::Up),
            Key::ArrowDown => Some(Direction::Down),
            Key::ArrowLeft => Some(Direction::Left),
            Key::ArrowRight => Some(Direction::Right),
            Key::Unmapped => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn key(self) -> Key {
        match self {
            Direction::Up => Key::ArrowUp,
            Direction::Down => Key::ArrowDown,
            Direction::Left => Key::ArrowLeft,
            Direction::Right => Key::ArrowRight,
        }
    }
}

/// A key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    /// true = pressed, false = released.
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self { key, pressed: true }
    }

    pub fn up(key: Key) -> Self {
        Self {
            key,
            pressed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    fn flag_mut(&mut self, direction: Direction) -> &mut bool {
        match direction {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }
}

#[derive(Debug, Default)]
pub struct InputController {
    state: InputState,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current flags. Consumers get a copy; only the controller mutates.
    pub fn state(&self) -> InputState {
        self.state
    }

    /// Apply a key transition. Returns true if any flag changed.
    pub fn handle(&mut self, event: KeyEvent) -> bool {
        let Some(direction) = event.key.direction() else {
            return false;
        };
        let flag = self.state.flag_mut(direction);
        let changed = *flag != event.pressed;
        *flag = event.pressed;
        changed
    }

    pub fn press(&mut self, key: Key) -> bool {
        self.handle(KeyEvent::down(key))
    }

    pub fn release(&mut self, key: Key) -> bool {
        self.handle(KeyEvent::up(key))
    }

    /// Drop every held key (controller teardown).
    pub fn release_all(&mut self) {
        self.state = InputState::default();
    }
}
