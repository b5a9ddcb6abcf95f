//! Abstract input events and held-key state
//!
//! Device binding happens in the host; the core only sees logical keys.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Logical keys the session understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Fire,
    /// Start a game / confirm
    Start,
    /// Return to the main menu from an end screen
    Menu,
    /// Close the session
    Exit,
}

/// Discrete key transition delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Pressed(Key),
    Released(Key),
}

/// Keys currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

impl InputState {
    /// Track a held key; one-shot keys are ignored here
    pub fn apply(&mut self, event: InputEvent) {
        let (key, held) = match event {
            InputEvent::Pressed(key) => (key, true),
            InputEvent::Released(key) => (key, false),
        };
        match key {
            Key::Up => self.up = held,
            Key::Down => self.down = held,
            Key::Left => self.left = held,
            Key::Right => self.right = held,
            Key::Fire => self.fire = held,
            Key::Start | Key::Menu | Key::Exit => {}
        }
    }

    /// Release everything
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Unit-per-axis direction from held keys (screen y grows downward)
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| match (neg, pos) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}
