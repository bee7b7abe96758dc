//! Hardware key events as delivered by the host.
//!
//! Key codes follow the Android `KeyEvent` numbering since that is what keypad
//! hosts report; only the codes the overlay cares about are named here.

use serde::{Deserialize, Serialize};

pub type KeyCode = i32;

/// Sentinel for an unbound activation key.
pub const KEY_NONE: KeyCode = -1;

pub const KEY_BACK: KeyCode = 4;
pub const KEY_0: KeyCode = 7;
pub const KEY_1: KeyCode = 8;
pub const KEY_2: KeyCode = 9;
pub const KEY_3: KeyCode = 10;
pub const KEY_4: KeyCode = 11;
pub const KEY_5: KeyCode = 12;
pub const KEY_6: KeyCode = 13;
pub const KEY_7: KeyCode = 14;
pub const KEY_8: KeyCode = 15;
pub const KEY_9: KeyCode = 16;
pub const KEY_STAR: KeyCode = 17;
pub const KEY_POUND: KeyCode = 18;
pub const KEY_DPAD_UP: KeyCode = 19;
pub const KEY_DPAD_DOWN: KeyCode = 20;
pub const KEY_DPAD_LEFT: KeyCode = 21;
pub const KEY_DPAD_RIGHT: KeyCode = 22;
pub const KEY_DPAD_CENTER: KeyCode = 23;
pub const KEY_VOLUME_UP: KeyCode = 24;
pub const KEY_VOLUME_DOWN: KeyCode = 25;
pub const KEY_POWER: KeyCode = 26;
pub const KEY_ENTER: KeyCode = 66;
pub const KEY_DEL: KeyCode = 67;
pub const KEY_PAGE_UP: KeyCode = 92;
pub const KEY_PAGE_DOWN: KeyCode = 93;
pub const KEY_ESCAPE: KeyCode = 111;
pub const KEY_MOVE_HOME: KeyCode = 122;
pub const KEY_MOVE_END: KeyCode = 123;
pub const KEY_NUMPAD_0: KeyCode = 144;
pub const KEY_NUMPAD_1: KeyCode = 145;
pub const KEY_NUMPAD_9: KeyCode = 153;
pub const KEY_NUMPAD_ENTER: KeyCode = 160;

/// Keys the host reserves; they can never be bound as activation keys.
pub const RESTRICTED_KEYS: &[KeyCode] = &[KEY_POWER];

/// Digit 1-9 on either the phone keypad or the numpad.
pub fn digit_value(code: KeyCode) -> Option<u32> {
    match code {
        KEY_1..=KEY_9 => Some((code - KEY_0) as u32),
        KEY_NUMPAD_1..=KEY_NUMPAD_9 => Some((code - KEY_NUMPAD_0) as u32),
        _ => None,
    }
}

pub fn is_confirm_key(code: KeyCode) -> bool {
    matches!(code, KEY_DPAD_CENTER | KEY_ENTER | KEY_NUMPAD_ENTER)
}

pub fn is_back_key(code: KeyCode) -> bool {
    matches!(code, KEY_BACK | KEY_ESCAPE | KEY_DEL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Down,
    Up,
}

/// One hardware key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub action: KeyAction,
    /// Auto-repeat count; non-zero means the key is being held.
    pub repeat: u32,
}

impl KeyEvent {
    pub fn down(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Down,
            repeat: 0,
        }
    }

    pub fn up(code: KeyCode) -> Self {
        Self {
            code,
            action: KeyAction::Up,
            repeat: 0,
        }
    }

    pub fn repeat(code: KeyCode, repeat: u32) -> Self {
        Self {
            code,
            action: KeyAction::Down,
            repeat,
        }
    }

    pub fn is_down(&self) -> bool {
        self.action == KeyAction::Down
    }

    pub fn is_initial_down(&self) -> bool {
        self.is_down() && self.repeat == 0
    }

    pub fn is_up(&self) -> bool {
        self.action == KeyAction::Up
    }
}

/// Outcome of offering a key event to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Consumed,
    NotConsumed,
}

impl Handled {
    pub fn is_consumed(self) -> bool {
        self == Handled::Consumed
    }
}

impl From<bool> for Handled {
    fn from(consumed: bool) -> Self {
        if consumed {
            Handled::Consumed
        } else {
            Handled::NotConsumed
        }
    }
}

pub fn is_zero_key(code: KeyCode) -> bool {
    matches!(code, KEY_0 | KEY_NUMPAD_0)
}

/// Keys whose down event a handler consumed.
///
/// Their repeats and the matching up are consumed too, so the host never sees
/// half of a key press.
#[derive(Debug, Default)]
pub(crate) struct ConsumedKeys {
    codes: Vec<KeyCode>,
}

impl ConsumedKeys {
    pub(crate) fn claim(&mut self, code: KeyCode) {
        if !self.codes.contains(&code) {
            self.codes.push(code);
        }
    }

    pub(crate) fn is_claimed(&self, code: KeyCode) -> bool {
        self.codes.contains(&code)
    }

    /// Forget `code`; true if it had been claimed.
    pub(crate) fn release(&mut self, code: KeyCode) -> bool {
        let before = self.codes.len();
        self.codes.retain(|c| *c != code);
        self.codes.len() != before
    }
}
