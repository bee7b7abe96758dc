//! Key bindings for cursor mode under each control scheme, and scroll shaping.

use super::motion::Direction;
use crate::geometry::{Point, ScreenDimensions};
use crate::gesture::GestureRequest;
use crate::keys::*;
use crate::settings::{ControlScheme, OverlaySettings};

/// Fraction of the screen extent one scroll swipe covers at multiplier 1.0.
pub const SCROLL_SCREEN_FRACTION: f32 = 0.25;

/// Direction the content should move into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorAction {
    Move(Direction),
    Click,
    Scroll(ScrollDirection),
    ToggleDrag,
    Exit,
}

pub fn action_for(scheme: ControlScheme, code: KeyCode) -> Option<CursorAction> {
    if is_back_key(code) {
        return Some(CursorAction::Exit);
    }
    if is_zero_key(code) {
        return Some(CursorAction::ToggleDrag);
    }
    if is_confirm_key(code) {
        return Some(CursorAction::Click);
    }
    match scheme {
        ControlScheme::Standard => standard_action(code),
        ControlScheme::Numpad => numpad_action(code),
    }
}

fn standard_action(code: KeyCode) -> Option<CursorAction> {
    let action = match code {
        KEY_DPAD_UP => CursorAction::Move(Direction::Up),
        KEY_DPAD_DOWN => CursorAction::Move(Direction::Down),
        KEY_DPAD_LEFT => CursorAction::Move(Direction::Left),
        KEY_DPAD_RIGHT => CursorAction::Move(Direction::Right),
        KEY_PAGE_UP => CursorAction::Scroll(ScrollDirection::Up),
        KEY_PAGE_DOWN => CursorAction::Scroll(ScrollDirection::Down),
        _ => match digit_value(code)? {
            2 => CursorAction::Scroll(ScrollDirection::Up),
            8 => CursorAction::Scroll(ScrollDirection::Down),
            4 => CursorAction::Scroll(ScrollDirection::Left),
            6 => CursorAction::Scroll(ScrollDirection::Right),
            _ => return None,
        },
    };
    Some(action)
}

fn numpad_action(code: KeyCode) -> Option<CursorAction> {
    let action = match code {
        KEY_DPAD_UP | KEY_PAGE_UP => CursorAction::Scroll(ScrollDirection::Up),
        KEY_DPAD_DOWN | KEY_PAGE_DOWN => CursorAction::Scroll(ScrollDirection::Down),
        KEY_DPAD_LEFT | KEY_MOVE_HOME => CursorAction::Scroll(ScrollDirection::Left),
        KEY_DPAD_RIGHT | KEY_MOVE_END => CursorAction::Scroll(ScrollDirection::Right),
        _ => match digit_value(code)? {
            1 => CursorAction::Move(Direction::UpLeft),
            2 => CursorAction::Move(Direction::Up),
            3 => CursorAction::Move(Direction::UpRight),
            4 => CursorAction::Move(Direction::Left),
            5 => CursorAction::Click,
            6 => CursorAction::Move(Direction::Right),
            7 => CursorAction::Move(Direction::DownLeft),
            8 => CursorAction::Move(Direction::Down),
            9 => CursorAction::Move(Direction::DownRight),
            _ => return None,
        },
    };
    Some(action)
}

/// Swipe that scrolls content in `direction` from the cursor position.
///
/// Without natural scrolling the finger moves against the content direction
/// (scrolling down drags the page up), as on a touch screen.
pub fn scroll_gesture(
    at: Point,
    direction: ScrollDirection,
    settings: &OverlaySettings,
    screen: ScreenDimensions,
) -> GestureRequest {
    let vertical = screen.height as f32 * SCROLL_SCREEN_FRACTION * settings.scroll_multiplier;
    let horizontal = screen.width as f32 * SCROLL_SCREEN_FRACTION * settings.scroll_multiplier;
    let (dx, dy) = match direction {
        ScrollDirection::Up => (0.0, vertical),
        ScrollDirection::Down => (0.0, -vertical),
        ScrollDirection::Left => (horizontal, 0.0),
        ScrollDirection::Right => (-horizontal, 0.0),
    };
    let sign = if settings.use_natural_scrolling { -1.0 } else { 1.0 };
    GestureRequest::Swipe {
        from: at,
        to: at.offset(dx * sign, dy * sign),
        duration: settings.gesture_duration(),
        style: settings.gesture_style,
    }
}

/// Drag from `from` to `to` using the configured duration and style.
pub fn drag_gesture(from: Point, to: Point, settings: &OverlaySettings) -> GestureRequest {
    GestureRequest::Drag {
        from,
        to,
        duration: settings.gesture_duration(),
        style: settings.gesture_style,
    }
}
