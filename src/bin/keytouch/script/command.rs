use std::time::Duration;

use keytouch::keys::*;

/// One line of a driver script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScriptCommand {
    Down(KeyCode),
    Up(KeyCode),
    Press(KeyCode),
    Hold(KeyCode, Duration),
    Screen(u32, u32),
    Grid,
    Cursor,
    Hide,
    Wait(Duration),
    Quit,
}

/// Parse one script line. `Ok(None)` for blank lines and `#` comments.
pub(crate) fn parse_line(line: &str) -> Result<Option<ScriptCommand>, String> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or("").to_ascii_lowercase();
    let args: Vec<&str> = words.collect();
    let command = match (verb.as_str(), args.as_slice()) {
        ("down", [key]) => ScriptCommand::Down(parse_key(key)?),
        ("up", [key]) => ScriptCommand::Up(parse_key(key)?),
        ("press", [key]) => ScriptCommand::Press(parse_key(key)?),
        ("hold", [key, ms]) => ScriptCommand::Hold(parse_key(key)?, parse_millis(ms)?),
        ("screen", [width, height]) => {
            ScriptCommand::Screen(parse_number(width)?, parse_number(height)?)
        }
        ("grid", []) => ScriptCommand::Grid,
        ("cursor", []) => ScriptCommand::Cursor,
        ("hide", []) => ScriptCommand::Hide,
        ("wait", [ms]) => ScriptCommand::Wait(parse_millis(ms)?),
        ("quit", []) => ScriptCommand::Quit,
        _ => return Err(format!("unrecognized command: {line}")),
    };
    Ok(Some(command))
}

/// Key names (`0`-`9`, `star`, `pound`, `up`, `enter`, ...) or a raw `code:<n>`.
pub(crate) fn parse_key(token: &str) -> Result<KeyCode, String> {
    let lower = token.to_ascii_lowercase();
    if let Some(raw) = lower.strip_prefix("code:") {
        return raw
            .parse::<KeyCode>()
            .map_err(|_| format!("invalid key code: {token}"));
    }
    let name = lower.strip_prefix("key_").unwrap_or(&lower);
    let code = match name {
        "0" => KEY_0,
        "1" => KEY_1,
        "2" => KEY_2,
        "3" => KEY_3,
        "4" => KEY_4,
        "5" => KEY_5,
        "6" => KEY_6,
        "7" => KEY_7,
        "8" => KEY_8,
        "9" => KEY_9,
        "star" | "*" => KEY_STAR,
        "pound" | "#" => KEY_POUND,
        "up" | "dpad_up" => KEY_DPAD_UP,
        "down" | "dpad_down" => KEY_DPAD_DOWN,
        "left" | "dpad_left" => KEY_DPAD_LEFT,
        "right" | "dpad_right" => KEY_DPAD_RIGHT,
        "center" | "dpad_center" => KEY_DPAD_CENTER,
        "enter" => KEY_ENTER,
        "numpad_enter" => KEY_NUMPAD_ENTER,
        "back" => KEY_BACK,
        "escape" | "esc" => KEY_ESCAPE,
        "del" => KEY_DEL,
        "page_up" => KEY_PAGE_UP,
        "page_down" => KEY_PAGE_DOWN,
        "home" => KEY_MOVE_HOME,
        "end" => KEY_MOVE_END,
        "volume_up" => KEY_VOLUME_UP,
        "volume_down" => KEY_VOLUME_DOWN,
        other => match other.strip_prefix("numpad_").and_then(|d| d.parse::<i32>().ok()) {
            Some(digit @ 0..=9) => KEY_NUMPAD_0 + digit,
            _ => return Err(format!("unknown key: {token}")),
        },
    };
    Ok(code)
}

fn parse_number(token: &str) -> Result<u32, String> {
    token
        .parse::<u32>()
        .map_err(|_| format!("invalid number: {token}"))
}

fn parse_millis(token: &str) -> Result<Duration, String> {
    parse_number(token).map(|ms| Duration::from_millis(u64::from(ms)))
}
