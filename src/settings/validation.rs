use std::fmt;
use std::ops::RangeInclusive;

use super::{
    OverlaySettings, CURSOR_ACCELERATION_RANGE, CURSOR_SIZE_RANGE, CURSOR_SPEED_RANGE,
    GESTURE_DURATION_MS_RANGE, GRID_LEVELS_RANGE, OVERLAY_OPACITY_RANGE, SCROLL_MULTIPLIER_RANGE,
};
use crate::keys::{KeyCode, KEY_NONE, RESTRICTED_KEYS};

/// One problem found in a settings candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsViolation {
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    RestrictedKey {
        field: &'static str,
        code: KeyCode,
    },
    ActivationKeyCollision {
        code: KeyCode,
    },
}

impl SettingsViolation {
    pub fn field(&self) -> &'static str {
        match self {
            SettingsViolation::OutOfRange { field, .. }
            | SettingsViolation::RestrictedKey { field, .. } => field,
            SettingsViolation::ActivationKeyCollision { .. } => "gridActivationKey",
        }
    }
}

impl fmt::Display for SettingsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsViolation::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} must be between {min} and {max}, got {value}"),
            SettingsViolation::RestrictedKey { field, code } => {
                write!(f, "{field} cannot use reserved key {code}")
            }
            SettingsViolation::ActivationKeyCollision { code } => write!(
                f,
                "grid and cursor activation keys must be different (both {code})"
            ),
        }
    }
}

/// Settings rejected at the boundary, with every violation found.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsError {
    pub violations: Vec<SettingsViolation>,
}

impl SettingsError {
    pub fn has_key_collision(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, SettingsViolation::ActivationKeyCollision { .. }))
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for SettingsError {}

fn check_range<T>(
    violations: &mut Vec<SettingsViolation>,
    field: &'static str,
    value: T,
    range: &RangeInclusive<T>,
) where
    T: PartialOrd + Copy + Into<f64>,
{
    if !range.contains(&value) {
        violations.push(SettingsViolation::OutOfRange {
            field,
            value: value.into(),
            min: (*range.start()).into(),
            max: (*range.end()).into(),
        });
    }
}

fn is_valid_remappable_key(code: KeyCode) -> bool {
    code == KEY_NONE || !RESTRICTED_KEYS.contains(&code)
}

impl OverlaySettings {
    /// Collect every violation; `Ok` means the snapshot may reach the core.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut violations = Vec::new();
        check_range(&mut violations, "gridLevels", self.grid_levels, &GRID_LEVELS_RANGE);
        check_range(
            &mut violations,
            "overlayOpacity",
            self.overlay_opacity,
            &OVERLAY_OPACITY_RANGE,
        );
        check_range(&mut violations, "cursorSpeed", self.cursor_speed, &CURSOR_SPEED_RANGE);
        check_range(
            &mut violations,
            "cursorAcceleration",
            self.cursor_acceleration,
            &CURSOR_ACCELERATION_RANGE,
        );
        check_range(&mut violations, "cursorSize", self.cursor_size, &CURSOR_SIZE_RANGE);
        // u64 -> f64 has no `Into`; the bounds are tiny so the cast is exact.
        if !GESTURE_DURATION_MS_RANGE.contains(&self.gesture_duration) {
            violations.push(SettingsViolation::OutOfRange {
                field: "gestureDuration",
                value: self.gesture_duration as f64,
                min: *GESTURE_DURATION_MS_RANGE.start() as f64,
                max: *GESTURE_DURATION_MS_RANGE.end() as f64,
            });
        }
        check_range(
            &mut violations,
            "scrollMultiplier",
            self.scroll_multiplier,
            &SCROLL_MULTIPLIER_RANGE,
        );

        if !is_valid_remappable_key(self.grid_activation_key) {
            violations.push(SettingsViolation::RestrictedKey {
                field: "gridActivationKey",
                code: self.grid_activation_key,
            });
        }
        if !is_valid_remappable_key(self.cursor_activation_key) {
            violations.push(SettingsViolation::RestrictedKey {
                field: "cursorActivationKey",
                code: self.cursor_activation_key,
            });
        }
        if let (Some(grid), Some(cursor)) = (self.grid_key(), self.cursor_key()) {
            if grid == cursor {
                violations.push(SettingsViolation::ActivationKeyCollision { code: grid });
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SettingsError { violations })
        }
    }

    /// Clamp every numeric field into its own bounds and unbind reserved keys.
    ///
    /// Each field is clamped with its own range only; no field's output depends
    /// on any other field.
    pub fn sanitized(&self) -> OverlaySettings {
        let defaults = OverlaySettings::default();
        let scroll_multiplier = if self.scroll_multiplier.is_finite() {
            self.scroll_multiplier.clamp(
                *SCROLL_MULTIPLIER_RANGE.start(),
                *SCROLL_MULTIPLIER_RANGE.end(),
            )
        } else {
            defaults.scroll_multiplier
        };
        OverlaySettings {
            grid_levels: clamp_range(self.grid_levels, &GRID_LEVELS_RANGE),
            overlay_opacity: clamp_range(self.overlay_opacity, &OVERLAY_OPACITY_RANGE),
            cursor_speed: clamp_range(self.cursor_speed, &CURSOR_SPEED_RANGE),
            cursor_acceleration: clamp_range(
                self.cursor_acceleration,
                &CURSOR_ACCELERATION_RANGE,
            ),
            cursor_size: clamp_range(self.cursor_size, &CURSOR_SIZE_RANGE),
            gesture_duration: clamp_range(self.gesture_duration, &GESTURE_DURATION_MS_RANGE),
            scroll_multiplier,
            grid_activation_key: sanitize_key(self.grid_activation_key),
            cursor_activation_key: sanitize_key(self.cursor_activation_key),
            ..self.clone()
        }
    }
}

fn clamp_range<T: Ord + Copy>(value: T, range: &RangeInclusive<T>) -> T {
    value.clamp(*range.start(), *range.end())
}

fn sanitize_key(code: KeyCode) -> KeyCode {
    if is_valid_remappable_key(code) {
        code
    } else {
        KEY_NONE
    }
}
