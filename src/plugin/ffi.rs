/*
 *  plugin/ffi.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  C ABI types for the plugin interface
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

//! C ABI surface shared between the host and plugins.
//!
//! All types here use `#[repr(C)]` (or a fixed integer representation) so
//! the layout is identical across compilation units. Values arriving from
//! a plugin are treated as raw integers and validated with the `from_raw`
//! constructors; a trusted-but-buggy plugin must not be able to produce an
//! invalid Rust enum value.
//!
//! Ownership rule for the whole surface: any string or buffer the host
//! returns was allocated with the host allocator and must be released
//! through the exported `meta_free`; any string the plugin passes in is
//! borrowed for the duration of the call.

use std::os::raw::{c_char, c_void};

/// Interface version the host implements. A plugin is loaded only if its
/// `get_plugin_interface_version` export returns exactly this value.
pub const PLUGIN_INTERFACE_VERSION: u64 = 1;

/// Prefix of the per-API pointer-slot symbols a plugin exports.
pub const SLOT_SYMBOL_PREFIX: &str = "yuzu_";

/// Required plugin exports.
pub const SYM_INTERFACE_VERSION: &[u8] = b"get_plugin_interface_version\0";
pub const SYM_START: &[u8] = b"start\0";
pub const SYM_MAIN_LOOP: &[u8] = b"on_main_loop\0";
/// Optional plugin export, called once on unload.
pub const SYM_CLOSE: &[u8] = b"on_close\0";

/// `get_plugin_interface_version` export.
pub type InterfaceVersionFn = unsafe extern "C" fn() -> u64;
/// `start` export; receives the opaque context the plugin must pass back
/// on every host API call.
pub type StartFn = unsafe extern "C" fn(ctx: *mut c_void);
/// `on_main_loop` export; invoked once per scheduled pass.
pub type MainLoopFn = unsafe extern "C" fn();
/// `on_close` export.
pub type CloseFn = unsafe extern "C" fn();

/// Severity taxonomy for plugin-originated log messages.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warning = 3,
    Error = 4,
    Critical = 5,
}

impl LogLevel {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(LogLevel::Trace),
            1 => Some(LogLevel::Debug),
            2 => Some(LogLevel::Info),
            3 => Some(LogLevel::Warning),
            4 => Some(LogLevel::Error),
            5 => Some(LogLevel::Critical),
            _ => None,
        }
    }
}

/// Controller slot, following the console's numbering: eight individual
/// player slots plus the handheld slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerNumber {
    Controller1 = 0,
    Controller2 = 1,
    Controller3 = 2,
    Controller4 = 3,
    Controller5 = 4,
    Controller6 = 5,
    Controller7 = 6,
    Controller8 = 7,
    Handheld = 8,
    Unknown = 9,
}

impl ControllerNumber {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(ControllerNumber::Controller1),
            1 => Some(ControllerNumber::Controller2),
            2 => Some(ControllerNumber::Controller3),
            3 => Some(ControllerNumber::Controller4),
            4 => Some(ControllerNumber::Controller5),
            5 => Some(ControllerNumber::Controller6),
            6 => Some(ControllerNumber::Controller7),
            7 => Some(ControllerNumber::Controller8),
            8 => Some(ControllerNumber::Handheld),
            _ => None,
        }
    }

    /// Index into the controller slot array.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Physical controller style assigned to a slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerType {
    ProController = 0,
    DualJoycon = 1,
    RightJoycon = 2,
    LeftJoycon = 3,
}

impl ControllerType {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(ControllerType::ProController),
            1 => Some(ControllerType::DualJoycon),
            2 => Some(ControllerType::RightJoycon),
            3 => Some(ControllerType::LeftJoycon),
            _ => None,
        }
    }
}

/// Analog stick axes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickAxis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
}

impl JoystickAxis {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(JoystickAxis::LeftX),
            1 => Some(JoystickAxis::LeftY),
            2 => Some(JoystickAxis::RightX),
            3 => Some(JoystickAxis::RightY),
            _ => None,
        }
    }
}

/// Selects which half of a joycon pair a six-axis query addresses.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoyconSide {
    Left = 0,
    Right = 1,
}

impl JoyconSide {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(JoyconSide::Left),
            1 => Some(JoyconSide::Right),
            _ => None,
        }
    }
}

/// Components of the six-axis motion state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SixAxisMotion {
    AccelerationX = 0,
    AccelerationY = 1,
    AccelerationZ = 2,
    AngularVelocityX = 3,
    AngularVelocityY = 4,
    AngularVelocityZ = 5,
    AngleX = 6,
    AngleY = 7,
    AngleZ = 8,
    DirectionXX = 9,
    DirectionXY = 10,
    DirectionXZ = 11,
    DirectionYX = 12,
    DirectionYY = 13,
    DirectionYZ = 14,
    DirectionZX = 15,
    DirectionZY = 16,
    DirectionZZ = 17,
}

/// Number of six-axis components per joycon side.
pub const NUM_SIXAXIS_MOTIONS: usize = 18;

impl SixAxisMotion {
    pub fn from_raw(raw: u8) -> Option<Self> {
        if (raw as usize) < NUM_SIXAXIS_MOTIONS {
            // Discriminants are dense from zero.
            Some(unsafe { std::mem::transmute::<u8, SixAxisMotion>(raw) })
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Digital pad buttons, bit positions within the packed 64-bit pad state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadButton {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    LStick = 4,
    RStick = 5,
    L = 6,
    R = 7,
    ZL = 8,
    ZR = 9,
    Plus = 10,
    Minus = 11,

    DLeft = 12,
    DUp = 13,
    DRight = 14,
    DDown = 15,

    LStickLeft = 16,
    LStickUp = 17,
    LStickRight = 18,
    LStickDown = 19,

    RStickLeft = 20,
    RStickUp = 21,
    RStickRight = 22,
    RStickDown = 23,

    SL = 24,
    SR = 25,

    Home = 26,
    Screenshot = 27,
}

/// Keyboard keys, following the USB HID usage table the console uses for
/// its keyboard shared memory. Values are bit indices into the raw key
/// bitfield.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardKey {
    None = 0,
    Error = 1,

    A = 4,
    B = 5,
    C = 6,
    D = 7,
    E = 8,
    F = 9,
    G = 10,
    H = 11,
    I = 12,
    J = 13,
    K = 14,
    L = 15,
    M = 16,
    N = 17,
    O = 18,
    P = 19,
    Q = 20,
    R = 21,
    S = 22,
    T = 23,
    U = 24,
    V = 25,
    W = 26,
    X = 27,
    Y = 28,
    Z = 29,
    N1 = 30,
    N2 = 31,
    N3 = 32,
    N4 = 33,
    N5 = 34,
    N6 = 35,
    N7 = 36,
    N8 = 37,
    N9 = 38,
    N0 = 39,
    Enter = 40,
    Escape = 41,
    Backspace = 42,
    Tab = 43,
    Space = 44,
    Minus = 45,
    Equal = 46,
    LeftBrace = 47,
    RightBrace = 48,
    Backslash = 49,
    Tilde = 50,
    Semicolon = 51,
    Apostrophe = 52,
    Grave = 53,
    Comma = 54,
    Dot = 55,
    Slash = 56,
    CapsLockKey = 57,

    F1 = 58,
    F2 = 59,
    F3 = 60,
    F4 = 61,
    F5 = 62,
    F6 = 63,
    F7 = 64,
    F8 = 65,
    F9 = 66,
    F10 = 67,
    F11 = 68,
    F12 = 69,

    SystemRequest = 70,
    ScrollLockKey = 71,
    Pause = 72,
    Insert = 73,
    Home = 74,
    PageUp = 75,
    Delete = 76,
    End = 77,
    PageDown = 78,
    Right = 79,
    Left = 80,
    Down = 81,
    Up = 82,

    NumLockKey = 83,
    KPSlash = 84,
    KPAsterisk = 85,
    KPMinus = 86,
    KPPlus = 87,
    KPEnter = 88,
    KP1 = 89,
    KP2 = 90,
    KP3 = 91,
    KP4 = 92,
    KP5 = 93,
    KP6 = 94,
    KP7 = 95,
    KP8 = 96,
    KP9 = 97,
    KP0 = 98,
    KPDot = 99,

    Key102 = 100,
    Compose = 101,
    Power = 102,
    KPEqual = 103,

    F13 = 104,
    F14 = 105,
    F15 = 106,
    F16 = 107,
    F17 = 108,
    F18 = 109,
    F19 = 110,
    F20 = 111,
    F21 = 112,
    F22 = 113,
    F23 = 114,
    F24 = 115,

    Open = 116,
    Help = 117,
    Properties = 118,
    Front = 119,
    Stop = 120,
    Repeat = 121,
    Undo = 122,
    Cut = 123,
    Copy = 124,
    Paste = 125,
    Find = 126,
    Mute = 127,
    VolumeUp = 128,
    VolumeDown = 129,
    CapsLockActive = 130,
    NumLockActive = 131,
    ScrollLockActive = 132,
    KPComma = 133,

    KPLeftParenthesis = 134,
    KPRightParenthesis = 135,

    LeftControlKey = 0xE0,
    LeftShiftKey = 0xE1,
    LeftAltKey = 0xE2,
    LeftMetaKey = 0xE3,
    RightControlKey = 0xE4,
    RightShiftKey = 0xE5,
    RightAltKey = 0xE6,
    RightMetaKey = 0xE7,

    MediaPlayPause = 0xE8,
    MediaStopCD = 0xE9,
    MediaPrevious = 0xEA,
    MediaNext = 0xEB,
    MediaEject = 0xEC,
    MediaVolumeUp = 0xED,
    MediaVolumeDown = 0xEE,
    MediaMute = 0xEF,
    MediaWebsite = 0xF0,
    MediaBack = 0xF1,
    MediaForward = 0xF2,
    MediaStop = 0xF3,
    MediaFind = 0xF4,
    MediaScrollUp = 0xF5,
    MediaScrollDown = 0xF6,
    MediaEdit = 0xF7,
    MediaSleep = 0xF8,
    MediaCoffee = 0xF9,
    MediaRefresh = 0xFA,
    MediaCalculator = 0xFB,
}

/// Size of the raw keyboard bitfield in bits (one bit per key value).
pub const NUM_KEYBOARD_KEYS: usize = 256;

/// Keyboard modifier keys, bit indices into the packed modifier word.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardModifier {
    LeftControl = 0,
    LeftShift = 1,
    LeftAlt = 2,
    LeftMeta = 3,
    RightControl = 4,
    RightShift = 5,
    RightAlt = 6,
    RightMeta = 7,
    CapsLock = 8,
    ScrollLock = 9,
    NumLock = 10,
}

/// Number of keyboard modifiers.
pub const NUM_KEYBOARD_MODIFIERS: usize = 11;

impl KeyboardModifier {
    pub fn from_raw(raw: u8) -> Option<Self> {
        if (raw as usize) < NUM_KEYBOARD_MODIFIERS {
            Some(unsafe { std::mem::transmute::<u8, KeyboardModifier>(raw) })
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Raw keyboard shared-memory image: a 256-bit key bitfield plus the
/// packed modifier word.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardRaw {
    pub keys: [u64; 4],
    pub modifiers: u64,
}

/// Mouse buttons.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left = 0,
    Right = 1,
    Middle = 2,
    Forward = 3,
    Back = 4,
}

/// Number of mouse buttons.
pub const NUM_MOUSE_BUTTONS: usize = 5;

impl MouseButton {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Right),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Forward),
            4 => Some(MouseButton::Back),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Raw mouse shared-memory image.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseState {
    pub x: i32,
    pub y: i32,
    pub delta_x: i32,
    pub delta_y: i32,
    pub wheel: i32,
    pub buttons: u32,
}

/// Fields of a touch-point slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchField {
    X = 0,
    Y = 1,
    DiameterX = 2,
    DiameterY = 3,
    RotationAngle = 4,
}

impl TouchField {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(TouchField::X),
            1 => Some(TouchField::Y),
            2 => Some(TouchField::DiameterX),
            3 => Some(TouchField::DiameterY),
            4 => Some(TouchField::RotationAngle),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Bitmask selecting which peripherals accept input from outside the
/// plugin. Peripherals not enabled here are driven by the plugin alone.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnableInput(pub u16);

impl EnableInput {
    pub const NONE: EnableInput = EnableInput(0);
    pub const CONTROLLER_1: EnableInput = EnableInput(1 << 0);
    pub const CONTROLLER_2: EnableInput = EnableInput(1 << 1);
    pub const CONTROLLER_3: EnableInput = EnableInput(1 << 2);
    pub const CONTROLLER_4: EnableInput = EnableInput(1 << 3);
    pub const CONTROLLER_5: EnableInput = EnableInput(1 << 4);
    pub const CONTROLLER_6: EnableInput = EnableInput(1 << 5);
    pub const CONTROLLER_7: EnableInput = EnableInput(1 << 6);
    pub const CONTROLLER_8: EnableInput = EnableInput(1 << 7);
    pub const CONTROLLER_HANDHELD: EnableInput = EnableInput(1 << 8);
    pub const TOUCHPAD: EnableInput = EnableInput(1 << 9);
    pub const MOUSE_KEYBOARD: EnableInput = EnableInput(1 << 10);
    pub const ALL: EnableInput = EnableInput(1 << 11);

    pub fn contains(self, other: EnableInput) -> bool {
        self.0 & Self::ALL.0 != 0 || self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for EnableInput {
    type Output = EnableInput;

    fn bitor(self, rhs: EnableInput) -> EnableInput {
        EnableInput(self.0 | rhs.0)
    }
}

/// Popup dialog severity, parsed from the ABI's `type` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    None,
    Information,
    Warning,
    Critical,
}

impl PopupKind {
    /// Parse the free-form type string a plugin passes to `gui_popup`.
    pub fn from_type_str(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "information" | "info" => PopupKind::Information,
            "warning" | "warn" => PopupKind::Warning,
            "critical" | "error" => PopupKind::Critical,
            _ => PopupKind::None,
        }
    }
}

// --- Host API table ---------------------------------------------------
//
// One typedef per `yuzu_<api>` pointer slot. The host writes the callable
// address into the slot at load; every call passes the opaque context
// back as the first argument (except `meta_free`, which mirrors the host
// allocator and takes only the buffer).

pub type MetaFreeFn = unsafe extern "C" fn(ptr: *mut c_void);

pub type EmuFrameAdvanceFn = unsafe extern "C" fn(ctx: *mut c_void);
pub type EmuPauseFn = unsafe extern "C" fn(ctx: *mut c_void);
pub type EmuUnpauseFn = unsafe extern "C" fn(ctx: *mut c_void);
pub type EmuFrameCountFn = unsafe extern "C" fn(ctx: *mut c_void) -> u64;
pub type EmuFpsFn = unsafe extern "C" fn(ctx: *mut c_void) -> f64;
pub type EmuEmulatingFn = unsafe extern "C" fn(ctx: *mut c_void) -> u8;
pub type EmuPausedFn = unsafe extern "C" fn(ctx: *mut c_void) -> u8;
pub type EmuRomNameFn = unsafe extern "C" fn(ctx: *mut c_void) -> *mut c_char;
/// Program/process IDs, region starts/sizes, tick counters.
pub type EmuU64QueryFn = unsafe extern "C" fn(ctx: *mut c_void) -> u64;
pub type EmuLogFn =
    unsafe extern "C" fn(ctx: *mut c_void, message: *const c_char, level: u8);

pub type MemoryReadRangeFn =
    unsafe extern "C" fn(ctx: *mut c_void, address: u64, bytes: *mut u8, length: u64) -> u8;
pub type MemoryWriteRangeFn =
    unsafe extern "C" fn(ctx: *mut c_void, address: u64, bytes: *const u8, length: u64) -> u8;

pub type JoypadReadFn = unsafe extern "C" fn(ctx: *mut c_void, player: u8) -> u64;
pub type JoypadSetFn = unsafe extern "C" fn(ctx: *mut c_void, player: u8, buttons: u64);
pub type JoypadReadJoystickFn =
    unsafe extern "C" fn(ctx: *mut c_void, player: u8, axis: u8) -> i16;
pub type JoypadSetJoystickFn =
    unsafe extern "C" fn(ctx: *mut c_void, player: u8, axis: u8, value: i16);
pub type JoypadReadSixAxisFn =
    unsafe extern "C" fn(ctx: *mut c_void, player: u8, side: u8, motion: u8) -> f32;
pub type JoypadSetSixAxisFn =
    unsafe extern "C" fn(ctx: *mut c_void, player: u8, side: u8, motion: u8, value: f32);
pub type JoypadConnectFn = unsafe extern "C" fn(ctx: *mut c_void, player: u8);
pub type JoypadAddFn = unsafe extern "C" fn(ctx: *mut c_void, kind: u8);
pub type JoypadPlainFn = unsafe extern "C" fn(ctx: *mut c_void);
pub type JoypadSetTypeFn = unsafe extern "C" fn(ctx: *mut c_void, player: u8, kind: u8);
pub type JoypadGetTypeFn = unsafe extern "C" fn(ctx: *mut c_void, player: u8) -> u8;
pub type JoypadCountFn = unsafe extern "C" fn(ctx: *mut c_void) -> u8;
pub type JoypadEnableFn = unsafe extern "C" fn(ctx: *mut c_void, enable: u8);

pub type InputKeyQueryFn = unsafe extern "C" fn(ctx: *mut c_void, key: u8) -> u8;
pub type InputKeySetFn = unsafe extern "C" fn(ctx: *mut c_void, key: u8, pressed: u8);
pub type InputKeyboardRawReadFn =
    unsafe extern "C" fn(ctx: *mut c_void, out: *mut KeyboardRaw) -> u8;
pub type InputKeyboardRawWriteFn =
    unsafe extern "C" fn(ctx: *mut c_void, raw: *const KeyboardRaw) -> u8;
pub type InputMouseQueryFn = unsafe extern "C" fn(ctx: *mut c_void, button: i32) -> u8;
pub type InputMouseSetFn =
    unsafe extern "C" fn(ctx: *mut c_void, button: i32, pressed: u8);
pub type InputMousePosReadFn =
    unsafe extern "C" fn(ctx: *mut c_void, x: *mut i32, y: *mut i32) -> u8;
pub type InputMousePosWriteFn = unsafe extern "C" fn(ctx: *mut c_void, x: i32, y: i32);
pub type InputMouseRawReadFn =
    unsafe extern "C" fn(ctx: *mut c_void, out: *mut MouseState) -> u8;
pub type InputMouseRawWriteFn =
    unsafe extern "C" fn(ctx: *mut c_void, state: *const MouseState) -> u8;
pub type InputTouchCountReadFn = unsafe extern "C" fn(ctx: *mut c_void) -> u8;
pub type InputTouchCountWriteFn = unsafe extern "C" fn(ctx: *mut c_void, count: u8);
pub type InputTouchReadFn =
    unsafe extern "C" fn(ctx: *mut c_void, slot: u8, field: u8) -> i32;
pub type InputTouchWriteFn =
    unsafe extern "C" fn(ctx: *mut c_void, slot: u8, field: u8, value: i32);
pub type InputEnableOutsideFn = unsafe extern "C" fn(ctx: *mut c_void, mask: u16);

pub type GuiDimensionFn = unsafe extern "C" fn(ctx: *mut c_void) -> u32;
pub type GuiPlainFn = unsafe extern "C" fn(ctx: *mut c_void);
pub type GuiDrawPixelFn = unsafe extern "C" fn(
    ctx: *mut c_void,
    x: i32,
    y: i32,
    alpha: u8,
    red: u8,
    green: u8,
    blue: u8,
);
pub type GuiSaveScreenshotAsFn =
    unsafe extern "C" fn(ctx: *mut c_void, path: *const c_char) -> u8;
pub type GuiDrawImageFn = unsafe extern "C" fn(
    ctx: *mut c_void,
    dx: i32,
    dy: i32,
    path: *const c_char,
    sx: i32,
    sy: i32,
    sw: i32,
    sh: i32,
    alpha_mul: f32,
);
pub type GuiPopupFn = unsafe extern "C" fn(
    ctx: *mut c_void,
    message: *const c_char,
    kind: *const c_char,
    icon: *const c_char,
);
pub type GuiScreenshotMemoryFn =
    unsafe extern "C" fn(ctx: *mut c_void, size: *mut u64, format: *const c_char) -> *mut u8;

/// Borrow a plugin-passed C string for the duration of a call. Returns
/// None for null pointers or non-UTF-8 content.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays
/// valid for the call.
pub unsafe fn borrow_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    std::ffi::CStr::from_ptr(ptr).to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_number_from_raw() {
        assert_eq!(ControllerNumber::from_raw(0), Some(ControllerNumber::Controller1));
        assert_eq!(ControllerNumber::from_raw(8), Some(ControllerNumber::Handheld));
        assert_eq!(ControllerNumber::from_raw(9), None);
        assert_eq!(ControllerNumber::from_raw(255), None);
    }

    #[test]
    fn test_sixaxis_from_raw_bounds() {
        assert_eq!(SixAxisMotion::from_raw(0), Some(SixAxisMotion::AccelerationX));
        assert_eq!(SixAxisMotion::from_raw(17), Some(SixAxisMotion::DirectionZZ));
        assert_eq!(SixAxisMotion::from_raw(18), None);
    }

    #[test]
    fn test_enable_input_all_overrides() {
        let mask = EnableInput::ALL;
        assert!(mask.contains(EnableInput::CONTROLLER_3));
        assert!(mask.contains(EnableInput::MOUSE_KEYBOARD));

        let partial = EnableInput::CONTROLLER_1 | EnableInput::TOUCHPAD;
        assert!(partial.contains(EnableInput::TOUCHPAD));
        assert!(!partial.contains(EnableInput::CONTROLLER_2));
    }

    #[test]
    fn test_popup_kind_parsing() {
        assert_eq!(PopupKind::from_type_str("Information"), PopupKind::Information);
        assert_eq!(PopupKind::from_type_str("WARNING"), PopupKind::Warning);
        assert_eq!(PopupKind::from_type_str("critical"), PopupKind::Critical);
        assert_eq!(PopupKind::from_type_str("banana"), PopupKind::None);
    }
}
