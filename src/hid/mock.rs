/*
 *  hid/mock.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  In-process HID facade for tests and the standalone runner
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

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use log::debug;

use crate::constants::{MAX_CONTROLLERS, MAX_TOUCH_SLOTS};
use crate::plugin::ffi::{
    ControllerNumber, ControllerType, EnableInput, JoyconSide, JoystickAxis, KeyboardModifier,
    KeyboardRaw, MouseButton, MouseState, SixAxisMotion, TouchField, NUM_SIXAXIS_MOTIONS,
};

use super::HidFacade;

#[derive(Clone, Copy)]
struct ControllerSlot {
    connected: bool,
    kind: ControllerType,
    buttons: u64,
    sticks: [i16; 4],
    // Indexed by joycon side, then motion component.
    sixaxis: [[f32; NUM_SIXAXIS_MOTIONS]; 2],
}

impl Default for ControllerSlot {
    fn default() -> Self {
        Self {
            connected: false,
            kind: ControllerType::ProController,
            buttons: 0,
            sticks: [0; 4],
            sixaxis: [[0.0; NUM_SIXAXIS_MOTIONS]; 2],
        }
    }
}

#[derive(Clone, Copy, Default)]
struct TouchSlot {
    fields: [i32; 5],
}

#[derive(Default)]
struct HidInner {
    controllers: [ControllerSlot; MAX_CONTROLLERS],
    handheld_mode: bool,
    keyboard: KeyboardRaw,
    mouse: MouseState,
    touches: [TouchSlot; MAX_TOUCH_SLOTS],
    touch_count: u8,
    outside_mask: EnableInput,
}

/// An entirely in-process HID facade: every accessor works, nothing
/// touches real devices, and tests can inspect the resulting state.
pub struct MockHid {
    inner: Mutex<HidInner>,
    update_requests: AtomicU32,
}

impl MockHid {
    pub fn new() -> Self {
        let mut inner = HidInner::default();
        inner.handheld_mode = true;
        inner.controllers[ControllerNumber::Handheld.index()].connected = true;
        inner.controllers[ControllerNumber::Handheld.index()].kind = ControllerType::DualJoycon;
        Self {
            inner: Mutex::new(inner),
            update_requests: AtomicU32::new(0),
        }
    }

    /// Number of state-update requests plugins have issued.
    pub fn update_requests(&self) -> u32 {
        self.update_requests.load(Ordering::Relaxed)
    }

    /// The current outside-input gate.
    pub fn outside_mask(&self) -> EnableInput {
        self.inner.lock().unwrap().outside_mask
    }
}

impl Default for MockHid {
    fn default() -> Self {
        Self::new()
    }
}

impl HidFacade for MockHid {
    fn pad_state(&self, player: ControllerNumber) -> u64 {
        self.inner.lock().unwrap().controllers[player.index()].buttons
    }

    fn set_pad_state(&self, player: ControllerNumber, buttons: u64) {
        self.inner.lock().unwrap().controllers[player.index()].buttons = buttons;
    }

    fn joystick(&self, player: ControllerNumber, axis: JoystickAxis) -> i16 {
        self.inner.lock().unwrap().controllers[player.index()].sticks[axis as usize]
    }

    fn set_joystick(&self, player: ControllerNumber, axis: JoystickAxis, value: i16) {
        self.inner.lock().unwrap().controllers[player.index()].sticks[axis as usize] = value;
    }

    fn sixaxis(&self, player: ControllerNumber, side: JoyconSide, motion: SixAxisMotion) -> f32 {
        self.inner.lock().unwrap().controllers[player.index()].sixaxis[side as usize]
            [motion.index()]
    }

    fn set_sixaxis(
        &self,
        player: ControllerNumber,
        side: JoyconSide,
        motion: SixAxisMotion,
        value: f32,
    ) {
        self.inner.lock().unwrap().controllers[player.index()].sixaxis[side as usize]
            [motion.index()] = value;
    }

    fn connect(&self, player: ControllerNumber, connected: bool) {
        self.inner.lock().unwrap().controllers[player.index()].connected = connected;
    }

    fn is_connected(&self, player: ControllerNumber) -> bool {
        self.inner.lock().unwrap().controllers[player.index()].connected
    }

    fn connected_count(&self) -> u8 {
        let inner = self.inner.lock().unwrap();
        inner.controllers.iter().filter(|slot| slot.connected).count() as u8
    }

    fn add_controller(&self, kind: ControllerType) {
        let mut inner = self.inner.lock().unwrap();
        // The handheld slot is managed through set_handheld_mode.
        let free = inner.controllers[..ControllerNumber::Handheld.index()]
            .iter()
            .position(|slot| !slot.connected);
        match free {
            Some(index) => {
                inner.controllers[index].connected = true;
                inner.controllers[index].kind = kind;
            }
            None => debug!("add_controller: all individual slots are taken"),
        }
    }

    fn disconnect_all(&self) {
        let mut inner = self.inner.lock().unwrap();
        for slot in inner.controllers.iter_mut() {
            slot.connected = false;
        }
    }

    fn set_controller_type(&self, player: ControllerNumber, kind: ControllerType) {
        self.inner.lock().unwrap().controllers[player.index()].kind = kind;
    }

    fn controller_type(&self, player: ControllerNumber) -> ControllerType {
        self.inner.lock().unwrap().controllers[player.index()].kind
    }

    fn set_handheld_mode(&self, enabled: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.handheld_mode = enabled;
        inner.controllers[ControllerNumber::Handheld.index()].connected = enabled;
    }

    fn request_state_update(&self) {
        self.update_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn key_pressed(&self, key: u8) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.keyboard.keys[key as usize / 64] >> (key as usize % 64) & 1 != 0
    }

    fn set_key_pressed(&self, key: u8, pressed: bool) {
        let mut inner = self.inner.lock().unwrap();
        let word = key as usize / 64;
        let bit = 1u64 << (key as usize % 64);
        if pressed {
            inner.keyboard.keys[word] |= bit;
        } else {
            inner.keyboard.keys[word] &= !bit;
        }
    }

    fn modifier_pressed(&self, modifier: KeyboardModifier) -> bool {
        self.inner.lock().unwrap().keyboard.modifiers >> modifier.index() & 1 != 0
    }

    fn set_modifier_pressed(&self, modifier: KeyboardModifier, pressed: bool) {
        let mut inner = self.inner.lock().unwrap();
        let bit = 1u64 << modifier.index();
        if pressed {
            inner.keyboard.modifiers |= bit;
        } else {
            inner.keyboard.modifiers &= !bit;
        }
    }

    fn keyboard_raw(&self) -> KeyboardRaw {
        self.inner.lock().unwrap().keyboard
    }

    fn write_keyboard_raw(&self, raw: &KeyboardRaw) {
        self.inner.lock().unwrap().keyboard = *raw;
    }

    fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.inner.lock().unwrap().mouse.buttons >> button.index() & 1 != 0
    }

    fn set_mouse_pressed(&self, button: MouseButton, pressed: bool) {
        let mut inner = self.inner.lock().unwrap();
        let bit = 1u32 << button.index();
        if pressed {
            inner.mouse.buttons |= bit;
        } else {
            inner.mouse.buttons &= !bit;
        }
    }

    fn mouse_state(&self) -> MouseState {
        self.inner.lock().unwrap().mouse
    }

    fn write_mouse_state(&self, state: &MouseState) {
        self.inner.lock().unwrap().mouse = *state;
    }

    fn touch_count(&self) -> u8 {
        self.inner.lock().unwrap().touch_count
    }

    fn set_touch_count(&self, count: u8) {
        self.inner.lock().unwrap().touch_count = count.min(MAX_TOUCH_SLOTS as u8);
    }

    fn touch_field(&self, slot: u8, field: TouchField) -> i32 {
        if slot as usize >= MAX_TOUCH_SLOTS {
            return 0;
        }
        self.inner.lock().unwrap().touches[slot as usize].fields[field.index()]
    }

    fn set_touch_field(&self, slot: u8, field: TouchField, value: i32) {
        if slot as usize >= MAX_TOUCH_SLOTS {
            return;
        }
        self.inner.lock().unwrap().touches[slot as usize].fields[field.index()] = value;
    }

    fn enable_outside_input(&self, mask: EnableInput) {
        self.inner.lock().unwrap().outside_mask = mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handheld_connected_by_default() {
        let hid = MockHid::new();
        assert!(hid.is_connected(ControllerNumber::Handheld));
        assert_eq!(hid.connected_count(), 1);
    }

    #[test]
    fn test_joystick_roundtrip() {
        let hid = MockHid::new();
        hid.set_joystick(ControllerNumber::Controller1, JoystickAxis::LeftX, -12345);
        assert_eq!(
            hid.joystick(ControllerNumber::Controller1, JoystickAxis::LeftX),
            -12345
        );
        assert_eq!(hid.joystick(ControllerNumber::Controller1, JoystickAxis::LeftY), 0);
    }

    #[test]
    fn test_keyboard_bitfield_indexing() {
        let hid = MockHid::new();
        // Key 0xE0 lands in the fourth word of the bitfield.
        hid.set_key_pressed(0xE0, true);
        assert!(hid.key_pressed(0xE0));
        assert!(!hid.key_pressed(0x04));
        assert_eq!(hid.keyboard_raw().keys[3], 1u64 << 32);

        hid.set_key_pressed(0xE0, false);
        assert!(!hid.key_pressed(0xE0));
    }

    #[test]
    fn test_add_controller_fills_free_slot() {
        let hid = MockHid::new();
        hid.add_controller(ControllerType::LeftJoycon);
        assert!(hid.is_connected(ControllerNumber::Controller1));
        assert_eq!(
            hid.controller_type(ControllerNumber::Controller1),
            ControllerType::LeftJoycon
        );

        hid.disconnect_all();
        assert_eq!(hid.connected_count(), 0);
    }

    #[test]
    fn test_touch_slot_bounds() {
        let hid = MockHid::new();
        hid.set_touch_field(2, TouchField::X, 640);
        assert_eq!(hid.touch_field(2, TouchField::X), 640);
        // Out-of-range slots are ignored.
        hid.set_touch_field(200, TouchField::X, 1);
        assert_eq!(hid.touch_field(200, TouchField::X), 0);
    }
}
