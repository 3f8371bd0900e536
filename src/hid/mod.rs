/*
 *  hid/mod.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Facade over the HID applet resource
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

//! Raw accessors over the guest's HID shared memory. The emulator's
//! controller objects stay behind this trait; plugins only ever see the
//! packed values the console itself exchanges with applications.
//!
//! Access discipline: a plugin touches the facade only while its worker
//! holds the scheduling baton, so implementations need no ordering beyond
//! plain interior mutability.

pub mod mock;

use crate::plugin::ffi::{
    ControllerNumber, ControllerType, EnableInput, JoyconSide, JoystickAxis, KeyboardModifier,
    KeyboardRaw, MouseButton, MouseState, SixAxisMotion, TouchField,
};

pub use mock::MockHid;

/// The HID applet resource as the plugin host sees it.
pub trait HidFacade: Send + Sync {
    /// Packed digital button state for a controller slot.
    fn pad_state(&self, player: ControllerNumber) -> u64;
    fn set_pad_state(&self, player: ControllerNumber, buttons: u64);

    fn joystick(&self, player: ControllerNumber, axis: JoystickAxis) -> i16;
    fn set_joystick(&self, player: ControllerNumber, axis: JoystickAxis, value: i16);

    /// Six-axis motion state, per joycon half.
    fn sixaxis(&self, player: ControllerNumber, side: JoyconSide, motion: SixAxisMotion) -> f32;
    fn set_sixaxis(
        &self,
        player: ControllerNumber,
        side: JoyconSide,
        motion: SixAxisMotion,
        value: f32,
    );

    fn connect(&self, player: ControllerNumber, connected: bool);
    fn is_connected(&self, player: ControllerNumber) -> bool;
    fn connected_count(&self) -> u8;

    /// Connect the next free slot with the given style. No-op when all
    /// slots are taken.
    fn add_controller(&self, kind: ControllerType);
    fn disconnect_all(&self);

    fn set_controller_type(&self, player: ControllerNumber, kind: ControllerType);
    fn controller_type(&self, player: ControllerNumber) -> ControllerType;

    /// Switch between handheld mode and individual-controller mode.
    fn set_handheld_mode(&self, enabled: bool);

    /// Ask the emulator to refresh every peripheral's shared-memory image
    /// from the host devices on its next input tick.
    fn request_state_update(&self);

    fn key_pressed(&self, key: u8) -> bool;
    fn set_key_pressed(&self, key: u8, pressed: bool);
    fn modifier_pressed(&self, modifier: KeyboardModifier) -> bool;
    fn set_modifier_pressed(&self, modifier: KeyboardModifier, pressed: bool);
    fn keyboard_raw(&self) -> KeyboardRaw;
    fn write_keyboard_raw(&self, raw: &KeyboardRaw);

    fn mouse_pressed(&self, button: MouseButton) -> bool;
    fn set_mouse_pressed(&self, button: MouseButton, pressed: bool);
    fn mouse_state(&self) -> MouseState;
    fn write_mouse_state(&self, state: &MouseState);

    fn touch_count(&self) -> u8;
    fn set_touch_count(&self, count: u8);
    fn touch_field(&self, slot: u8, field: TouchField) -> i32;
    fn set_touch_field(&self, slot: u8, field: TouchField, value: i32);

    /// Gate which peripherals keep accepting input from outside the
    /// plugin; everything else is plugin-driven until re-enabled.
    fn enable_outside_input(&self, mask: EnableInput);
}
