/*
 *  plugin/bindings.rs
 *
 *  Switchboard - native plugin host for handheld-console emulation
 *  (c) 2025-26 the Switchboard authors
 *
 *  Host API registration and the extern "C" glue behind every slot
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

//! Publishes the host API into a plugin's `yuzu_<api>` pointer slots and
//! implements each callable. Every entry unpacks the opaque context back
//! into the plugin record, guards on "is the guest powered on" or "is the
//! HID facade bound" where the operation needs it, and encodes failure as
//! the zero/null/false sentinel of its return shape; there is no
//! out-of-band error channel across this boundary.

use std::os::raw::{c_char, c_void};
use std::path::PathBuf;

use libloading::Library;
use log::{error, info, log, warn, Level};

use crate::hid::HidFacade;
use crate::overlay::{encode_frame, save_frame, OverlayCanvas};
use crate::system::EmulatorSystem;

use super::dynlib;
use super::ffi::{self, borrow_c_str};
use super::manager::ManagerShared;
use super::record::PluginRecord;

/// Write one callable address into the plugin's pointer slot for `api`,
/// if the plugin exports that slot. Missing slots are skipped.
unsafe fn write_slot<F: Copy>(lib: &Library, api: &str, value: F) {
    let mut symbol = Vec::with_capacity(ffi::SLOT_SYMBOL_PREFIX.len() + api.len() + 1);
    symbol.extend_from_slice(ffi::SLOT_SYMBOL_PREFIX.as_bytes());
    symbol.extend_from_slice(api.as_bytes());
    symbol.push(0);
    if let Some(slot) = dynlib::resolve::<*mut Option<F>>(lib, &symbol) {
        *slot = Some(value);
    }
}

/// Fill every host API slot the plugin exports. One-way: the host never
/// reads these slots back.
pub(crate) unsafe fn connect(lib: &Library) {
    write_slot::<ffi::MetaFreeFn>(lib, "meta_free", meta_free);

    write_slot::<ffi::EmuFrameAdvanceFn>(lib, "emu_frameadvance", emu_frameadvance);
    write_slot::<ffi::EmuPauseFn>(lib, "emu_pause", emu_pause);
    write_slot::<ffi::EmuUnpauseFn>(lib, "emu_unpause", emu_unpause);
    write_slot::<ffi::EmuFrameCountFn>(lib, "emu_framecount", emu_framecount);
    write_slot::<ffi::EmuFpsFn>(lib, "emu_fps", emu_fps);
    write_slot::<ffi::EmuEmulatingFn>(lib, "emu_emulating", emu_emulating);
    write_slot::<ffi::EmuPausedFn>(lib, "emu_paused", emu_paused);
    write_slot::<ffi::EmuRomNameFn>(lib, "emu_romname", emu_romname);
    write_slot::<ffi::EmuU64QueryFn>(lib, "emu_getprogramid", emu_getprogramid);
    write_slot::<ffi::EmuU64QueryFn>(lib, "emu_getprocessid", emu_getprocessid);
    write_slot::<ffi::EmuU64QueryFn>(lib, "emu_getheapstart", emu_getheapstart);
    write_slot::<ffi::EmuU64QueryFn>(lib, "emu_getheapsize", emu_getheapsize);
    write_slot::<ffi::EmuU64QueryFn>(lib, "emu_getmainstart", emu_getmainstart);
    write_slot::<ffi::EmuU64QueryFn>(lib, "emu_getmainsize", emu_getmainsize);
    write_slot::<ffi::EmuU64QueryFn>(lib, "emu_getstackstart", emu_getstackstart);
    write_slot::<ffi::EmuU64QueryFn>(lib, "emu_getstacksize", emu_getstacksize);
    write_slot::<ffi::EmuLogFn>(lib, "emu_log", emu_log);

    write_slot::<ffi::MemoryReadRangeFn>(lib, "memory_readbyterange", memory_readbyterange);
    write_slot::<ffi::MemoryWriteRangeFn>(lib, "memory_writebyterange", memory_writebyterange);

    write_slot::<ffi::EmuU64QueryFn>(lib, "debugger_getclockticks", debugger_getclockticks);
    write_slot::<ffi::EmuU64QueryFn>(lib, "debugger_getcputicks", debugger_getcputicks);

    write_slot::<ffi::JoypadReadFn>(lib, "joypad_read", joypad_read);
    write_slot::<ffi::JoypadSetFn>(lib, "joypad_set", joypad_set);
    write_slot::<ffi::JoypadReadJoystickFn>(lib, "joypad_readjoystick", joypad_readjoystick);
    write_slot::<ffi::JoypadSetJoystickFn>(lib, "joypad_setjoystick", joypad_setjoystick);
    write_slot::<ffi::JoypadReadSixAxisFn>(lib, "joypad_readsixaxis", joypad_readsixaxis);
    write_slot::<ffi::JoypadSetSixAxisFn>(lib, "joypad_setsixaxis", joypad_setsixaxis);
    write_slot::<ffi::JoypadConnectFn>(lib, "joypad_connect", joypad_connect);
    write_slot::<ffi::JoypadConnectFn>(lib, "joypad_disconnect", joypad_disconnect);
    write_slot::<ffi::JoypadAddFn>(lib, "joypad_addjoypad", joypad_addjoypad);
    write_slot::<ffi::JoypadPlainFn>(lib, "joypad_removealljoypads", joypad_removealljoypads);
    write_slot::<ffi::JoypadSetTypeFn>(lib, "joypad_setjoypadtype", joypad_setjoypadtype);
    write_slot::<ffi::JoypadGetTypeFn>(lib, "joypad_getjoypadtype", joypad_getjoypadtype);
    write_slot::<ffi::JoypadCountFn>(lib, "joypad_getnumjoypads", joypad_getnumjoypads);
    write_slot::<ffi::JoypadEnableFn>(lib, "joypad_sethandheldmode", joypad_sethandheldmode);

    write_slot::<ffi::JoypadPlainFn>(lib, "input_requeststateupdate", input_requeststateupdate);
    write_slot::<ffi::InputKeyQueryFn>(lib, "input_iskeypressed", input_iskeypressed);
    write_slot::<ffi::InputKeySetFn>(lib, "input_setkeypressed", input_setkeypressed);
    write_slot::<ffi::InputKeyQueryFn>(
        lib,
        "input_iskeymodifierpressed",
        input_iskeymodifierpressed,
    );
    write_slot::<ffi::InputKeySetFn>(
        lib,
        "input_setkeymodifierpressed",
        input_setkeymodifierpressed,
    );
    write_slot::<ffi::InputKeyboardRawReadFn>(lib, "input_readkeyboardraw", input_readkeyboardraw);
    write_slot::<ffi::InputKeyboardRawWriteFn>(
        lib,
        "input_writekeyboardraw",
        input_writekeyboardraw,
    );
    write_slot::<ffi::InputMouseQueryFn>(lib, "input_ismousepressed", input_ismousepressed);
    write_slot::<ffi::InputMouseSetFn>(lib, "input_setmousepressed", input_setmousepressed);
    write_slot::<ffi::InputMousePosReadFn>(lib, "input_getmouseposition", input_getmouseposition);
    write_slot::<ffi::InputMousePosWriteFn>(lib, "input_setmouseposition", input_setmouseposition);
    write_slot::<ffi::InputMouseRawReadFn>(lib, "input_readmouseraw", input_readmouseraw);
    write_slot::<ffi::InputMouseRawWriteFn>(lib, "input_writemouseraw", input_writemouseraw);
    write_slot::<ffi::InputTouchCountReadFn>(lib, "input_getnumtouches", input_getnumtouches);
    write_slot::<ffi::InputTouchCountWriteFn>(lib, "input_setnumtouches", input_setnumtouches);
    write_slot::<ffi::InputTouchReadFn>(lib, "input_readtouch", input_readtouch);
    write_slot::<ffi::InputTouchWriteFn>(lib, "input_writetouch", input_writetouch);
    write_slot::<ffi::InputEnableOutsideFn>(
        lib,
        "input_enableoutsideinput",
        input_enableoutsideinput,
    );

    write_slot::<ffi::GuiDimensionFn>(lib, "gui_getwidth", gui_getwidth);
    write_slot::<ffi::GuiDimensionFn>(lib, "gui_getheight", gui_getheight);
    write_slot::<ffi::GuiPlainFn>(lib, "gui_clearscreen", gui_clearscreen);
    write_slot::<ffi::GuiDrawPixelFn>(lib, "gui_drawpixel", gui_drawpixel);
    write_slot::<ffi::GuiPlainFn>(lib, "gui_render", gui_render);
    write_slot::<ffi::GuiSaveScreenshotAsFn>(lib, "gui_savescreenshotas", gui_savescreenshotas);
    write_slot::<ffi::GuiDrawImageFn>(lib, "gui_drawimage", gui_drawimage);
    write_slot::<ffi::GuiPopupFn>(lib, "gui_popup", gui_popup);
    write_slot::<ffi::GuiScreenshotMemoryFn>(
        lib,
        "gui_savescreenshotmemory",
        gui_savescreenshotmemory,
    );
}

// --- context plumbing -------------------------------------------------

unsafe fn with_record<T>(ctx: *mut c_void, default: T, f: impl FnOnce(&PluginRecord) -> T) -> T {
    match (ctx as *const PluginRecord).as_ref() {
        Some(record) => f(record),
        None => default,
    }
}

unsafe fn with_hid<T: Copy>(
    ctx: *mut c_void,
    default: T,
    f: impl FnOnce(&dyn HidFacade) -> T,
) -> T {
    with_record(ctx, default, |record| match record.hid() {
        Some(hid) => f(hid.as_ref()),
        None => default,
    })
}

/// Draw-path guard: refuse while the guest is not powered on, reconcile
/// the canvas with the current dock state, then run the operation.
unsafe fn with_overlay<T: Copy>(
    ctx: *mut c_void,
    default: T,
    f: impl FnOnce(&PluginRecord, &ManagerShared, &mut OverlayCanvas) -> T,
) -> T {
    with_record(ctx, default, |record| {
        if !record.system.is_emulating() {
            return default;
        }
        match record.manager.upgrade() {
            Some(shared) => {
                let mut overlay = shared.overlay.lock().unwrap();
                overlay.refresh(record.system.is_docked());
                f(record, &shared, &mut overlay)
            }
            None => default,
        }
    })
}

// --- allocation across the boundary ------------------------------------

/// Copy `s` into a `malloc`ed NUL-terminated buffer the plugin frees with
/// `meta_free`.
fn alloc_c_string(s: &str) -> *mut c_char {
    let bytes = s.as_bytes();
    unsafe {
        let buf = libc::malloc(bytes.len() + 1) as *mut u8;
        if buf.is_null() {
            return std::ptr::null_mut();
        }
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        *buf.add(bytes.len()) = 0;
        buf as *mut c_char
    }
}

/// Copy `data` into a `malloc`ed buffer the plugin frees with `meta_free`.
fn alloc_bytes(data: &[u8]) -> *mut u8 {
    unsafe {
        let buf = libc::malloc(data.len()) as *mut u8;
        if buf.is_null() {
            return std::ptr::null_mut();
        }
        std::ptr::copy_nonoverlapping(data.as_ptr(), buf, data.len());
        buf
    }
}

// --- meta --------------------------------------------------------------

unsafe extern "C" fn meta_free(ptr: *mut c_void) {
    if !ptr.is_null() {
        libc::free(ptr);
    }
}

// --- emu control -------------------------------------------------------

unsafe extern "C" fn emu_frameadvance(ctx: *mut c_void) {
    with_record(ctx, (), |record| record.park_for_vsync());
}

unsafe extern "C" fn emu_pause(ctx: *mut c_void) {
    with_record(ctx, (), |record| record.system.pause());
}

unsafe extern "C" fn emu_unpause(ctx: *mut c_void) {
    with_record(ctx, (), |record| record.system.resume());
}

unsafe extern "C" fn emu_framecount(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| record.system.frame_count())
}

unsafe extern "C" fn emu_fps(ctx: *mut c_void) -> f64 {
    with_record(ctx, 0.0, |record| record.system.fps())
}

unsafe extern "C" fn emu_emulating(ctx: *mut c_void) -> u8 {
    with_record(ctx, 0, |record| record.system.is_emulating() as u8)
}

unsafe extern "C" fn emu_paused(ctx: *mut c_void) -> u8 {
    with_record(ctx, 0, |record| record.system.is_paused() as u8)
}

unsafe extern "C" fn emu_romname(ctx: *mut c_void) -> *mut c_char {
    with_record(ctx, std::ptr::null_mut(), |record| {
        match record.system.rom_name() {
            Some(name) => alloc_c_string(&name),
            None => std::ptr::null_mut(),
        }
    })
}

unsafe extern "C" fn emu_getprogramid(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| record.system.program_id())
}

unsafe extern "C" fn emu_getprocessid(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| record.system.process_id())
}

unsafe extern "C" fn emu_getheapstart(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| {
        record.system.heap_region().map(|r| r.start).unwrap_or(0)
    })
}

unsafe extern "C" fn emu_getheapsize(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| {
        record.system.heap_region().map(|r| r.size).unwrap_or(0)
    })
}

unsafe extern "C" fn emu_getmainstart(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| {
        record.system.main_region().map(|r| r.start).unwrap_or(0)
    })
}

unsafe extern "C" fn emu_getmainsize(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| {
        record.system.main_region().map(|r| r.size).unwrap_or(0)
    })
}

unsafe extern "C" fn emu_getstackstart(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| {
        record.system.stack_region().map(|r| r.start).unwrap_or(0)
    })
}

unsafe extern "C" fn emu_getstacksize(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| {
        record.system.stack_region().map(|r| r.size).unwrap_or(0)
    })
}

unsafe extern "C" fn emu_log(ctx: *mut c_void, message: *const c_char, level: u8) {
    with_record(ctx, (), |record| {
        let Some(message) = borrow_c_str(message) else {
            return;
        };
        match ffi::LogLevel::from_raw(level) {
            Some(ffi::LogLevel::Trace) => log!(target: &record.name, Level::Trace, "{}", message),
            Some(ffi::LogLevel::Debug) => log!(target: &record.name, Level::Debug, "{}", message),
            Some(ffi::LogLevel::Info) => log!(target: &record.name, Level::Info, "{}", message),
            Some(ffi::LogLevel::Warning) => log!(target: &record.name, Level::Warn, "{}", message),
            Some(ffi::LogLevel::Error) => log!(target: &record.name, Level::Error, "{}", message),
            Some(ffi::LogLevel::Critical) => {
                log!(target: &record.name, Level::Error, "critical: {}", message)
            }
            None => log!(target: &record.name, Level::Info, "{}", message),
        }
    })
}

// --- guest memory ------------------------------------------------------

unsafe extern "C" fn memory_readbyterange(
    ctx: *mut c_void,
    address: u64,
    bytes: *mut u8,
    length: u64,
) -> u8 {
    with_record(ctx, 0, |record| {
        if bytes.is_null() {
            return 0;
        }
        let out = std::slice::from_raw_parts_mut(bytes, length as usize);
        record.system.read_memory(address, out) as u8
    })
}

unsafe extern "C" fn memory_writebyterange(
    ctx: *mut c_void,
    address: u64,
    bytes: *const u8,
    length: u64,
) -> u8 {
    with_record(ctx, 0, |record| {
        if bytes.is_null() {
            return 0;
        }
        let data = std::slice::from_raw_parts(bytes, length as usize);
        record.system.write_memory(address, data) as u8
    })
}

// --- timing ------------------------------------------------------------

unsafe extern "C" fn debugger_getclockticks(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| record.system.clock_ticks())
}

unsafe extern "C" fn debugger_getcputicks(ctx: *mut c_void) -> u64 {
    with_record(ctx, 0, |record| record.system.cpu_ticks())
}

// --- joypad / HID ------------------------------------------------------

unsafe extern "C" fn joypad_read(ctx: *mut c_void, player: u8) -> u64 {
    with_hid(ctx, 0, |hid| {
        ffi::ControllerNumber::from_raw(player)
            .map(|player| hid.pad_state(player))
            .unwrap_or(0)
    })
}

unsafe extern "C" fn joypad_set(ctx: *mut c_void, player: u8, buttons: u64) {
    with_hid(ctx, (), |hid| {
        if let Some(player) = ffi::ControllerNumber::from_raw(player) {
            hid.set_pad_state(player, buttons);
        }
    })
}

unsafe extern "C" fn joypad_readjoystick(ctx: *mut c_void, player: u8, axis: u8) -> i16 {
    with_hid(ctx, 0, |hid| {
        match (ffi::ControllerNumber::from_raw(player), ffi::JoystickAxis::from_raw(axis)) {
            (Some(player), Some(axis)) => hid.joystick(player, axis),
            _ => 0,
        }
    })
}

unsafe extern "C" fn joypad_setjoystick(ctx: *mut c_void, player: u8, axis: u8, value: i16) {
    with_hid(ctx, (), |hid| {
        if let (Some(player), Some(axis)) =
            (ffi::ControllerNumber::from_raw(player), ffi::JoystickAxis::from_raw(axis))
        {
            hid.set_joystick(player, axis, value);
        }
    })
}

unsafe extern "C" fn joypad_readsixaxis(
    ctx: *mut c_void,
    player: u8,
    side: u8,
    motion: u8,
) -> f32 {
    with_hid(ctx, 0.0, |hid| {
        match (
            ffi::ControllerNumber::from_raw(player),
            ffi::JoyconSide::from_raw(side),
            ffi::SixAxisMotion::from_raw(motion),
        ) {
            (Some(player), Some(side), Some(motion)) => hid.sixaxis(player, side, motion),
            _ => 0.0,
        }
    })
}

unsafe extern "C" fn joypad_setsixaxis(
    ctx: *mut c_void,
    player: u8,
    side: u8,
    motion: u8,
    value: f32,
) {
    with_hid(ctx, (), |hid| {
        if let (Some(player), Some(side), Some(motion)) = (
            ffi::ControllerNumber::from_raw(player),
            ffi::JoyconSide::from_raw(side),
            ffi::SixAxisMotion::from_raw(motion),
        ) {
            hid.set_sixaxis(player, side, motion, value);
        }
    })
}

unsafe extern "C" fn joypad_connect(ctx: *mut c_void, player: u8) {
    with_hid(ctx, (), |hid| {
        if let Some(player) = ffi::ControllerNumber::from_raw(player) {
            hid.connect(player, true);
        }
    })
}

unsafe extern "C" fn joypad_disconnect(ctx: *mut c_void, player: u8) {
    with_hid(ctx, (), |hid| {
        if let Some(player) = ffi::ControllerNumber::from_raw(player) {
            hid.connect(player, false);
        }
    })
}

unsafe extern "C" fn joypad_addjoypad(ctx: *mut c_void, kind: u8) {
    with_hid(ctx, (), |hid| {
        if let Some(kind) = ffi::ControllerType::from_raw(kind) {
            hid.add_controller(kind);
        }
    })
}

unsafe extern "C" fn joypad_removealljoypads(ctx: *mut c_void) {
    with_hid(ctx, (), |hid| hid.disconnect_all())
}

unsafe extern "C" fn joypad_setjoypadtype(ctx: *mut c_void, player: u8, kind: u8) {
    with_hid(ctx, (), |hid| {
        if let (Some(player), Some(kind)) =
            (ffi::ControllerNumber::from_raw(player), ffi::ControllerType::from_raw(kind))
        {
            hid.set_controller_type(player, kind);
        }
    })
}

unsafe extern "C" fn joypad_getjoypadtype(ctx: *mut c_void, player: u8) -> u8 {
    with_hid(ctx, 0, |hid| {
        ffi::ControllerNumber::from_raw(player)
            .map(|player| hid.controller_type(player) as u8)
            .unwrap_or(0)
    })
}

unsafe extern "C" fn joypad_getnumjoypads(ctx: *mut c_void) -> u8 {
    with_hid(ctx, 0, |hid| hid.connected_count())
}

unsafe extern "C" fn joypad_sethandheldmode(ctx: *mut c_void, enable: u8) {
    with_hid(ctx, (), |hid| hid.set_handheld_mode(enable != 0))
}

unsafe extern "C" fn input_requeststateupdate(ctx: *mut c_void) {
    with_hid(ctx, (), |hid| hid.request_state_update())
}

unsafe extern "C" fn input_iskeypressed(ctx: *mut c_void, key: u8) -> u8 {
    with_hid(ctx, 0, |hid| hid.key_pressed(key) as u8)
}

unsafe extern "C" fn input_setkeypressed(ctx: *mut c_void, key: u8, pressed: u8) {
    with_hid(ctx, (), |hid| hid.set_key_pressed(key, pressed != 0))
}

unsafe extern "C" fn input_iskeymodifierpressed(ctx: *mut c_void, modifier: u8) -> u8 {
    with_hid(ctx, 0, |hid| {
        ffi::KeyboardModifier::from_raw(modifier)
            .map(|modifier| hid.modifier_pressed(modifier) as u8)
            .unwrap_or(0)
    })
}

unsafe extern "C" fn input_setkeymodifierpressed(ctx: *mut c_void, modifier: u8, pressed: u8) {
    with_hid(ctx, (), |hid| {
        if let Some(modifier) = ffi::KeyboardModifier::from_raw(modifier) {
            hid.set_modifier_pressed(modifier, pressed != 0);
        }
    })
}

unsafe extern "C" fn input_readkeyboardraw(ctx: *mut c_void, out: *mut ffi::KeyboardRaw) -> u8 {
    with_hid(ctx, 0, |hid| {
        if out.is_null() {
            return 0;
        }
        *out = hid.keyboard_raw();
        1
    })
}

unsafe extern "C" fn input_writekeyboardraw(ctx: *mut c_void, raw: *const ffi::KeyboardRaw) -> u8 {
    with_hid(ctx, 0, |hid| {
        match raw.as_ref() {
            Some(raw) => {
                hid.write_keyboard_raw(raw);
                1
            }
            None => 0,
        }
    })
}

unsafe extern "C" fn input_ismousepressed(ctx: *mut c_void, button: i32) -> u8 {
    with_hid(ctx, 0, |hid| {
        ffi::MouseButton::from_raw(button)
            .map(|button| hid.mouse_pressed(button) as u8)
            .unwrap_or(0)
    })
}

unsafe extern "C" fn input_setmousepressed(ctx: *mut c_void, button: i32, pressed: u8) {
    with_hid(ctx, (), |hid| {
        if let Some(button) = ffi::MouseButton::from_raw(button) {
            hid.set_mouse_pressed(button, pressed != 0);
        }
    })
}

unsafe extern "C" fn input_getmouseposition(ctx: *mut c_void, x: *mut i32, y: *mut i32) -> u8 {
    with_hid(ctx, 0, |hid| {
        if x.is_null() || y.is_null() {
            return 0;
        }
        let state = hid.mouse_state();
        *x = state.x;
        *y = state.y;
        1
    })
}

unsafe extern "C" fn input_setmouseposition(ctx: *mut c_void, x: i32, y: i32) {
    with_hid(ctx, (), |hid| {
        let mut state = hid.mouse_state();
        state.delta_x = x - state.x;
        state.delta_y = y - state.y;
        state.x = x;
        state.y = y;
        hid.write_mouse_state(&state);
    })
}

unsafe extern "C" fn input_readmouseraw(ctx: *mut c_void, out: *mut ffi::MouseState) -> u8 {
    with_hid(ctx, 0, |hid| {
        if out.is_null() {
            return 0;
        }
        *out = hid.mouse_state();
        1
    })
}

unsafe extern "C" fn input_writemouseraw(ctx: *mut c_void, state: *const ffi::MouseState) -> u8 {
    with_hid(ctx, 0, |hid| {
        match state.as_ref() {
            Some(state) => {
                hid.write_mouse_state(state);
                1
            }
            None => 0,
        }
    })
}

unsafe extern "C" fn input_getnumtouches(ctx: *mut c_void) -> u8 {
    with_hid(ctx, 0, |hid| hid.touch_count())
}

unsafe extern "C" fn input_setnumtouches(ctx: *mut c_void, count: u8) {
    with_hid(ctx, (), |hid| hid.set_touch_count(count))
}

unsafe extern "C" fn input_readtouch(ctx: *mut c_void, slot: u8, field: u8) -> i32 {
    with_hid(ctx, 0, |hid| {
        ffi::TouchField::from_raw(field)
            .map(|field| hid.touch_field(slot, field))
            .unwrap_or(0)
    })
}

unsafe extern "C" fn input_writetouch(ctx: *mut c_void, slot: u8, field: u8, value: i32) {
    with_hid(ctx, (), |hid| {
        if let Some(field) = ffi::TouchField::from_raw(field) {
            hid.set_touch_field(slot, field, value);
        }
    })
}

unsafe extern "C" fn input_enableoutsideinput(ctx: *mut c_void, mask: u16) {
    with_hid(ctx, (), |hid| hid.enable_outside_input(ffi::EnableInput(mask)))
}

// --- overlay -----------------------------------------------------------

unsafe extern "C" fn gui_getwidth(ctx: *mut c_void) -> u32 {
    with_record(ctx, 0, |record| match record.manager.upgrade() {
        Some(shared) => {
            let mut overlay = shared.overlay.lock().unwrap();
            overlay.refresh(record.system.is_docked());
            overlay.width()
        }
        None => 0,
    })
}

unsafe extern "C" fn gui_getheight(ctx: *mut c_void) -> u32 {
    with_record(ctx, 0, |record| match record.manager.upgrade() {
        Some(shared) => {
            let mut overlay = shared.overlay.lock().unwrap();
            overlay.refresh(record.system.is_docked());
            overlay.height()
        }
        None => 0,
    })
}

unsafe extern "C" fn gui_clearscreen(ctx: *mut c_void) {
    with_overlay(ctx, (), |_, _, overlay| overlay.clear());
}

unsafe extern "C" fn gui_drawpixel(
    ctx: *mut c_void,
    x: i32,
    y: i32,
    alpha: u8,
    red: u8,
    green: u8,
    blue: u8,
) {
    with_overlay(ctx, (), |_, _, overlay| overlay.draw_pixel(x, y, alpha, red, green, blue));
}

unsafe extern "C" fn gui_render(ctx: *mut c_void) {
    with_overlay(ctx, (), |_, shared, overlay| {
        let callbacks = shared.callbacks.lock().unwrap();
        if let Some(render) = callbacks.render.as_ref() {
            render(overlay.pixmap());
        }
    });
}

unsafe extern "C" fn gui_savescreenshotas(ctx: *mut c_void, path: *const c_char) -> u8 {
    with_record(ctx, 0, |record| {
        let Some(path) = borrow_c_str(path) else {
            return 0;
        };
        let Some(shared) = record.manager.upgrade() else {
            return 0;
        };
        let frame = {
            let callbacks = shared.callbacks.lock().unwrap();
            callbacks.screenshot.as_ref().and_then(|producer| producer())
        };
        match frame {
            Some(frame) => save_frame(&frame, &PathBuf::from(path)) as u8,
            None => {
                warn!("Screenshot requested by '{}' but no producer is bound", record.name);
                0
            }
        }
    })
}

unsafe extern "C" fn gui_drawimage(
    ctx: *mut c_void,
    dx: i32,
    dy: i32,
    path: *const c_char,
    sx: i32,
    sy: i32,
    sw: i32,
    sh: i32,
    alpha_mul: f32,
) {
    with_overlay(ctx, (), |record, _, overlay| {
        let Some(path) = borrow_c_str(path) else {
            return;
        };
        if let Err(e) =
            overlay.draw_image_file(dx, dy, &PathBuf::from(path), sx, sy, sw, sh, alpha_mul)
        {
            error!("Plugin '{}' draw_image failed: {}", record.name, e);
        }
    });
}

unsafe extern "C" fn gui_popup(
    ctx: *mut c_void,
    message: *const c_char,
    kind: *const c_char,
    icon: *const c_char,
) {
    with_record(ctx, (), |record| {
        let message = borrow_c_str(message).unwrap_or("");
        let kind = ffi::PopupKind::from_type_str(borrow_c_str(kind).unwrap_or(""));
        let icon = borrow_c_str(icon).unwrap_or("");
        let Some(shared) = record.manager.upgrade() else {
            return;
        };
        let callbacks = shared.callbacks.lock().unwrap();
        match callbacks.popup.as_ref() {
            Some(popup) => popup(message, icon, kind),
            None => match kind {
                ffi::PopupKind::Critical => error!(target: &record.name, "{}", message),
                ffi::PopupKind::Warning => warn!(target: &record.name, "{}", message),
                _ => info!(target: &record.name, "{}", message),
            },
        }
    })
}

unsafe extern "C" fn gui_savescreenshotmemory(
    ctx: *mut c_void,
    size: *mut u64,
    format: *const c_char,
) -> *mut u8 {
    with_record(ctx, std::ptr::null_mut(), |record| {
        if size.is_null() {
            return std::ptr::null_mut();
        }
        *size = 0;
        let Some(shared) = record.manager.upgrade() else {
            return std::ptr::null_mut();
        };
        let frame = {
            let callbacks = shared.callbacks.lock().unwrap();
            callbacks.screenshot.as_ref().and_then(|producer| producer())
        };
        let Some(frame) = frame else {
            return std::ptr::null_mut();
        };
        let bytes = match borrow_c_str(format) {
            Some(fmt) if !fmt.is_empty() => match encode_frame(&frame, fmt) {
                Some(encoded) => encoded,
                None => return std::ptr::null_mut(),
            },
            _ => frame.data,
        };
        let buf = alloc_bytes(&bytes);
        if !buf.is_null() {
            *size = bytes.len() as u64;
        }
        buf
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use std::sync::Arc;

    use super::*;
    use crate::overlay::RawFrame;
    use crate::system::mock::{MockSystem, MOCK_MEMORY_BASE};

    unsafe extern "C" fn loop_noop() {}

    fn test_record(system: Arc<MockSystem>) -> (Arc<ManagerShared>, Arc<PluginRecord>) {
        let shared = ManagerShared::new(system.clone());
        let record = PluginRecord::new(
            "/tmp/plugin_bindings_test.so".into(),
            "plugin_bindings_test".to_string(),
            None,
            loop_noop,
            None,
            system,
            Arc::downgrade(&shared),
        );
        (shared, record)
    }

    fn bind_hid(record: &Arc<PluginRecord>) {
        *record.hid.lock().unwrap() = record.system.hid();
    }

    #[test]
    fn test_guest_not_ready_sentinels() {
        let system = Arc::new(MockSystem::new());
        let (_shared, record) = test_record(system);
        let ctx = record.context_ptr();

        unsafe {
            // Queries issued from `start` before any game boots.
            assert_eq!(emu_emulating(ctx), 0);
            assert_eq!(emu_getheapstart(ctx), 0);
            assert_eq!(emu_getmainsize(ctx), 0);
            assert_eq!(emu_getprogramid(ctx), 0);
            assert!(emu_romname(ctx).is_null());

            // HID reads with no facade bound yet.
            assert_eq!(joypad_read(ctx, 0), 0);
            assert_eq!(input_iskeypressed(ctx, 4), 0);
            assert_eq!(input_getnumtouches(ctx), 0);

            let mut buf = [0u8; 4];
            assert_eq!(memory_readbyterange(ctx, MOCK_MEMORY_BASE, buf.as_mut_ptr(), 4), 0);
        }
    }

    #[test]
    fn test_memory_range_and_identity_after_boot() {
        let system = Arc::new(MockSystem::new());
        system.power_on("Test Title", 0x0100_0000_0000_cafe);
        let (_shared, record) = test_record(system);
        let ctx = record.context_ptr();

        unsafe {
            assert_eq!(emu_emulating(ctx), 1);
            assert_eq!(emu_getprogramid(ctx), 0x0100_0000_0000_cafe);
            assert_ne!(emu_getheapstart(ctx), 0);

            let data = [7u8, 8, 9];
            assert_eq!(memory_writebyterange(ctx, MOCK_MEMORY_BASE, data.as_ptr(), 3), 1);
            let mut buf = [0u8; 3];
            assert_eq!(memory_readbyterange(ctx, MOCK_MEMORY_BASE, buf.as_mut_ptr(), 3), 1);
            assert_eq!(buf, data);

            // An out-of-range write fails without a partial write.
            assert_eq!(memory_writebyterange(ctx, u64::MAX - 1, data.as_ptr(), 3), 0);
        }
    }

    #[test]
    fn test_romname_is_host_allocated_and_freeable() {
        let system = Arc::new(MockSystem::new());
        system.power_on("Garden Story", 1);
        let (_shared, record) = test_record(system);
        let ctx = record.context_ptr();

        unsafe {
            let name = emu_romname(ctx);
            assert!(!name.is_null());
            assert_eq!(CStr::from_ptr(name).to_str().unwrap(), "Garden Story");
            meta_free(name as *mut std::os::raw::c_void);

            // Free of null is a no-op.
            meta_free(std::ptr::null_mut());
        }
    }

    #[test]
    fn test_hid_entries_reach_the_facade() {
        let system = Arc::new(MockSystem::new());
        system.power_on("Test", 1);
        let (_shared, record) = test_record(system.clone());
        bind_hid(&record);
        let ctx = record.context_ptr();
        let hid = system.mock_hid().unwrap();

        unsafe {
            joypad_setjoystick(ctx, 0, 0, 4096);
            assert_eq!(joypad_readjoystick(ctx, 0, 0), 4096);
            // Invalid axis selector reads the sentinel.
            assert_eq!(joypad_readjoystick(ctx, 0, 200), 0);

            input_setkeypressed(ctx, 4, 1);
            assert_eq!(input_iskeypressed(ctx, 4), 1);

            input_enableoutsideinput(ctx, ffi::EnableInput::TOUCHPAD.0);
            assert_eq!(hid.outside_mask(), ffi::EnableInput::TOUCHPAD);

            input_requeststateupdate(ctx);
            assert_eq!(hid.update_requests(), 1);

            let mut raw = ffi::KeyboardRaw::default();
            assert_eq!(input_readkeyboardraw(ctx, &mut raw), 1);
            assert_ne!(raw.keys[0], 0);
        }
    }

    #[test]
    fn test_overlay_draw_refused_while_guest_off() {
        let system = Arc::new(MockSystem::new());
        let (shared, record) = test_record(system.clone());
        let ctx = record.context_ptr();

        unsafe {
            gui_drawpixel(ctx, 5, 5, 255, 255, 0, 0);
        }
        assert!(shared
            .overlay
            .lock()
            .unwrap()
            .pixmap()
            .pixels()
            .iter()
            .all(|px| px.alpha() == 0));

        system.power_on("Test", 1);
        unsafe {
            gui_drawpixel(ctx, 5, 5, 255, 255, 0, 0);
        }
        assert!(shared
            .overlay
            .lock()
            .unwrap()
            .pixmap()
            .pixels()
            .iter()
            .any(|px| px.alpha() != 0));
    }

    #[test]
    fn test_screenshot_memory_encodes_and_allocates() {
        let system = Arc::new(MockSystem::new());
        system.power_on("Test", 1);
        let (shared, record) = test_record(system);
        shared.callbacks.lock().unwrap().screenshot = Some(Box::new(|| {
            Some(RawFrame { width: 2, height: 2, data: vec![255; 16] })
        }));
        let ctx = record.context_ptr();

        unsafe {
            // Raw path: no format string.
            let mut size = 0u64;
            let raw = gui_savescreenshotmemory(ctx, &mut size, std::ptr::null());
            assert!(!raw.is_null());
            assert_eq!(size, 16);
            meta_free(raw as *mut std::os::raw::c_void);

            // Encoded path.
            let format = std::ffi::CString::new("png").unwrap();
            let mut size = 0u64;
            let encoded = gui_savescreenshotmemory(ctx, &mut size, format.as_ptr());
            assert!(!encoded.is_null());
            assert!(size > 8);
            let magic = std::slice::from_raw_parts(encoded, 4);
            assert_eq!(magic, &[0x89, b'P', b'N', b'G']);
            meta_free(encoded as *mut std::os::raw::c_void);
        }
    }

    #[test]
    fn test_render_invokes_present_callback() {
        let system = Arc::new(MockSystem::new());
        let (shared, record) = test_record(system.clone());
        let rendered = Arc::new(std::sync::atomic::AtomicU32::new(0));
        {
            let rendered = Arc::clone(&rendered);
            shared.callbacks.lock().unwrap().render = Some(Box::new(move |_pixmap| {
                rendered.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }));
        }
        let ctx = record.context_ptr();

        // Refused while powered off.
        unsafe { gui_render(ctx) };
        assert_eq!(rendered.load(std::sync::atomic::Ordering::SeqCst), 0);

        system.power_on("Test", 1);
        unsafe { gui_render(ctx) };
        assert_eq!(rendered.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
