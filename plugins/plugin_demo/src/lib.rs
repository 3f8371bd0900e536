/*
 *  Switchboard demo plugin
 *
 *  Exercises the plugin-facing contract: exports the interface version,
 *  start/on_main_loop/on_close, and a handful of host API pointer slots.
 *  Draws a dot marching across the overlay and paces itself with
 *  frame-advance.
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 */

//! Build as a cdylib and copy the artifact into the host's plugins
//! directory under a `plugin_` basename, e.g.:
//!
//! ```text
//! cp target/release/libplugin_demo.so ~/.local/share/switchboard/plugins/plugin_demo.so
//! ```
//!
//! The types below are the plugin-side copy of the host's C ABI; they
//! must match the host exactly.

use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::sync::atomic::{AtomicPtr, Ordering};

/// Must equal the host's constant or the plugin is refused.
const PLUGIN_INTERFACE_VERSION: u64 = 1;

const LOG_LEVEL_INFO: u8 = 2;

type EmuFrameAdvanceFn = unsafe extern "C" fn(ctx: *mut c_void);
type EmuFrameCountFn = unsafe extern "C" fn(ctx: *mut c_void) -> u64;
type EmuLogFn = unsafe extern "C" fn(ctx: *mut c_void, message: *const c_char, level: u8);
type GuiDimensionFn = unsafe extern "C" fn(ctx: *mut c_void) -> u32;
type GuiPlainFn = unsafe extern "C" fn(ctx: *mut c_void);
type GuiDrawPixelFn =
    unsafe extern "C" fn(ctx: *mut c_void, x: i32, y: i32, alpha: u8, red: u8, green: u8, blue: u8);

// Pointer slots the host fills at load. Slots the host leaves alone stay
// None and the plugin degrades gracefully.
#[no_mangle]
pub static mut yuzu_emu_frameadvance: Option<EmuFrameAdvanceFn> = None;
#[no_mangle]
pub static mut yuzu_emu_framecount: Option<EmuFrameCountFn> = None;
#[no_mangle]
pub static mut yuzu_emu_log: Option<EmuLogFn> = None;
#[no_mangle]
pub static mut yuzu_gui_getwidth: Option<GuiDimensionFn> = None;
#[no_mangle]
pub static mut yuzu_gui_getheight: Option<GuiDimensionFn> = None;
#[no_mangle]
pub static mut yuzu_gui_clearscreen: Option<GuiPlainFn> = None;
#[no_mangle]
pub static mut yuzu_gui_drawpixel: Option<GuiDrawPixelFn> = None;
#[no_mangle]
pub static mut yuzu_gui_render: Option<GuiPlainFn> = None;

static CONTEXT: AtomicPtr<c_void> = AtomicPtr::new(std::ptr::null_mut());

fn context() -> *mut c_void {
    CONTEXT.load(Ordering::Acquire)
}

fn log_info(message: &str) {
    let Some(log) = (unsafe { yuzu_emu_log }) else {
        return;
    };
    let Ok(message) = CString::new(message) else {
        return;
    };
    unsafe { log(context(), message.as_ptr(), LOG_LEVEL_INFO) };
}

#[no_mangle]
pub extern "C" fn get_plugin_interface_version() -> u64 {
    PLUGIN_INTERFACE_VERSION
}

#[no_mangle]
pub extern "C" fn start(ctx: *mut c_void) {
    CONTEXT.store(ctx, Ordering::Release);
    log_info("demo plugin started");
}

#[no_mangle]
pub extern "C" fn on_main_loop() {
    let ctx = context();
    let frame = unsafe { yuzu_emu_framecount }
        .map(|framecount| unsafe { framecount(ctx) })
        .unwrap_or(0);

    let slots = unsafe {
        (
            yuzu_gui_getwidth,
            yuzu_gui_getheight,
            yuzu_gui_clearscreen,
            yuzu_gui_drawpixel,
            yuzu_gui_render,
        )
    };
    if let (Some(width), Some(height), Some(clear), Some(draw), Some(render)) = slots {
        unsafe {
            let w = width(ctx);
            let h = height(ctx);
            if w != 0 && h != 0 {
                clear(ctx);
                let x = (frame % w as u64) as i32;
                draw(ctx, x, h as i32 / 2, 0xFF, 0x00, 0xFF, 0x7F);
                render(ctx);
            }
        }
    }

    // Yield until the emulator presents the next frame.
    if let Some(advance) = unsafe { yuzu_emu_frameadvance } {
        unsafe { advance(ctx) };
    }
}

#[no_mangle]
pub extern "C" fn on_close() {
    log_info("demo plugin closing");
}
