//! Zoom state shared between the input loop and the compositor.
//!
//! Every field has exactly one writer. [`ZoomState::split`] hands out one
//! handle per side; neither handle is `Clone`, so the single-writer rule is
//! enforced by ownership:
//!
//! | field                        | writer        | reader        |
//! |------------------------------|---------------|---------------|
//! | magnification, pan, pointer  | [`ZoomInput`] | [`ZoomRender`]|
//! | grab origin, source size     | [`ZoomRender`]| [`ZoomInput`] |
//!
//! Desktop size is fixed at construction.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Shared {
    desktop_width: u32,
    desktop_height: u32,
    // Written by the input side.
    magnification: AtomicU32,
    pan: AtomicBool,
    pointer_x: AtomicI32,
    pointer_y: AtomicI32,
    // Written by the render side.
    grab_x: AtomicI32,
    grab_y: AtomicI32,
    source_width: AtomicU32,
    source_height: AtomicU32,
}

/// Constructor for the shared zoom state.
pub struct ZoomState;

impl ZoomState {
    /// Create the state at magnification 1 with the whole desktop visible.
    pub fn split(desktop_width: u32, desktop_height: u32) -> (ZoomInput, ZoomRender) {
        let shared = Arc::new(Shared {
            desktop_width,
            desktop_height,
            magnification: AtomicU32::new(1),
            pan: AtomicBool::new(false),
            pointer_x: AtomicI32::new(0),
            pointer_y: AtomicI32::new(0),
            grab_x: AtomicI32::new(0),
            grab_y: AtomicI32::new(0),
            source_width: AtomicU32::new(desktop_width),
            source_height: AtomicU32::new(desktop_height),
        });
        (
            ZoomInput {
                shared: shared.clone(),
            },
            ZoomRender { shared },
        )
    }
}

/// Input-loop side: writes magnification, pan flag and pointer target.
#[derive(Debug)]
pub struct ZoomInput {
    shared: Arc<Shared>,
}

impl ZoomInput {
    pub fn desktop_size(&self) -> (u32, u32) {
        (self.shared.desktop_width, self.shared.desktop_height)
    }

    pub fn magnification(&self) -> u32 {
        self.shared.magnification.load(Ordering::Relaxed)
    }

    /// Change magnification by `delta`, never going below 1. Returns the new
    /// value.
    pub fn adjust_magnification(&self, delta: i32) -> u32 {
        let current = self.magnification() as i64;
        let next = (current + i64::from(delta)).clamp(1, i64::from(u32::MAX)) as u32;
        self.shared.magnification.store(next, Ordering::Relaxed);
        next
    }

    pub fn set_pan(&self, active: bool) {
        self.shared.pan.store(active, Ordering::Relaxed);
    }

    /// Record where the desktop pointer was last sent.
    pub fn set_pointer(&self, x: i32, y: i32) {
        self.shared.pointer_x.store(x, Ordering::Relaxed);
        self.shared.pointer_y.store(y, Ordering::Relaxed);
    }

    /// Top-left of the magnified region, as last published by the compositor.
    pub fn grab(&self) -> (i32, i32) {
        (
            self.shared.grab_x.load(Ordering::Relaxed),
            self.shared.grab_y.load(Ordering::Relaxed),
        )
    }

    /// Size in desktop pixels of the magnified region.
    pub fn source_size(&self) -> (u32, u32) {
        (
            self.shared.source_width.load(Ordering::Relaxed),
            self.shared.source_height.load(Ordering::Relaxed),
        )
    }
}

/// Compositor side: writes grab origin and source size.
#[derive(Debug)]
pub struct ZoomRender {
    shared: Arc<Shared>,
}

impl ZoomRender {
    pub fn desktop_size(&self) -> (u32, u32) {
        (self.shared.desktop_width, self.shared.desktop_height)
    }

    pub fn magnification(&self) -> u32 {
        self.shared.magnification.load(Ordering::Relaxed)
    }

    pub fn pan(&self) -> bool {
        self.shared.pan.load(Ordering::Relaxed)
    }

    pub fn pointer(&self) -> (i32, i32) {
        (
            self.shared.pointer_x.load(Ordering::Relaxed),
            self.shared.pointer_y.load(Ordering::Relaxed),
        )
    }

    pub fn grab(&self) -> (i32, i32) {
        (
            self.shared.grab_x.load(Ordering::Relaxed),
            self.shared.grab_y.load(Ordering::Relaxed),
        )
    }

    pub fn set_grab(&self, x: i32, y: i32) {
        self.shared.grab_x.store(x, Ordering::Relaxed);
        self.shared.grab_y.store(y, Ordering::Relaxed);
    }

    pub fn set_source_size(&self, width: u32, height: u32) {
        self.shared.source_width.store(width, Ordering::Relaxed);
        self.shared.source_height.store(height, Ordering::Relaxed);
    }
}
