//! The render/compositing loop.
//!
//! Runs independently of the input loop at a fixed rate, keeps the magnified
//! source region consistent with the current magnification and moves it
//! while a pan gesture is in progress.

use crate::renderer::{Status, StatusBar};
use crate::zoom::ZoomRender;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_FPS: u32 = 25;

/// One compositing step.
pub trait Compositor: Send {
    fn tick(&mut self, zoom: &ZoomRender) -> Result<()>;
}

/// Source region of `desktop / magnification`, centred on the pointer while
/// panning and always kept inside the desktop.
#[derive(Debug, Default)]
pub struct FollowCompositor;

impl Compositor for FollowCompositor {
    fn tick(&mut self, zoom: &ZoomRender) -> Result<()> {
        let (desktop_w, desktop_h) = zoom.desktop_size();
        let mag = zoom.magnification().max(1);
        let source_w = (desktop_w / mag).max(1);
        let source_h = (desktop_h / mag).max(1);

        let (mut grab_x, mut grab_y) = zoom.grab();
        if zoom.pan() {
            let (px, py) = zoom.pointer();
            grab_x = px - (source_w / 2) as i32;
            grab_y = py - (source_h / 2) as i32;
        }
        let grab_x = grab_x.clamp(0, (desktop_w - source_w) as i32);
        let grab_y = grab_y.clamp(0, (desktop_h - source_h) as i32);

        zoom.set_source_size(source_w, source_h);
        zoom.set_grab(grab_x, grab_y);
        Ok(())
    }
}

/// Owns the compositor and drives it from a tokio interval.
pub struct Magnifier<C> {
    compositor: C,
    zoom: ZoomRender,
    period: Duration,
    status: Option<StatusBar>,
}

impl<C: Compositor + 'static> Magnifier<C> {
    pub fn new(compositor: C, zoom: ZoomRender, fps: u32) -> Self {
        Self {
            compositor,
            zoom,
            period: Duration::from_secs(1) / fps.max(1),
            status: None,
        }
    }

    pub fn with_status_bar(mut self, bar: StatusBar) -> Self {
        self.status = Some(bar);
        self
    }

    /// Start the loop. It stops once `shutdown` turns true or its sender is
    /// dropped; awaiting the handle is the acknowledgement.
    pub fn spawn(
        self,
        shutdown: watch::Receiver<bool>,
        notice: watch::Receiver<String>,
    ) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(shutdown, notice))
    }

    async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
        notice: watch::Receiver<String>,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::debug!("render loop started, period {:?}", self.period);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.compositor.tick(&self.zoom)?;
                    if let Some(bar) = self.status.as_mut() {
                        let status = Status {
                            magnification: self.zoom.magnification(),
                            panning: self.zoom.pan(),
                            grab: self.zoom.grab(),
                            notice: notice.borrow().clone(),
                        };
                        bar.draw(&status)?;
                    }
                }
            }
        }

        log::debug!("render loop stopped");
        Ok(())
    }
}
