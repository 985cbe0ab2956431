//! The foreground dashboard loop.
//!
//! Owns the [`ViewState`], the [`Renderer`] and the display surface. Snapshot
//! publishes and key presses are handled one at a time on this task, so a
//! page command never observes a half-applied publish.

use std::io;

use crossterm::event::{Event, KeyEvent};
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::RenderError;
use crate::input::{dispatch, Action};
use crate::model::Snapshot;
use crate::render::Renderer;
use crate::shutdown::{ShutdownCoordinator, StopReason};
use crate::surface::DisplaySurface;
use crate::view::ViewState;

pub struct Dashboard<S> {
    view: ViewState,
    renderer: Renderer,
    surface: S,
}

impl<S: DisplaySurface> Dashboard<S> {
    pub fn new(surface: S, page_size: usize) -> Self {
        Self {
            view: ViewState::new(page_size),
            renderer: Renderer::new(),
            surface,
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[cfg(test)]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Publishes a snapshot. Always needs a redraw.
    pub fn handle_snapshot(&mut self, snapshot: Snapshot) -> bool {
        self.view.publish(snapshot);
        true
    }

    /// Routes one key press. Returns whether the frame changed.
    pub fn handle_key(&mut self, key: &KeyEvent, shutdown: &ShutdownCoordinator) -> bool {
        match dispatch(key) {
            Action::Page(command) => self.view.apply(command),
            Action::Quit => {
                shutdown.stop(StopReason::Quit);
                false
            }
            Action::Ignore => false,
        }
    }

    /// Draws the current view. A render error halts the renderer and starts
    /// shutdown before it is returned.
    pub fn redraw(&mut self, shutdown: &ShutdownCoordinator) -> Result<(), RenderError> {
        match self.renderer.draw(&self.view, &mut self.surface) {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Render failed: {}", e);
                self.renderer.halt();
                shutdown.stop(StopReason::RenderFailure);
                Err(e)
            }
        }
    }

    /// Runs until shutdown leaves `Running`. Bursts of queued snapshots are
    /// coalesced into one redraw.
    pub async fn run<E>(
        &mut self,
        mut snapshots: mpsc::Receiver<Snapshot>,
        mut events: E,
        shutdown: &ShutdownCoordinator,
    ) -> Result<(), RenderError>
    where
        E: Stream<Item = io::Result<Event>> + Unpin,
    {
        let mut phase = shutdown.subscribe();
        let mut sampler_open = true;

        self.redraw(shutdown)?;

        loop {
            let mut dirty = false;

            tokio::select! {
                biased;
                _ = phase.wait_for(|p| !p.is_running()) => break,
                snapshot = snapshots.recv(), if sampler_open => match snapshot {
                    Some(snapshot) => {
                        dirty |= self.handle_snapshot(snapshot);
                        while let Ok(next) = snapshots.try_recv() {
                            dirty |= self.handle_snapshot(next);
                        }
                    }
                    None => {
                        warn!("Sampler channel closed, display will no longer update");
                        sampler_open = false;
                    }
                },
                event = events.next() => match event {
                    Some(Ok(Event::Key(key))) => dirty |= self.handle_key(&key, shutdown),
                    Some(Ok(Event::Resize(width, height))) => {
                        debug!("Terminal resized to {}x{}", width, height);
                        dirty = true;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Failed to read input: {}", e);
                        shutdown.stop(StopReason::InputClosed);
                    }
                    None => {
                        shutdown.stop(StopReason::InputClosed);
                    }
                },
            }

            if dirty && shutdown.is_running() {
                self.redraw(shutdown)?;
            }
        }

        debug!("Dashboard loop exited at tick {}", self.view.tick());
        Ok(())
    }

    /// Releases the display surface.
    pub fn release(&mut self) -> Result<(), RenderError> {
        self.surface.stop()
    }
}
