//! Test command implementation.
//!
//! Samples a few ticks without a terminal and prints each rendered frame as
//! plain text.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::RenderError;
use crate::pagination::PageCommand;
use crate::provider::MetricsProvider;
use crate::render::Renderer;
use crate::sampler::{Sampler, TICK_INTERVAL};
use crate::surface::TextSurface;
use crate::view::ViewState;

const FRAME_WIDTH: u16 = 120;
const FRAME_HEIGHT: u16 = 40;

/// Renders `iterations` ticks, `interval` apart. With `all_pages` every page
/// of each tick is rendered, otherwise only the first.
pub fn render_ticks<P: MetricsProvider>(
    sampler: &mut Sampler<P>,
    page_size: usize,
    iterations: usize,
    all_pages: bool,
    interval: Duration,
) -> Result<Vec<String>, RenderError> {
    let renderer = Renderer::new();
    let mut surface = TextSurface::new(FRAME_WIDTH, FRAME_HEIGHT);
    let mut view = ViewState::new(page_size);

    for iteration in 0..iterations {
        if iteration > 0 {
            thread::sleep(interval);
        }
        view.publish(sampler.sample());
        renderer.draw(&view, &mut surface)?;

        if all_pages {
            while view.apply(PageCommand::Next) {
                renderer.draw(&view, &mut surface)?;
            }
            // wrap back so the next tick starts on the first page
            while view.apply(PageCommand::Prev) {}
        }
    }

    Ok(surface.take_frames())
}

/// Tests metrics collection
pub fn command_test<P: MetricsProvider>(
    sampler: &mut Sampler<P>,
    page_size: usize,
    iterations: usize,
    verbose: bool,
) -> Result<()> {
    println!("🧪 procdash - Test Mode");
    println!("=======================");

    let frames = render_ticks(sampler, page_size, iterations, verbose, TICK_INTERVAL)
        .context("Failed to render test frames")?;

    for (index, frame) in frames.iter().enumerate() {
        println!("\n🔄 Frame {}/{}:", index + 1, frames.len());
        println!("{}", frame);
    }

    println!("\n✅ Test completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::ScriptedProvider;
    use crate::sampler::ProcessOrder;
    use std::path::PathBuf;

    fn sampler(processes: u32) -> Sampler<ScriptedProvider> {
        Sampler::new(
            ScriptedProvider::healthy(processes),
            PathBuf::from("/"),
            ProcessOrder::Pid,
        )
    }

    #[test]
    fn test_one_frame_per_tick() {
        let frames = render_ticks(&mut sampler(25), 10, 3, false, Duration::ZERO).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames
            .iter()
            .all(|f| f.contains("Page 1/3 | 25 Processes Total")));
    }

    #[test]
    fn test_verbose_renders_every_page() {
        let frames = render_ticks(&mut sampler(25), 10, 2, true, Duration::ZERO).unwrap();
        assert_eq!(frames.len(), 6);
        assert!(frames[2].contains("Page 3/3"));
        assert!(frames[3].contains("Page 1/3"));
    }

    #[test]
    fn test_frames_show_panel_and_table() {
        let frames = render_ticks(&mut sampler(2), 10, 1, false, Duration::ZERO).unwrap();
        let frame = &frames[0];
        assert!(frame.contains("Core 1: 50.00%"));
        assert!(frame.contains("Memory Usage: 25.00%"));
        assert!(frame.contains("Total: 8192 MB"));
        assert!(frame.contains("Disk Usage: 40.00%"));
        assert!(frame.contains("proc-2"));
    }
}
