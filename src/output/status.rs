//! Spinner-driven status line
//!
//! A background task re-renders a single terminal line on a fixed tick,
//! combining a rotating spinner glyph with the latest status text. The
//! status cell is a shared single-slot value with last-write-wins
//! semantics; it only affects the display, never control flow.

use crate::defaults;
use std::io::{self, Write};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;

const SPINNER_GLYPHS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Shared single-slot status cell
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    current: Arc<RwLock<String>>,
}

impl StatusLine {
    /// Create an empty status line
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current status text
    pub fn set<S: Into<String>>(&self, text: S) {
        if let Ok(mut slot) = self.current.write() {
            *slot = text.into();
        }
    }

    /// Read the current status text
    pub fn get(&self) -> String {
        self.current
            .read()
            .map(|slot| slot.clone())
            .unwrap_or_default()
    }
}

/// Rotating spinner glyph source
#[derive(Debug, Default)]
pub struct Spinner {
    index: usize,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the spinner and return the next glyph
    pub fn next_glyph(&mut self) -> char {
        let glyph = SPINNER_GLYPHS[self.index];
        self.index = (self.index + 1) % SPINNER_GLYPHS.len();
        glyph
    }
}

/// Background renderer for the status line
pub struct StatusReporter {
    handle: JoinHandle<()>,
}

impl StatusReporter {
    /// Spawn the render task, re-drawing the line every tick until stopped
    pub fn spawn(status: StatusLine) -> Self {
        let handle = tokio::spawn(async move {
            let mut spinner = Spinner::new();
            let mut ticker = tokio::time::interval(defaults::STATUS_TICK);
            loop {
                ticker.tick().await;
                print!("\x1b[2K {}  {}\r", spinner.next_glyph(), status.get());
                let _ = io::stdout().flush();
            }
        });
        Self { handle }
    }

    /// Stop rendering; the last drawn line is left on screen
    pub fn stop(self) {
        self.handle.abort();
    }

    /// Overwrite the spinner line with a final result line
    pub fn print_result(text: &str) {
        print!("\r\x1b[2K -> {}\n", text);
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_line_set_get() {
        let status = StatusLine::new();
        assert_eq!(status.get(), "");

        status.set("connecting");
        assert_eq!(status.get(), "connecting");

        // Last write wins across clones
        let shared = status.clone();
        shared.set("loading");
        assert_eq!(status.get(), "loading");
    }

    #[test]
    fn test_spinner_cycles_and_wraps() {
        let mut spinner = Spinner::new();
        let first = spinner.next_glyph();
        for _ in 1..SPINNER_GLYPHS.len() {
            spinner.next_glyph();
        }
        // One full revolution returns to the first glyph
        assert_eq!(spinner.next_glyph(), first);
    }

    #[test]
    fn test_spinner_glyphs_distinct() {
        let mut spinner = Spinner::new();
        let a = spinner.next_glyph();
        let b = spinner.next_glyph();
        assert_ne!(a, b);
    }

    #[test]
    fn test_reporter_start_stop() {
        tokio_test::block_on(async {
            let status = StatusLine::new();
            status.set("working");
            let reporter = StatusReporter::spawn(status.clone());

            // Let it render a few frames, then stop; writes from here
            // may interleave with ticks, which is fine
            tokio::time::sleep(Duration::from_millis(250)).await;
            status.set("still working");
            tokio::time::sleep(Duration::from_millis(150)).await;
            reporter.stop();
        });
    }

    #[test]
    fn test_concurrent_writers() {
        let status = StatusLine::new();
        let mut handles = Vec::new();
        for i in 0..8 {
            let shared = status.clone();
            handles.push(std::thread::spawn(move || {
                shared.set(format!("writer {}", i));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        // Whichever write landed last, the cell holds a writer tag
        assert!(status.get().starts_with("writer "));
    }
}
