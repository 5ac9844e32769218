//! Display configuration.
//!
//! A plain value built with `Default` plus `with_*` builders. Nothing here is
//! read from disk.

use std::time::Duration;

/// Default double-hit window.
pub const DEFAULT_DOUBLE_HIT_TIMEOUT: Duration = Duration::from_millis(500);

/// A responsive size bucket: active while the viewport is at least
/// `min_width` wide.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    pub name: String,
    pub min_width: f32,
}

impl Breakpoint {
    pub fn new(name: impl Into<String>, min_width: f32) -> Self {
        Self {
            name: name.into(),
            min_width,
        }
    }
}

/// Configuration for a [`Display`](crate::Display).
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Initial viewport width.
    pub width: f32,
    /// Initial viewport height.
    pub height: f32,
    /// Breakpoints, any order. The widest one not exceeding the viewport
    /// width names the viewport.
    pub breakpoints: Vec<Breakpoint>,
    /// Two hits on the same target within this window make a double hit.
    pub double_hit_timeout: Duration,
    /// Whether Tab wraps around at the root.
    pub tabs_loop: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
            breakpoints: vec![
                Breakpoint::new("xs", 0.0),
                Breakpoint::new("sm", 576.0),
                Breakpoint::new("md", 768.0),
                Breakpoint::new("lg", 992.0),
                Breakpoint::new("xl", 1200.0),
            ],
            double_hit_timeout: DEFAULT_DOUBLE_HIT_TIMEOUT,
            tabs_loop: true,
        }
    }
}

impl DisplayConfig {
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self
    }

    pub fn with_breakpoints(mut self, breakpoints: Vec<Breakpoint>) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    pub fn with_double_hit_timeout(mut self, timeout: Duration) -> Self {
        self.double_hit_timeout = timeout;
        self
    }

    pub fn with_tabs_loop(mut self, tabs_loop: bool) -> Self {
        self.tabs_loop = tabs_loop;
        self
    }

    /// Name of the breakpoint active at `width`.
    ///
    /// Falls back to the narrowest breakpoint when the viewport is narrower
    /// than all of them, and to an empty name when none are configured.
    pub fn breakpoint_for(&self, width: f32) -> &str {
        let active = self
            .breakpoints
            .iter()
            .filter(|bp| bp.min_width <= width)
            .max_by(|a, b| a.min_width.total_cmp(&b.min_width));

        active
            .or_else(|| {
                self.breakpoints
                    .iter()
                    .min_by(|a, b| a.min_width.total_cmp(&b.min_width))
            })
            .map(|bp| bp.name.as_str())
            .unwrap_or("")
    }
}
