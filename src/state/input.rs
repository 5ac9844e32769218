//! Input Module - Event conversion and routing
//!
//! Bridges crossterm's event system with pointer and keyboard dispatch.
//! Raw events carry no timestamps, so the caller supplies one for the
//! double-hit window.
//!
//! # API
//!
//! - `convert_event` - Convert any crossterm event
//! - `convert_mouse_event` - Mouse event to `PointerEvent` (scroll is dropped)
//! - `convert_key_event` - Key event to `KeyboardEvent`
//! - `poll_event` / `read_event` - Read from the terminal
//! - `Display::route_event` - Dispatch a converted event
//!
//! # Example
//!
//! ```ignore
//! use spark_controls::state::input::poll_event;
//! use std::time::{Duration, Instant};
//!
//! let clock = Instant::now();
//! loop {
//!     if let Ok(Some(event)) = poll_event(Duration::from_millis(16), clock) {
//!         display.route_event(event);
//!     }
//!     while display.frame_pending() {
//!         display.frame();
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use crossterm::event::{
    poll, read, Event as CrosstermEvent, KeyCode, KeyEvent as CrosstermKeyEvent, KeyEventKind,
    KeyModifiers, MouseButton as CrosstermMouseButton, MouseEvent as CrosstermMouseEvent,
    MouseEventKind,
};

use super::keyboard::{KeyState, KeyboardEvent, Modifiers};
use super::mouse::{PointerAction, PointerButton, PointerEvent};
use crate::display::Display;
use crate::host::Host;

// =============================================================================
// INPUT EVENT ENUM
// =============================================================================

/// Unified input event
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyboardEvent),
    /// Viewport resize (new width, height)
    Resize { width: f32, height: f32 },
    /// Unhandled event type
    None,
}

/// Convert a crossterm event stamped with `timestamp`.
pub fn convert_event(event: CrosstermEvent, timestamp: Duration) -> InputEvent {
    match event {
        CrosstermEvent::Mouse(mouse) => convert_mouse_event(mouse)
            .map(|pointer| InputEvent::Pointer(pointer.at(timestamp)))
            .unwrap_or(InputEvent::None),
        CrosstermEvent::Key(key) => InputEvent::Key(convert_key_event(key)),
        CrosstermEvent::Resize(width, height) => InputEvent::Resize {
            width: f32::from(width),
            height: f32::from(height),
        },
        _ => InputEvent::None,
    }
}

// =============================================================================
// MOUSE EVENT CONVERSION
// =============================================================================

/// Convert a crossterm mouse event. Scroll events have no pointer
/// counterpart and yield `None`; drags become moves.
pub fn convert_mouse_event(event: CrosstermMouseEvent) -> Option<PointerEvent> {
    let (action, button) = match event.kind {
        MouseEventKind::Down(btn) => (PointerAction::Down, convert_mouse_button(btn)),
        MouseEventKind::Up(btn) => (PointerAction::Up, convert_mouse_button(btn)),
        MouseEventKind::Drag(btn) => (PointerAction::Move, convert_mouse_button(btn)),
        MouseEventKind::Moved => (PointerAction::Move, PointerButton::None),
        MouseEventKind::ScrollUp
        | MouseEventKind::ScrollDown
        | MouseEventKind::ScrollLeft
        | MouseEventKind::ScrollRight => return None,
    };

    Some(
        PointerEvent::new(action, button, f32::from(event.column), f32::from(event.row))
            .with_modifiers(convert_modifiers(event.modifiers)),
    )
}

fn convert_mouse_button(btn: CrosstermMouseButton) -> PointerButton {
    match btn {
        CrosstermMouseButton::Left => PointerButton::Left,
        CrosstermMouseButton::Right => PointerButton::Right,
        CrosstermMouseButton::Middle => PointerButton::Middle,
    }
}

// =============================================================================
// KEY EVENT CONVERSION
// =============================================================================

/// Convert a crossterm key event. `BackTab` becomes `Shift+Tab`.
pub fn convert_key_event(event: CrosstermKeyEvent) -> KeyboardEvent {
    let mut modifiers = convert_modifiers(event.modifiers);
    let key = match event.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => {
            modifiers.shift = true;
            "Tab".to_string()
        }
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Insert => "Insert".to_string(),
        _ => String::new(),
    };

    let state = match event.kind {
        KeyEventKind::Press => KeyState::Press,
        KeyEventKind::Repeat => KeyState::Repeat,
        KeyEventKind::Release => KeyState::Release,
    };

    KeyboardEvent { key, modifiers, state }
}

/// Convert crossterm KeyModifiers to our Modifiers
pub fn convert_modifiers(mods: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: mods.contains(KeyModifiers::CONTROL),
        alt: mods.contains(KeyModifiers::ALT),
        shift: mods.contains(KeyModifiers::SHIFT),
        meta: mods.intersects(KeyModifiers::META | KeyModifiers::SUPER),
    }
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout, stamped relative to `clock`.
/// Returns None if no event arrived in time.
pub fn poll_event(timeout: Duration, clock: Instant) -> std::io::Result<Option<InputEvent>> {
    if poll(timeout)? {
        Ok(Some(read_event(clock)?))
    } else {
        Ok(None)
    }
}

/// Read the next event (blocking), stamped relative to `clock`.
pub fn read_event(clock: Instant) -> std::io::Result<InputEvent> {
    let event = read()?;
    Ok(convert_event(event, clock.elapsed()))
}

// =============================================================================
// EVENT ROUTING
// =============================================================================

impl<H: Host> Display<H> {
    /// Route an input event. Returns true if it was handled.
    pub fn route_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Pointer(pointer) => self.dispatch_pointer(pointer),
            InputEvent::Key(key) => self.dispatch_key(key),
            InputEvent::Resize { width, height } => {
                self.resize(width, height);
                true
            }
            InputEvent::None => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
