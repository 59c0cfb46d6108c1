//! Window management system
//!
//! Handles window creation, cursor grab/release for pointer lock, fullscreen
//! toggle and title updates.

use std::sync::Arc;
use botlab_input::{CameraMode, PointerLockError, PointerLockHost};
use botlab_math::Vec3;
use winit::{
    event_loop::ActiveEventLoop,
    window::{CursorGrabMode, Fullscreen, Window},
};
use crate::config::WindowConfig;

/// What the window title shows each frame
#[derive(Debug, Clone, Copy)]
pub struct TitleInfo<'a> {
    pub position: Vec3,
    pub clip: &'a str,
    pub mode: CameraMode,
    pub on_ground: bool,
    /// Show the grounded flag
    pub show_contacts: bool,
}

/// Manages the application window and cursor state
pub struct WindowSystem {
    window: Arc<Window>,
    cursor_captured: bool,
    base_title: String,
    lock_result: Option<Result<(), PointerLockError>>,
}

impl WindowSystem {
    /// Create window from config
    pub fn create(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> Result<Self, WindowError> {
        let mut attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.width,
                config.height,
            ));

        if config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| WindowError::CreationFailed(e.to_string()))?,
        );

        Ok(Self {
            window,
            cursor_captured: false,
            base_title: config.title.clone(),
            lock_result: None,
        })
    }

    /// Check if cursor is captured
    pub fn is_cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    /// Answer to the last pointer-lock request, if not yet collected
    pub fn take_lock_result(&mut self) -> Option<Result<(), PointerLockError>> {
        self.lock_result.take()
    }

    /// Grab and hide the cursor
    fn capture_cursor(&mut self) -> Result<(), PointerLockError> {
        self.window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
            .map_err(|e| PointerLockError::Rejected(e.to_string()))?;

        self.window.set_cursor_visible(false);
        self.cursor_captured = true;
        log::info!("Cursor captured - Escape to release");
        Ok(())
    }

    /// Release cursor
    pub fn release_cursor(&mut self) {
        let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        self.window.set_cursor_visible(true);
        if self.cursor_captured {
            log::info!("Cursor released - click to capture");
        }
        self.cursor_captured = false;
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&self) {
        let new_fullscreen = if self.window.fullscreen().is_some() {
            None
        } else {
            Some(Fullscreen::Borderless(None))
        };
        self.window.set_fullscreen(new_fullscreen);
    }

    /// Update window title with player state
    pub fn update_title(&self, info: &TitleInfo<'_>) {
        self.window.set_title(&format_title(&self.base_title, info, self.cursor_captured));
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

impl PointerLockHost for WindowSystem {
    fn request_pointer_lock(&mut self) {
        let result = self.capture_cursor();
        if let Err(e) = &result {
            log::warn!("Failed to capture cursor: {}", e);
        }
        self.lock_result = Some(result);
    }

    fn release_pointer_lock(&mut self) {
        self.lock_result = None;
        self.release_cursor();
    }
}

fn format_title(base: &str, info: &TitleInfo<'_>, captured: bool) -> String {
    let view = match info.mode {
        CameraMode::ThirdPerson => "3rd",
        CameraMode::FirstPerson => "1st",
    };
    let hint = if captured { "Esc to release" } else { "Click to capture" };
    let p = info.position;

    let mut title = format!(
        "{} - ({:.1}, {:.1}, {:.1}) {} {}",
        base, p.x, p.y, p.z, info.clip, view
    );
    if info.show_contacts {
        title.push_str(if info.on_ground { " grounded" } else { " airborne" });
    }
    title.push_str(&format!(" [{}]", hint));
    title
}

#[derive(Debug)]
pub enum WindowError {
    CreationFailed(String),
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::CreationFailed(msg) => write!(f, "Window creation failed: {}", msg),
        }
    }
}

impl std::error::Error for WindowError {}
