//! Botlab - character controller playground
//!
//! Opens a window and runs the player session against the demo level. The
//! window title shows the player's position and current animation clip.

use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowId,
};

use botlab::config::AppConfig;
use botlab::scene::Playground;
use botlab::systems::{SimulationSystem, TitleInfo, WindowSystem};
use botlab_core::{
    ClipMixer, FollowCamera, InputAction, KeyBindings, PlayerSession, PointerLockState, SceneObjects,
};

/// Minimum time between spell casts
const SPELL_COOLDOWN: Duration = Duration::from_millis(1500);

/// Main application state
struct App {
    /// Application configuration
    config: AppConfig,
    window: Option<WindowSystem>,
    session: PlayerSession<ClipMixer, SceneObjects>,
    playground: Playground,
    bindings: KeyBindings,
    camera: FollowCamera,
    simulation: SimulationSystem,
    /// Name of the collider toggled with T
    toggle_target: &'static str,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let playground = Playground::demo();
        let mut session = PlayerSession::new(
            config.to_session_config(),
            config.animation.build_mixer(),
            SceneObjects::new(),
            playground.primary_mesh(),
        );
        playground.install(&mut session);
        session.respawn();

        session.rig_mut().set_mode(config.camera.initial_mode());
        session.rig_mut().set_follow_enabled(config.camera.follow);

        let mut last_cast: Option<Instant> = None;
        session.set_spell_predicate(move || {
            let now = Instant::now();
            let ready = last_cast.map_or(true, |t| now.duration_since(t) >= SPELL_COOLDOWN);
            if ready {
                last_cast = Some(now);
            }
            Ok(ready)
        });

        let bindings = config.input.to_key_bindings();

        Self {
            config,
            window: None,
            session,
            playground,
            bindings,
            camera: FollowCamera::default(),
            simulation: SimulationSystem::new(),
            toggle_target: "wall",
        }
    }

    /// Hand a pointer-lock answer from the window back to the session
    fn deliver_lock_result(&mut self) {
        if let Some(result) = self.window.as_mut().and_then(|w| w.take_lock_result()) {
            self.session.pointer_lock_resolved(result);
        }
    }

    /// Release every held movement key
    fn release_held_keys(&mut self) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        for action in InputAction::ALL.iter().filter(|a| a.is_continuous()) {
            self.session.handle_action(*action, false, window);
        }
    }

    /// Keys the playground handles itself when they are not bound to an action
    fn handle_debug_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::KeyR => {
                self.session.respawn();
                log::info!("Respawned");
            }
            KeyCode::KeyF => {
                if let Some(window) = &self.window {
                    window.toggle_fullscreen();
                }
            }
            KeyCode::KeyK => {
                if self.session.animator().is_defeated() {
                    self.session.recover_from_defeat();
                } else {
                    self.session.trigger_defeat();
                }
            }
            KeyCode::KeyT => {
                let enabled = self
                    .session
                    .world()
                    .registry
                    .get_by_name(self.toggle_target)
                    .map(|entry| !entry.enabled);
                if let Some(enabled) = enabled {
                    match self.session.toggle_collider_physics(self.toggle_target, enabled) {
                        Ok(()) => log::info!(
                            "Collider '{}': {}",
                            self.toggle_target,
                            if enabled { "ON" } else { "OFF" }
                        ),
                        Err(e) => log::warn!("{}", e),
                    }
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            match WindowSystem::create(event_loop, &self.config.window) {
                Ok(window) => {
                    window.request_redraw();
                    self.window = Some(window);
                }
                Err(e) => {
                    log::error!("{}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.session.dispose();
                event_loop.exit();
            }

            WindowEvent::Focused(false) => {
                self.release_held_keys();
                if self.session.rig().lock_state() != PointerLockState::Unlocked {
                    self.session.pointer_lock_lost();
                    if let Some(window) = &mut self.window {
                        window.release_cursor();
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };

                let Some((action, pressed)) = self.bindings.map_keyboard(key, event.state) else {
                    if event.state == ElementState::Pressed && !event.repeat {
                        self.handle_debug_key(key);
                    }
                    return;
                };

                // Held one-shot keys must not repeat
                if event.repeat && !action.is_continuous() {
                    return;
                }

                // Escape releases the cursor first, then exits if pressed again
                if action == InputAction::ReleaseCursor && pressed && !self.session.rig().is_locked() {
                    self.session.dispose();
                    event_loop.exit();
                    return;
                }

                if let Some(window) = &mut self.window {
                    self.session.handle_action(action, pressed, window);
                }
            }

            WindowEvent::MouseInput { state: ElementState::Pressed, button, .. } => {
                match button {
                    MouseButton::Left => {
                        if let Some(window) = &mut self.window {
                            self.session.handle_primary_click(window);
                        }
                        self.deliver_lock_result();
                    }
                    MouseButton::Right => {
                        self.session.shoot_arrow();
                    }
                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => {
                let result = self.simulation.update(&mut self.session, &mut self.playground, &mut self.camera);

                if let Some(window) = &self.window {
                    window.update_title(&TitleInfo {
                        position: result.position,
                        clip: result.clip.map_or("-", |clip| clip.name()),
                        mode: self.session.rig().mode(),
                        on_ground: result.on_ground,
                        show_contacts: self.config.debug.show_contacts,
                    });
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.session.handle_mouse_motion(delta.0, delta.1);
        }
    }
}

fn main() {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    log::info!("Starting Botlab");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}
