//! Platform independent half of the window shell: the event vocabulary, the
//! window to renderer table and the main loop.

use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::error::Result;
use crate::renderer::RendererHooks;

/// Opaque window handle value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(pub isize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowEvent {
    /// Virtual-key code.
    KeyDown(u8),
    KeyUp(u8),
    Repaint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpMessage {
    Event(WindowId, WindowEvent),
    /// Something the platform handled on its own.
    Dispatched,
    /// The queue is empty.
    Idle,
    Quit(i32),
}

/// Source of window messages. Never blocks: an empty queue is `Idle`.
pub trait MessagePump {
    fn next_message(&mut self) -> PumpMessage;
}

/// Which renderer owns which window. Filled in when a window is created
/// instead of stashing a pointer in the window itself.
pub struct WindowRegistry<H> {
    windows: Vec<(WindowId, H)>,
}

impl<H> Default for WindowRegistry<H> {
    fn default() -> Self {
        Self {
            windows: Vec::new(),
        }
    }
}

impl<H: RendererHooks> WindowRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous owner if the id was already registered.
    pub fn insert(&mut self, window: WindowId, handler: H) -> Option<H> {
        debug!("Registering renderer for window {window:?}");
        match self.get_mut(window) {
            Some(existing) => Some(std::mem::replace(existing, handler)),
            None => {
                self.windows.push((window, handler));
                None
            }
        }
    }

    pub fn get(&self, window: WindowId) -> Option<&H> {
        self.windows
            .iter()
            .find(|(id, _)| *id == window)
            .map(|(_, handler)| handler)
    }

    pub fn get_mut(&mut self, window: WindowId) -> Option<&mut H> {
        self.windows
            .iter_mut()
            .find(|(id, _)| *id == window)
            .map(|(_, handler)| handler)
    }

    fn handlers_mut(&mut self) -> impl Iterator<Item = &mut H> {
        self.windows.iter_mut().map(|(_, handler)| handler)
    }
}

/// Pumps messages until a quit arrives, then shuts every renderer down and
/// returns the quit message's exit code. Any renderer error ends the loop.
pub fn run_event_loop<P, H>(pump: &mut P, registry: &mut WindowRegistry<H>) -> Result<i32>
where
    P: MessagePump,
    H: RendererHooks,
{
    loop {
        match pump.next_message() {
            PumpMessage::Event(window, event) => {
                let Some(handler) = registry.get_mut(window) else {
                    trace!("Dropping {event:?} for unregistered window {window:?}");
                    continue;
                };
                match event {
                    WindowEvent::KeyDown(key) => handler.on_key_down(key),
                    WindowEvent::KeyUp(key) => handler.on_key_up(key),
                    WindowEvent::Repaint => {
                        handler.tick()?;
                        handler.render()?;
                    }
                }
            }
            PumpMessage::Dispatched => {}
            PumpMessage::Idle => {
                for handler in registry.handlers_mut() {
                    handler.tick()?;
                    handler.render()?;
                }
            }
            PumpMessage::Quit(exit_code) => {
                info!("Quit requested with exit code {exit_code}");
                for handler in registry.handlers_mut() {
                    handler.shutdown()?;
                }
                return Ok(exit_code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use eyre::eyre;

    use super::*;

    #[derive(Default)]
    struct ScriptedPump {
        script: VecDeque<PumpMessage>,
    }

    impl ScriptedPump {
        fn new(script: impl IntoIterator<Item = PumpMessage>) -> Self {
            Self {
                script: script.into_iter().collect(),
            }
        }
    }

    impl MessagePump for ScriptedPump {
        fn next_message(&mut self) -> PumpMessage {
            self.script
                .pop_front()
                .expect("the script should end with a quit message")
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_render: bool,
    }

    impl RendererHooks for Recorder {
        fn tick(&mut self) -> Result<()> {
            self.calls.push("tick".into());
            Ok(())
        }

        fn render(&mut self) -> Result<()> {
            self.calls.push("render".into());
            if self.fail_render {
                return Err(eyre!("device removed"));
            }
            Ok(())
        }

        fn on_key_down(&mut self, key: u8) {
            self.calls.push(format!("down {}", key as char));
        }

        fn on_key_up(&mut self, key: u8) {
            self.calls.push(format!("up {}", key as char));
        }

        fn shutdown(&mut self) -> Result<()> {
            self.calls.push("shutdown".into());
            Ok(())
        }

        fn title(&self) -> String {
            "recorder".into()
        }
    }

    const MAIN: WindowId = WindowId(0x100);
    const OTHER: WindowId = WindowId(0x200);

    fn registry_with(windows: &[WindowId]) -> WindowRegistry<Recorder> {
        let mut registry = WindowRegistry::new();
        for window in windows {
            registry.insert(*window, Recorder::default());
        }
        registry
    }

    #[test]
    fn routes_keys_to_the_owning_window() {
        let mut registry = registry_with(&[MAIN, OTHER]);
        let mut pump = ScriptedPump::new([
            PumpMessage::Event(MAIN, WindowEvent::KeyDown(b'W')),
            PumpMessage::Event(OTHER, WindowEvent::KeyUp(b'A')),
            PumpMessage::Quit(0),
        ]);

        run_event_loop(&mut pump, &mut registry).unwrap();

        assert_eq!(registry.get(MAIN).unwrap().calls, ["down W", "shutdown"]);
        assert_eq!(registry.get(OTHER).unwrap().calls, ["up A", "shutdown"]);
    }

    #[test]
    fn idle_ticks_then_renders() {
        let mut registry = registry_with(&[MAIN]);
        let mut pump = ScriptedPump::new([
            PumpMessage::Idle,
            PumpMessage::Dispatched,
            PumpMessage::Idle,
            PumpMessage::Quit(0),
        ]);

        run_event_loop(&mut pump, &mut registry).unwrap();

        assert_eq!(
            registry.get(MAIN).unwrap().calls,
            ["tick", "render", "tick", "render", "shutdown"]
        );
    }

    #[test]
    fn repaint_renders_only_its_window() {
        let mut registry = registry_with(&[MAIN, OTHER]);
        let mut pump = ScriptedPump::new([
            PumpMessage::Event(OTHER, WindowEvent::Repaint),
            PumpMessage::Quit(0),
        ]);

        run_event_loop(&mut pump, &mut registry).unwrap();

        assert_eq!(registry.get(MAIN).unwrap().calls, ["shutdown"]);
        assert_eq!(
            registry.get(OTHER).unwrap().calls,
            ["tick", "render", "shutdown"]
        );
    }

    #[test]
    fn quit_returns_its_exit_code() {
        let mut registry = registry_with(&[MAIN]);
        let mut pump = ScriptedPump::new([PumpMessage::Quit(3)]);
        assert_eq!(run_event_loop(&mut pump, &mut registry).unwrap(), 3);
    }

    #[test]
    fn unregistered_windows_are_ignored() {
        let mut registry = registry_with(&[MAIN]);
        let mut pump = ScriptedPump::new([
            PumpMessage::Event(OTHER, WindowEvent::KeyDown(b'S')),
            PumpMessage::Quit(0),
        ]);

        run_event_loop(&mut pump, &mut registry).unwrap();
        assert_eq!(registry.get(MAIN).unwrap().calls, ["shutdown"]);
    }

    #[test]
    fn render_errors_end_the_loop() {
        let mut registry = WindowRegistry::new();
        registry.insert(
            MAIN,
            Recorder {
                fail_render: true,
                ..Recorder::default()
            },
        );
        // No quit in the script: the error has to stop the loop first.
        let mut pump = ScriptedPump::new([PumpMessage::Idle]);

        assert!(run_event_loop(&mut pump, &mut registry).is_err());
        assert_eq!(registry.get(MAIN).unwrap().calls, ["tick", "render"]);
    }

    #[test]
    fn registering_twice_replaces_the_renderer() {
        let mut registry = registry_with(&[MAIN]);
        registry.get_mut(MAIN).unwrap().on_key_down(b'W');

        let previous = registry.insert(MAIN, Recorder::default()).unwrap();
        assert_eq!(previous.calls, ["down W"]);
        assert!(registry.get(MAIN).unwrap().calls.is_empty());
        assert!(registry.get(OTHER).is_none());
    }
}
