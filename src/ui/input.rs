/// Keyboard state for the terminal viewer.
///
/// Held keys drive movement and jump; the gravity key is reported as held
/// too, the player brain latches it. Terminals that never send Release
/// events fall back to a hold timeout.
///
///   ←/a  move left      →/d  move right
///   ↑/w/space  jump     g    flip gravity
///   f    toggle field   q/esc/ctrl-c  quit

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::FrameInput;

/// Without a Press/Repeat for this long, a key counts as released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT: [KeyCode; 2] = [KeyCode::Left, KeyCode::Char('a')];
const RIGHT: [KeyCode; 2] = [KeyCode::Right, KeyCode::Char('d')];
const JUMP: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char(' ')];
const FLIP: [KeyCode; 1] = [KeyCode::Char('g')];
const QUIT: [KeyCode; 2] = [KeyCode::Esc, KeyCode::Char('q')];
const TOGGLE_FIELD: KeyCode = KeyCode::Char('f');

pub struct Keyboard {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh: Vec<KeyCode>,
    raw: Vec<KeyEvent>,
    /// Only true when the terminal reports Release events.
    pub honor_release: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            last_active: HashMap::with_capacity(16),
            fresh: Vec::with_capacity(8),
            raw: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain pending terminal events without blocking. Once per frame.
    pub fn drain(&mut self) {
        self.fresh.clear();
        self.raw.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.raw.push(key);
            match key.kind {
                KeyEventKind::Release if self.honor_release => {
                    self.last_active.remove(&key.code);
                }
                KeyEventKind::Release => {}
                _ => {
                    if !self.is_held(key.code) {
                        self.fresh.push(key.code);
                    }
                    self.last_active.insert(key.code, Instant::now());
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .is_some_and(|t| t.elapsed() < HOLD_TIMEOUT)
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    fn pressed(&self, code: KeyCode) -> bool {
        self.fresh.contains(&code)
    }

    /// Controls for the next simulation tick.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            move_left: self.any_held(&LEFT),
            move_right: self.any_held(&RIGHT),
            jump: self.any_held(&JUMP),
            flip_gravity: self.any_held(&FLIP),
        }
    }

    pub fn wants_quit(&self) -> bool {
        QUIT.iter().any(|c| self.pressed(*c))
            || self.raw.iter().any(|k| {
                k.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
            })
    }

    pub fn toggled_field(&self) -> bool {
        self.pressed(TOGGLE_FIELD)
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Keyboard::new()
    }
}
