//! Input and window events
//!
//! [`Event`] is a closed sum over the events a window backend can report.
//! Payloads are plain immutable data; code that cares about one variant
//! narrows with [`Event::get`], which yields `None` for every other variant.

use bitflags::bitflags;

use crate::identity::Identity;

/// Key and button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Release,
    Press,
    Repeat,
}

bitflags! {
    /// Modifier keys held while a key or mouse button event fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const CONTROL = 0b0000_0010;
        const ALT = 0b0000_0100;
        const SUPER = 0b0000_1000;
        const CAPS_LOCK = 0b0001_0000;
        const NUM_LOCK = 0b0010_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: i32,
    pub scancode: i32,
    pub action: Action,
    pub mods: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterEvent {
    pub codepoint: u32,
}

impl CharacterEvent {
    /// The character, if the codepoint is a valid scalar value.
    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.codepoint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseButtonEvent {
    pub button: i32,
    pub action: Action,
    pub mods: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseScrollEvent {
    pub x_offset: f64,
    pub y_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMoveEvent {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowResizeEvent {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMoveEvent {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMaximizeEvent {
    pub maximized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFocusEvent {
    pub focused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowIconifyEvent {
    pub iconified: bool,
}

/// Fieldless tag of an [`Event`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Key,
    Character,
    MouseButton,
    MouseScroll,
    MouseMove,
    WindowResize,
    WindowMove,
    WindowMaximize,
    WindowFocus,
    WindowIconify,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    Character(CharacterEvent),
    MouseButton(MouseButtonEvent),
    MouseScroll(MouseScrollEvent),
    MouseMove(MouseMoveEvent),
    WindowResize(WindowResizeEvent),
    WindowMove(WindowMoveEvent),
    WindowMaximize(WindowMaximizeEvent),
    WindowFocus(WindowFocusEvent),
    WindowIconify(WindowIconifyEvent),
}

/// A payload type that can be narrowed out of an [`Event`].
pub trait EventPayload: Sized {
    const KIND: EventKind;

    fn narrow(event: &Event) -> Option<&Self>;
}

macro_rules! event_payloads {
    ($($variant:ident => $payload:ty),* $(,)?) => {
        $(
            impl EventPayload for $payload {
                const KIND: EventKind = EventKind::$variant;

                fn narrow(event: &Event) -> Option<&Self> {
                    match event {
                        Event::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }

            impl From<$payload> for Event {
                fn from(payload: $payload) -> Self {
                    Event::$variant(payload)
                }
            }
        )*

        impl Event {
            pub fn kind(&self) -> EventKind {
                match self {
                    $(Event::$variant(_) => EventKind::$variant,)*
                }
            }
        }
    };
}

event_payloads! {
    Key => KeyEvent,
    Character => CharacterEvent,
    MouseButton => MouseButtonEvent,
    MouseScroll => MouseScrollEvent,
    MouseMove => MouseMoveEvent,
    WindowResize => WindowResizeEvent,
    WindowMove => WindowMoveEvent,
    WindowMaximize => WindowMaximizeEvent,
    WindowFocus => WindowFocusEvent,
    WindowIconify => WindowIconifyEvent,
}

impl Event {
    /// Returns the payload if this event is of variant `T`.
    pub fn get<T: EventPayload>(&self) -> Option<&T> {
        T::narrow(self)
    }

    pub fn is<T: EventPayload>(&self) -> bool {
        self.kind() == T::KIND
    }
}

/// An event as reported by a window backend, tagged with the window
/// component it came from and the entity owning that component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEvent {
    pub event: Event,
    pub window: Identity,
    pub entity: Identity,
}

impl RawEvent {
    pub fn new(event: impl Into<Event>, window: Identity, entity: Identity) -> Self {
        Self {
            event: event.into(),
            window,
            entity,
        }
    }
}
