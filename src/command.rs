//! Command table descriptors.
//!
//! A command table is a static slice of [`Command`]s, each binding a name
//! to a [`Target`]: a typed value slot, a handler taking typed arguments, a
//! handler reading the rest of the line itself, or a string buffer filled
//! verbatim from the input.

use core::fmt;

use arrayvec::ArrayString;

use crate::context::Context;
use crate::parser::LineReader;

/// Capacity of string slots and of long string captures.
pub const TEXT_CAPACITY: usize = 200;

/// String slot contents.
pub type Text = ArrayString<TEXT_CAPACITY>;

/// Accessor for a value stored in the context.
pub type Slot<C, T> = fn(&mut Context<C>) -> &mut T;

/// Handler for a command that parses the remainder of its line itself.
pub type LineFn<C> = fn(&mut Context<C>, &mut LineReader<'_>);

/// Handlers with typed arguments. The handler sends its own ACK or NAK.
pub enum Action<C> {
    Nullary(fn(&mut Context<C>)),
    Int(fn(&mut Context<C>, i32)),
    IntInt(fn(&mut Context<C>, i32, i32)),
    Str(fn(&mut Context<C>, &str)),
    StrStr(fn(&mut Context<C>, &str, &str)),
    IntIntFloat(fn(&mut Context<C>, i32, i32, f32)),
}

impl<C> Action<C> {
    /// Number of arguments the handler takes.
    pub const fn arity(&self) -> usize {
        match self {
            Action::Nullary(_) => 0,
            Action::Int(_) | Action::Str(_) => 1,
            Action::IntInt(_) | Action::StrStr(_) => 2,
            Action::IntIntFloat(_) => 3,
        }
    }
}

/// What a command operates on.
pub enum Target<C> {
    Bool(Slot<C, bool>),
    Int(Slot<C, i32>),
    Float(Slot<C, f32>),
    Str(Slot<C, Text>),
    Call(Action<C>),
    Line(LineFn<C>),
    Capture(Slot<C, Text>),
}

/// Command categories, as reported by [`Command::kind`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int,
    Float,
    Str,
    /// Handler with no or integer arguments.
    Function,
    /// Handler with string arguments.
    FunctionStr,
    /// Handler taking two integers and a float.
    Function2Int1Float,
    Line,
    LongString,
}

/// A command table entry.
pub struct Command<C> {
    pub name: &'static str,
    /// Number of arguments collected before dispatch. For slots, 0 reads
    /// and 1 writes. For captures, the destination size.
    pub arity: usize,
    pub target: Target<C>,
}

impl<C> Command<C> {
    /// A command reporting the value of a slot.
    pub const fn get(name: &'static str, target: Target<C>) -> Self {
        Self {
            name,
            arity: 0,
            target,
        }
    }

    /// A command writing one argument to a slot.
    pub const fn set(name: &'static str, target: Target<C>) -> Self {
        Self {
            name,
            arity: 1,
            target,
        }
    }

    /// A command invoking a handler, arity follows the handler.
    pub const fn call(name: &'static str, action: Action<C>) -> Self {
        Self {
            name,
            arity: action.arity(),
            target: Target::Call(action),
        }
    }

    /// A command deferred until its whole line is received, then handed the
    /// input stream.
    pub const fn line(name: &'static str, handler: LineFn<C>) -> Self {
        Self {
            name,
            arity: 0,
            target: Target::Line(handler),
        }
    }

    /// A command copying the rest of its line, commas included, into a
    /// string slot.
    pub const fn capture(name: &'static str, slot: Slot<C, Text>) -> Self {
        Self {
            name,
            arity: TEXT_CAPACITY,
            target: Target::Capture(slot),
        }
    }

    pub const fn kind(&self) -> Kind {
        match &self.target {
            Target::Bool(_) => Kind::Bool,
            Target::Int(_) => Kind::Int,
            Target::Float(_) => Kind::Float,
            Target::Str(_) => Kind::Str,
            Target::Call(Action::Str(_) | Action::StrStr(_)) => Kind::FunctionStr,
            Target::Call(Action::IntIntFloat(_)) => Kind::Function2Int1Float,
            Target::Call(_) => Kind::Function,
            Target::Line(_) => Kind::Line,
            Target::Capture(_) => Kind::LongString,
        }
    }
}

impl<C> fmt::Debug for Command<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Find `name` in `table`, returning the index of the first match.
pub fn lookup<C>(table: &[Command<C>], name: &str) -> Option<usize> {
    table.iter().position(|command| command.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Dev {
        flag: bool,
        text: Text,
    }

    fn noop(_: &mut Context<Dev>) {}
    fn three(_: &mut Context<Dev>, _: i32, _: i32, _: f32) {}
    fn two_str(_: &mut Context<Dev>, _: &str, _: &str) {}
    fn rest(_: &mut Context<Dev>, _: &mut LineReader<'_>) {}

    type Cmd = Command<Dev>;

    static TABLE: &[Cmd] = &[
        Cmd::get("GFLAG", Target::Bool(|c| &mut c.device.flag)),
        Cmd::set("SFLAG", Target::Bool(|c| &mut c.device.flag)),
        Cmd::call("NOOP", Action::Nullary(noop)),
        Cmd::call("THREE", Action::IntIntFloat(three)),
        Cmd::call("TWO", Action::StrStr(two_str)),
        Cmd::line("REST", rest),
        Cmd::capture("TEXT", |c| &mut c.device.text),
        Cmd::get("GFLAG", Target::Int(|c| &mut c.link.error_code)),
    ];

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(TABLE, "SFLAG"), Some(1));
        assert_eq!(lookup(TABLE, "sflag"), None);
        assert_eq!(lookup(TABLE, "SFLA"), None);
        // first match wins
        assert_eq!(lookup(TABLE, "GFLAG"), Some(0));
    }

    #[test]
    fn test_arity_and_kind() {
        let arities: [usize; 7] = [0, 1, 0, 3, 2, 0, TEXT_CAPACITY];
        for (command, arity) in TABLE.iter().zip(arities) {
            assert_eq!(command.arity, arity, "{:?}", command);
        }
        assert_eq!(TABLE[1].kind(), Kind::Bool);
        assert_eq!(TABLE[2].kind(), Kind::Function);
        assert_eq!(TABLE[3].kind(), Kind::Function2Int1Float);
        assert_eq!(TABLE[4].kind(), Kind::FunctionStr);
        assert_eq!(TABLE[5].kind(), Kind::Line);
        assert_eq!(TABLE[6].kind(), Kind::LongString);
        assert_eq!(TABLE[7].kind(), Kind::Int);
    }

    #[test]
    fn test_slot_access() {
        let mut ctx = Context::new(Dev::default());
        if let Target::Bool(slot) = TABLE[1].target {
            *slot(&mut ctx) = true;
        }
        assert!(ctx.device.flag);
    }
}
