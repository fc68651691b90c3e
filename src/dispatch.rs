use log::{debug, warn};

use crate::command::{Action, Command, Target};
use crate::context::Context;
use crate::error::Error;
use crate::nom_parser::bool_literal;
use crate::parser::Arg;

/// Run a complete command with its collected arguments.
///
/// Slot reads and writes are answered here, handlers answer for themselves.
pub(crate) fn execute<C>(command: &Command<C>, args: &[Arg; 3], ctx: &mut Context<C>) {
    debug!("Executing {:?}", command);
    match (&command.target, command.arity) {
        (Target::Bool(slot), 0) => {
            let value = *slot(ctx);
            ctx.link.reply(if value { "TRUE" } else { "FALSE" });
        }
        (Target::Bool(slot), 1) => match bool_literal(&args[0].text) {
            Some(value) => {
                *slot(ctx) = value;
                ctx.link.ack();
            }
            None => ctx.link.fail(Error::BadArgument),
        },
        (Target::Int(slot), 0) => {
            let value = *slot(ctx);
            ctx.link.reply(value);
        }
        (Target::Int(slot), 1) => {
            *slot(ctx) = args[0].int;
            ctx.link.ack();
        }
        (Target::Float(slot), 0) => {
            let value = *slot(ctx);
            ctx.link.reply(format_args!("{:.2}", value));
        }
        (Target::Float(slot), 1) => {
            *slot(ctx) = args[0].float;
            ctx.link.ack();
        }
        (Target::Str(slot), 0) => {
            let value = *slot(ctx);
            ctx.link.reply(value.as_str());
        }
        (Target::Str(slot), 1) => {
            let dest = slot(ctx);
            dest.clear();
            dest.push_str(&args[0].text);
            ctx.link.ack();
        }
        (Target::Call(action), _) => invoke(action, args, ctx),
        _ => {
            warn!("{:?} can't be executed with {} arguments", command, command.arity);
            ctx.link.nak();
        }
    }
}

fn invoke<C>(action: &Action<C>, args: &[Arg; 3], ctx: &mut Context<C>) {
    match *action {
        Action::Nullary(f) => f(ctx),
        Action::Int(f) => f(ctx, args[0].int),
        Action::IntInt(f) => f(ctx, args[0].int, args[1].int),
        Action::Str(f) => f(ctx, &args[0].text),
        Action::StrStr(f) => f(ctx, &args[0].text, &args[1].text),
        Action::IntIntFloat(f) => f(ctx, args[0].int, args[1].int, args[2].float),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Text;
    use crate::tokenizer::Token;

    #[derive(Default)]
    struct Dev {
        level: i32,
        label: Text,
        seen: Option<(Token, Token)>,
    }

    type Cmd = Command<Dev>;

    fn pair(ctx: &mut Context<Dev>, a: &str, b: &str) {
        ctx.device.seen = Token::from(a).ok().zip(Token::from(b).ok());
        ctx.link.ack();
    }

    fn silent(_: &mut Context<Dev>, _: i32) {}

    fn args(values: &[&str]) -> [Arg; 3] {
        let mut args: [Arg; 3] = Default::default();
        for (arg, value) in args.iter_mut().zip(values) {
            *arg = Arg::parse(value);
        }
        args
    }

    #[test]
    fn test_string_slot() {
        let mut ctx = Context::new(Dev::default());
        let set = Cmd::set("SLABEL", Target::Str(|c| &mut c.device.label));
        let get = Cmd::get("GLABEL", Target::Str(|c| &mut c.device.label));
        execute(&set, &args(&["board 1"]), &mut ctx);
        execute(&get, &args(&[]), &mut ctx);
        assert_eq!(ctx.link.take_output(), b"\x06\x06board 1\n");
    }

    #[test]
    fn test_handlers_answer_for_themselves() {
        let mut ctx = Context::new(Dev::default());
        execute(&Cmd::call("PAIR", Action::StrStr(pair)), &args(&["a", "b"]), &mut ctx);
        assert_eq!(ctx.link.take_output(), b"\x06");
        let (a, b) = ctx.device.seen.unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("a", "b"));

        execute(&Cmd::call("SILENT", Action::Int(silent)), &args(&["5"]), &mut ctx);
        assert!(ctx.link.output().is_empty());
    }

    #[test]
    fn test_unsupported_shape() {
        let mut ctx = Context::new(Dev::default());
        let bad = Cmd {
            name: "BAD",
            arity: 2,
            target: Target::Int(|c| &mut c.device.level),
        };
        execute(&bad, &args(&["1", "2"]), &mut ctx);
        assert_eq!(ctx.link.take_output(), b"\x15");
        assert_eq!(ctx.device.level, 0);
    }
}
