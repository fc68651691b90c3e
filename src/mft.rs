//! Command table of the MFT twave switch board.
//!
//! [`Mft`] holds the board settings that are reachable through the serial
//! protocol, [`COMMANDS`] binds the board's command names to them. The
//! handlers validate, store and acknowledge; driving the DACs, the switch
//! and the trigger inputs from these settings is left to the firmware main
//! loop.

use core::fmt::{self, Display};
use core::str::FromStr;

use snafu::{ensure, OptionExt};

use crate::command::{Action, Command, Target, Text};
use crate::context::Context;
use crate::error::{BadArgumentSnafu, Error, OutOfRangeSnafu};
use crate::nom_parser::{bool_literal, float_prefix, int_prefix};
use crate::parser::LineReader;

/// Reported by `GVER`.
pub const VERSION: &str = concat!("MFT Version ", env!("CARGO_PKG_VERSION"));

pub const MIN_FREQUENCY: i32 = 0;
pub const MAX_FREQUENCY: i32 = 25_000;
pub const MIN_VOLTAGE: f32 = 0.0;
pub const MAX_VOLTAGE: f32 = 50.0;
/// Highest clock output frequency, 0 disables the clock.
pub const MAX_CLOCK: i32 = 10_000;
/// Phase shifts are given in whole degrees, below this value.
pub const FULL_TURN: i32 = 360;

type Ctx = Context<Mft>;
type Cmd = Command<Mft>;

/// Trigger input edge selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriggerMode {
    Pos,
    Neg,
    Change,
    Na,
}

impl FromStr for TriggerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POS" => Ok(Self::Pos),
            "NEG" => Ok(Self::Neg),
            "CHANGE" => Ok(Self::Change),
            "NA" => Ok(Self::Na),
            _ => BadArgumentSnafu.fail(),
        }
    }
}

/// What a trigger input does when it fires.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TriggerFunction {
    /// Reverse the direction of channel 1 or 2.
    Rev1,
    Rev2,
    /// Apply the open mask of channel 1 or 2.
    Open1,
    Open2,
    /// Count pulses.
    Cnt,
    /// Run the active command string.
    Cmd,
    Na,
}

impl FromStr for TriggerFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REV1" => Ok(Self::Rev1),
            "REV2" => Ok(Self::Rev2),
            "OPEN1" => Ok(Self::Open1),
            "OPEN2" => Ok(Self::Open2),
            "CNT" => Ok(Self::Cnt),
            "CMD" => Ok(Self::Cmd),
            "NA" => Ok(Self::Na),
            _ => BadArgumentSnafu.fail(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub mode: TriggerMode,
    pub function: TriggerFunction,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            mode: TriggerMode::Na,
            function: TriggerFunction::Na,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PulseCounter {
    pub count: i32,
    pub threshold: i32,
    pub reset_on_threshold: bool,
    pub trigger_on_threshold: bool,
    pub command_on_threshold: bool,
}

/// Which end of a user limit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

/// Settings with user programmable limits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Limit {
    Guard,
    Frequency,
    /// Twave voltage of channel 0 or 1.
    TwaveVoltage(usize),
}

/// User programmable limits, checked by the setters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Limits {
    pub min_twv: [f32; 2],
    pub max_twv: [f32; 2],
    pub min_guard: f32,
    pub max_guard: f32,
    pub min_freq: i32,
    pub max_freq: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_twv: [MIN_VOLTAGE; 2],
            max_twv: [MAX_VOLTAGE; 2],
            min_guard: MIN_VOLTAGE,
            max_guard: MAX_VOLTAGE,
            min_freq: MIN_FREQUENCY,
            max_freq: MAX_FREQUENCY,
        }
    }
}

impl Limits {
    /// Set a voltage limit, within the hardware range.
    /// # Errors
    /// [`Error::OutOfRange`] for voltages outside the hardware range,
    /// [`Error::BadArgument`] for [`Limit::Frequency`].
    pub fn set_voltage(&mut self, limit: Limit, bound: Bound, volts: f32) -> Result<(), Error> {
        let volts = in_range(volts, MIN_VOLTAGE, MAX_VOLTAGE)?;
        *self.voltage_mut(limit, bound).context(BadArgumentSnafu)? = volts;
        Ok(())
    }

    pub fn set_frequency(&mut self, bound: Bound, freq: i32) -> Result<(), Error> {
        *self.frequency_mut(bound) = in_range(freq, MIN_FREQUENCY, MAX_FREQUENCY)?;
        Ok(())
    }

    pub fn voltage(&self, limit: Limit, bound: Bound) -> Option<f32> {
        match (limit, bound) {
            (Limit::Guard, Bound::Min) => Some(self.min_guard),
            (Limit::Guard, Bound::Max) => Some(self.max_guard),
            (Limit::TwaveVoltage(ch), Bound::Min) => self.min_twv.get(ch).copied(),
            (Limit::TwaveVoltage(ch), Bound::Max) => self.max_twv.get(ch).copied(),
            (Limit::Frequency, _) => None,
        }
    }

    pub fn frequency(&self, bound: Bound) -> i32 {
        match bound {
            Bound::Min => self.min_freq,
            Bound::Max => self.max_freq,
        }
    }

    fn voltage_mut(&mut self, limit: Limit, bound: Bound) -> Option<&mut f32> {
        match (limit, bound) {
            (Limit::Guard, Bound::Min) => Some(&mut self.min_guard),
            (Limit::Guard, Bound::Max) => Some(&mut self.max_guard),
            (Limit::TwaveVoltage(ch), Bound::Min) => self.min_twv.get_mut(ch),
            (Limit::TwaveVoltage(ch), Bound::Max) => self.max_twv.get_mut(ch),
            (Limit::Frequency, _) => None,
        }
    }

    fn frequency_mut(&mut self, bound: Bound) -> &mut i32 {
        match bound {
            Bound::Min => &mut self.min_freq,
            Bound::Max => &mut self.max_freq,
        }
    }
}

/// Level of the trigger output.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrigOut {
    Low,
    High,
}

/// Protocol visible state of the MFT board.
#[derive(Debug, Clone)]
pub struct Mft {
    pub name: Text,
    /// Baud rate of the second serial port, applied at startup.
    pub baud: i32,
    pub enable: bool,
    pub running: bool,
    /// Requested frequency in Hz.
    pub freq: i32,
    /// Generated frequency in Hz.
    pub actual_freq: i32,
    pub fwd: [bool; 2],
    pub pattern: [u8; 2],
    pub open: [bool; 2],
    /// Channels driven open while `open` is set, one bit per output.
    pub open_mask: [u8; 2],
    /// Phase shift in degrees, forward direction.
    pub fwd_phase: [i32; 2],
    /// Phase shift in degrees, reverse direction.
    pub rev_phase: [i32; 2],
    pub tw_voltage: [f32; 2],
    /// Alternate twave voltage, switched in by a trigger.
    pub tw_alt_voltage: [f32; 2],
    pub guard: f32,
    pub limits: Limits,
    pub trig_out: TrigOut,
    pub trig_pulses: u32,
    /// Waveform cycles requested by `STEP`.
    pub cycles: i32,
    pub triggers: [Trigger; 2],
    pub counter: PulseCounter,
    pub clock_frequency: i32,
    pub clock_mode: Text,
    pub command_strings: [Text; 2],
    /// Command string run by `ETRGCMD`, 1 or 2.
    pub active_command: i32,
}

impl Default for Mft {
    fn default() -> Self {
        Self {
            name: Text::from("TwaveSwitch").unwrap_or_default(),
            baud: 115_200,
            enable: false,
            running: false,
            freq: 10_000,
            actual_freq: 10_000,
            fwd: [true; 2],
            pattern: [0b1111_0000; 2],
            open: [false; 2],
            open_mask: [0; 2],
            fwd_phase: [0; 2],
            rev_phase: [0; 2],
            tw_voltage: [0.0; 2],
            tw_alt_voltage: [0.0; 2],
            guard: 0.0,
            limits: Limits::default(),
            trig_out: TrigOut::Low,
            trig_pulses: 0,
            cycles: 0,
            triggers: [Trigger::default(); 2],
            counter: PulseCounter::default(),
            clock_frequency: 0,
            clock_mode: Text::from("NA").unwrap_or_default(),
            command_strings: [Text::new(); 2],
            active_command: 1,
        }
    }
}

impl Mft {
    /// # Errors
    /// [`Error::OutOfRange`] outside of the hardware range or the user limits.
    pub fn set_frequency(&mut self, freq: i32) -> Result<(), Error> {
        let min = self.limits.min_freq.max(MIN_FREQUENCY);
        let max = self.limits.max_freq.min(MAX_FREQUENCY);
        self.freq = in_range(freq, min, max)?;
        self.actual_freq = self.freq;
        Ok(())
    }

    /// Set the twave voltage of channel `ch`, 0 or 1.
    pub fn set_tw_voltage(&mut self, ch: usize, volts: f32) -> Result<(), Error> {
        ensure!(ch < 2, OutOfRangeSnafu);
        self.tw_voltage[ch] = in_range(volts, self.limits.min_twv[ch], self.limits.max_twv[ch])?;
        Ok(())
    }

    /// Set the alternate twave voltage of channel `ch`, 0 or 1. Checked
    /// against the same limits as the main voltage.
    pub fn set_tw_alt_voltage(&mut self, ch: usize, volts: f32) -> Result<(), Error> {
        ensure!(ch < 2, OutOfRangeSnafu);
        self.tw_alt_voltage[ch] =
            in_range(volts, self.limits.min_twv[ch], self.limits.max_twv[ch])?;
        Ok(())
    }

    pub fn set_guard(&mut self, volts: f32) -> Result<(), Error> {
        self.guard = in_range(volts, self.limits.min_guard, self.limits.max_guard)?;
        Ok(())
    }

    pub fn set_clock(&mut self, freq: i32) -> Result<(), Error> {
        self.clock_frequency = in_range(freq, 0, MAX_CLOCK)?;
        Ok(())
    }

    pub fn set_clock_function(&mut self, function: &str) -> Result<(), Error> {
        ensure!(matches!(function, "NA" | "TRG" | "CNT"), BadArgumentSnafu);
        self.clock_mode = Text::from(function).map_err(|_| Error::BadArgument)?;
        Ok(())
    }
}

/// The MFT command table.
pub static COMMANDS: &[Cmd] = &[
    // General
    Cmd::call("GVER", Action::Nullary(version)),
    Cmd::get("GERR", Target::Int(|c| &mut c.link.error_code)),
    Cmd::call("MUTE", Action::Str(mute)),
    Cmd::set("ECHO", Target::Bool(|c| &mut c.link.echo)),
    Cmd::call("GCMDS", Action::Nullary(list_commands)),
    Cmd::get("GNAME", Target::Str(|c| &mut c.device.name)),
    Cmd::set("SNAME", Target::Str(|c| &mut c.device.name)),
    Cmd::set("SBAUD", Target::Int(|c| &mut c.device.baud)),
    Cmd::get("GBAUD", Target::Int(|c| &mut c.device.baud)),
    // Twave
    Cmd::set("SENA", Target::Bool(|c| &mut c.device.enable)),
    Cmd::get("GENA", Target::Bool(|c| &mut c.device.enable)),
    Cmd::call("SFREQ", Action::Str(set_frequency)),
    Cmd::get("GFREQ", Target::Int(|c| &mut c.device.freq)),
    Cmd::get("GAFREQ", Target::Int(|c| &mut c.device.actual_freq)),
    Cmd::call("SFWD", Action::StrStr(set_direction)),
    Cmd::call("GFWD", Action::Int(get_direction)),
    Cmd::call("SPTRN", Action::StrStr(set_pattern)),
    Cmd::call("GPTRN", Action::Int(get_pattern)),
    Cmd::call("START", Action::Nullary(start)),
    Cmd::call("STOP", Action::Nullary(stop)),
    Cmd::call("STEP", Action::Int(step_cycles)),
    Cmd::call("STWV", Action::StrStr(set_tw_voltage)),
    Cmd::call("GTWV", Action::Int(get_tw_voltage)),
    Cmd::call("STWVALT", Action::StrStr(set_tw_alt_voltage)),
    Cmd::call("GTWVALT", Action::Int(get_tw_alt_voltage)),
    Cmd::call("SGRD", Action::Str(set_guard)),
    Cmd::get("GGRD", Target::Float(|c| &mut c.device.guard)),
    Cmd::call("TRIGOUT", Action::Str(trig_out)),
    // User limits: type,[chan,]value
    Cmd::line("SMAX", set_maximum),
    Cmd::line("GMAX", get_maximum),
    Cmd::line("SMIN", set_minimum),
    Cmd::line("GMIN", get_minimum),
    Cmd::call("SOPEN", Action::StrStr(set_open)),
    Cmd::call("GOPEN", Action::Int(get_open)),
    Cmd::call("SOMSK", Action::StrStr(set_open_mask)),
    Cmd::call("GOMSK", Action::Int(get_open_mask)),
    Cmd::call("SFWDPS", Action::StrStr(set_fwd_phase)),
    Cmd::call("GFWDPS", Action::Int(get_fwd_phase)),
    Cmd::call("SREVPS", Action::StrStr(set_rev_phase)),
    Cmd::call("GREVPS", Action::Int(get_rev_phase)),
    // Command strings
    Cmd::capture("STRGCMD1", |c| &mut c.device.command_strings[0]),
    Cmd::get("GTRGCMD1", Target::Str(|c| &mut c.device.command_strings[0])),
    Cmd::capture("STRGCMD2", |c| &mut c.device.command_strings[1]),
    Cmd::get("GTRGCMD2", Target::Str(|c| &mut c.device.command_strings[1])),
    Cmd::call("ETRGCMD", Action::Nullary(play_active)),
    Cmd::call("ETRGCMD1", Action::Nullary(play_first)),
    Cmd::call("ETRGCMD2", Action::Nullary(play_second)),
    Cmd::call("SCMD", Action::Int(set_active_command)),
    Cmd::call("GCMD", Action::Nullary(get_active_command)),
    // Clock
    Cmd::call("SCLOCK", Action::Int(set_clock)),
    Cmd::get("GCLOCK", Target::Int(|c| &mut c.device.clock_frequency)),
    Cmd::call("SCLKFUN", Action::Str(set_clock_function)),
    Cmd::get("GCLKFUN", Target::Str(|c| &mut c.device.clock_mode)),
    // Triggers: mode,function
    Cmd::call("TRIG1", Action::StrStr(set_trigger1)),
    Cmd::call("TRIG2", Action::StrStr(set_trigger2)),
    // Pulse counter
    Cmd::get("GCNT", Target::Int(|c| &mut c.device.counter.count)),
    Cmd::call("CLRCNT", Action::Nullary(clear_counter)),
    Cmd::set("SCNTTRG", Target::Int(|c| &mut c.device.counter.threshold)),
    Cmd::get("GCNTTRG", Target::Int(|c| &mut c.device.counter.threshold)),
    Cmd::set("STRIGCNT", Target::Bool(|c| &mut c.device.counter.trigger_on_threshold)),
    Cmd::get("GTRIGCNT", Target::Bool(|c| &mut c.device.counter.trigger_on_threshold)),
    Cmd::set("STRIGRST", Target::Bool(|c| &mut c.device.counter.reset_on_threshold)),
    Cmd::get("GTRIGRST", Target::Bool(|c| &mut c.device.counter.reset_on_threshold)),
    Cmd::set("STRIGCMD", Target::Bool(|c| &mut c.device.counter.command_on_threshold)),
    Cmd::get("GTRIGCMD", Target::Bool(|c| &mut c.device.counter.command_on_threshold)),
];

/// Two decimal fixed point, the way voltages are reported.
struct Volts(f32);

impl Display for Volts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

struct Bits(u8);

impl Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

fn in_range<T: PartialOrd>(value: T, min: T, max: T) -> Result<T, Error> {
    ensure!(min <= value && value <= max, OutOfRangeSnafu);
    Ok(value)
}

/// Map a channel number, 1 or 2, to an index.
fn channel(ch: i32) -> Result<usize, Error> {
    ensure!(ch == 1 || ch == 2, OutOfRangeSnafu);
    Ok((ch - 1) as usize)
}

fn flag(value: &str) -> Result<bool, Error> {
    bool_literal(value).context(BadArgumentSnafu)
}

const fn true_false(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Run a setter, ACK on success.
fn respond(ctx: &mut Ctx, f: impl FnOnce(&mut Mft) -> Result<(), Error>) {
    match f(&mut ctx.device) {
        Ok(()) => ctx.link.ack(),
        Err(err) => ctx.link.fail(err),
    }
}

/// Run a getter, reply with its value on success.
fn report<T: Display>(ctx: &mut Ctx, f: impl FnOnce(&Mft) -> Result<T, Error>) {
    match f(&ctx.device) {
        Ok(value) => ctx.link.reply(value),
        Err(err) => ctx.link.fail(err),
    }
}

fn version(ctx: &mut Ctx) {
    ctx.link.reply(VERSION);
}

fn list_commands(ctx: &mut Ctx) {
    ctx.link.ack_only();
    for command in COMMANDS {
        ctx.link.println(command.name);
    }
}

fn mute(ctx: &mut Ctx, state: &str) {
    match state {
        "ON" => ctx.link.mute = true,
        "OFF" => ctx.link.mute = false,
        _ => return ctx.link.fail(Error::BadArgument),
    }
    ctx.link.ack();
}

fn set_frequency(ctx: &mut Ctx, freq: &str) {
    respond(ctx, |mft| mft.set_frequency(int_prefix(freq)));
}

fn set_direction(ctx: &mut Ctx, ch: &str, fwd: &str) {
    respond(ctx, |mft| {
        mft.fwd[channel(int_prefix(ch))?] = flag(fwd)?;
        Ok(())
    });
}

fn get_direction(ctx: &mut Ctx, ch: i32) {
    report(ctx, |mft| Ok(true_false(mft.fwd[channel(ch)?])));
}

fn bits(value: &str) -> Result<u8, Error> {
    u8::from_str_radix(value, 2).ok().context(BadArgumentSnafu)
}

fn set_pattern(ctx: &mut Ctx, ch: &str, pattern: &str) {
    respond(ctx, |mft| {
        mft.pattern[channel(int_prefix(ch))?] = bits(pattern)?;
        Ok(())
    });
}

fn get_pattern(ctx: &mut Ctx, ch: i32) {
    report(ctx, |mft| Ok(Bits(mft.pattern[channel(ch)?])));
}

fn start(ctx: &mut Ctx) {
    ctx.device.running = true;
    ctx.link.ack();
}

fn stop(ctx: &mut Ctx) {
    ctx.device.running = false;
    ctx.link.ack();
}

fn step_cycles(ctx: &mut Ctx, cycles: i32) {
    respond(ctx, |mft| {
        ensure!(cycles > 0, OutOfRangeSnafu);
        mft.cycles = cycles;
        Ok(())
    });
}

fn set_tw_voltage(ctx: &mut Ctx, ch: &str, volts: &str) {
    respond(ctx, |mft| {
        mft.set_tw_voltage(channel(int_prefix(ch))?, float_prefix(volts))
    });
}

fn get_tw_voltage(ctx: &mut Ctx, ch: i32) {
    report(ctx, |mft| Ok(Volts(mft.tw_voltage[channel(ch)?])));
}

fn set_tw_alt_voltage(ctx: &mut Ctx, ch: &str, volts: &str) {
    respond(ctx, |mft| {
        mft.set_tw_alt_voltage(channel(int_prefix(ch))?, float_prefix(volts))
    });
}

fn get_tw_alt_voltage(ctx: &mut Ctx, ch: i32) {
    report(ctx, |mft| Ok(Volts(mft.tw_alt_voltage[channel(ch)?])));
}

fn set_guard(ctx: &mut Ctx, volts: &str) {
    respond(ctx, |mft| mft.set_guard(float_prefix(volts)));
}

fn trig_out(ctx: &mut Ctx, value: &str) {
    respond(ctx, |mft| {
        match value {
            "HIGH" => mft.trig_out = TrigOut::High,
            "LOW" => mft.trig_out = TrigOut::Low,
            "PULSE" => mft.trig_pulses += 1,
            _ => return BadArgumentSnafu.fail(),
        }
        Ok(())
    });
}

fn read_limit(line: &mut LineReader<'_>) -> Result<Limit, Error> {
    match line.arg()?.as_str() {
        "GRD" => Ok(Limit::Guard),
        "FREQ" => Ok(Limit::Frequency),
        "TWV" => Ok(Limit::TwaveVoltage(channel(int_prefix(&line.arg()?))?)),
        _ => BadArgumentSnafu.fail(),
    }
}

fn set_limit(ctx: &mut Ctx, line: &mut LineReader<'_>, bound: Bound) {
    respond(ctx, |mft| {
        let limit = read_limit(line)?;
        let value = line.arg()?;
        match limit {
            Limit::Frequency => mft.limits.set_frequency(bound, int_prefix(&value)),
            _ => mft.limits.set_voltage(limit, bound, float_prefix(&value)),
        }
    });
}

fn get_limit(ctx: &mut Ctx, line: &mut LineReader<'_>, bound: Bound) {
    let limit = match read_limit(line) {
        Ok(limit) => limit,
        Err(err) => return ctx.link.fail(err),
    };
    let limits = &ctx.device.limits;
    match limit {
        Limit::Frequency => {
            let freq = limits.frequency(bound);
            ctx.link.reply(freq);
        }
        _ => match limits.voltage(limit, bound) {
            Some(volts) => ctx.link.reply(Volts(volts)),
            None => ctx.link.fail(Error::BadArgument),
        },
    }
}

fn set_maximum(ctx: &mut Ctx, line: &mut LineReader<'_>) {
    set_limit(ctx, line, Bound::Max);
}

fn get_maximum(ctx: &mut Ctx, line: &mut LineReader<'_>) {
    get_limit(ctx, line, Bound::Max);
}

fn set_minimum(ctx: &mut Ctx, line: &mut LineReader<'_>) {
    set_limit(ctx, line, Bound::Min);
}

fn get_minimum(ctx: &mut Ctx, line: &mut LineReader<'_>) {
    get_limit(ctx, line, Bound::Min);
}

fn set_open(ctx: &mut Ctx, ch: &str, open: &str) {
    respond(ctx, |mft| {
        mft.open[channel(int_prefix(ch))?] = flag(open)?;
        Ok(())
    });
}

fn get_open(ctx: &mut Ctx, ch: i32) {
    report(ctx, |mft| Ok(true_false(mft.open[channel(ch)?])));
}

fn set_open_mask(ctx: &mut Ctx, ch: &str, mask: &str) {
    respond(ctx, |mft| {
        mft.open_mask[channel(int_prefix(ch))?] = bits(mask)?;
        Ok(())
    });
}

fn get_open_mask(ctx: &mut Ctx, ch: i32) {
    report(ctx, |mft| Ok(Bits(mft.open_mask[channel(ch)?])));
}

fn phase(degrees: &str) -> Result<i32, Error> {
    in_range(int_prefix(degrees), 0, FULL_TURN - 1)
}

fn set_fwd_phase(ctx: &mut Ctx, ch: &str, degrees: &str) {
    respond(ctx, |mft| {
        mft.fwd_phase[channel(int_prefix(ch))?] = phase(degrees)?;
        Ok(())
    });
}

fn get_fwd_phase(ctx: &mut Ctx, ch: i32) {
    report(ctx, |mft| Ok(mft.fwd_phase[channel(ch)?]));
}

fn set_rev_phase(ctx: &mut Ctx, ch: &str, degrees: &str) {
    respond(ctx, |mft| {
        mft.rev_phase[channel(int_prefix(ch))?] = phase(degrees)?;
        Ok(())
    });
}

fn get_rev_phase(ctx: &mut Ctx, ch: i32) {
    report(ctx, |mft| Ok(mft.rev_phase[channel(ch)?]));
}

/// Queue command string `n` for execution and make it the active one.
fn play(ctx: &mut Ctx, n: i32) {
    let result = channel(n).and_then(|i| {
        let script = ctx.device.command_strings[i];
        ctx.link.replay(&script)?;
        ctx.device.active_command = n;
        Ok(())
    });
    match result {
        Ok(()) => ctx.link.ack(),
        Err(err) => ctx.link.fail(err),
    }
}

fn play_active(ctx: &mut Ctx) {
    let n = ctx.device.active_command;
    play(ctx, n);
}

fn play_first(ctx: &mut Ctx) {
    play(ctx, 1);
}

fn play_second(ctx: &mut Ctx) {
    play(ctx, 2);
}

fn set_active_command(ctx: &mut Ctx, n: i32) {
    respond(ctx, |mft| {
        channel(n)?;
        mft.active_command = n;
        Ok(())
    });
}

fn get_active_command(ctx: &mut Ctx) {
    let n = ctx.device.active_command;
    ctx.link.reply(n);
}

fn set_clock(ctx: &mut Ctx, freq: i32) {
    respond(ctx, |mft| mft.set_clock(freq));
}

fn set_clock_function(ctx: &mut Ctx, function: &str) {
    respond(ctx, |mft| mft.set_clock_function(function));
}

fn set_trigger(ctx: &mut Ctx, n: usize, mode: &str, function: &str) {
    respond(ctx, |mft| {
        mft.triggers[n] = Trigger {
            mode: mode.parse()?,
            function: function.parse()?,
        };
        Ok(())
    });
}

fn set_trigger1(ctx: &mut Ctx, mode: &str, function: &str) {
    set_trigger(ctx, 0, mode, function);
}

fn set_trigger2(ctx: &mut Ctx, mode: &str, function: &str) {
    set_trigger(ctx, 1, mode, function);
}

fn clear_counter(ctx: &mut Ctx) {
    ctx.device.counter.count = 0;
    ctx.link.ack();
}
