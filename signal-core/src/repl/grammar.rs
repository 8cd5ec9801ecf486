//! Parser for the bench REPL.
//!
//! Lines are parsed directly from `&str` with `winnow` combinators. Keywords
//! are case-insensitive and durations accept `ms` or `s` suffixes, with bare
//! integers read as milliseconds.

use core::fmt;

use winnow::ascii::{Caseless, dec_uint, space1};
use winnow::combinator::{alt, opt, preceded};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::timing::Milliseconds;

/// Structured commands produced by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Drive the button line active and leave it there.
    Press,
    /// Return the button line to idle.
    Release,
    /// Press, hold for the optional duration, then release.
    Tap(Option<Milliseconds>),
    /// Advance the simulated clock.
    Wait(Milliseconds),
    Status,
    /// Show the most recent telemetry records.
    History(Option<u16>),
    Help(Option<&'a str>),
}

/// Error returned when a line does not match the grammar.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset into the trimmed line where parsing stopped.
    pub offset: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected input at column {}", self.offset + 1)
    }
}

/// Parse a REPL command from the provided line.
pub fn parse(line: &str) -> Result<Command<'_>, ParseError> {
    command.parse(line.trim()).map_err(|err| ParseError {
        offset: err.offset(),
    })
}

fn command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    alt((
        Caseless("press").value(Command::Press),
        Caseless("release").value(Command::Release),
        preceded(Caseless("tap"), opt(preceded(space1, duration))).map(Command::Tap),
        preceded(Caseless("wait"), preceded(space1, duration)).map(Command::Wait),
        Caseless("status").value(Command::Status),
        preceded(Caseless("history"), opt(preceded(space1, dec_uint))).map(Command::History),
        preceded(Caseless("help"), opt(preceded(space1, word))).map(Command::Help),
    ))
    .parse_next(input)
}

fn duration(input: &mut &str) -> ModalResult<Milliseconds> {
    (dec_uint::<_, u32, _>, opt(unit))
        .verify_map(|(value, scale)| value.checked_mul(scale.unwrap_or(1)))
        .map(Milliseconds::new)
        .parse_next(input)
}

fn unit(input: &mut &str) -> ModalResult<u32> {
    alt((Caseless("ms").value(1), Caseless("s").value(1_000))).parse_next(input)
}

fn word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-').parse_next(input)
}
