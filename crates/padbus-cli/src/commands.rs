use std::str::FromStr;

use padbus::{Button, Input, UnknownButton};
use thiserror::Error;

/// A line typed into `padbus play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayCommand {
    Input(Input),
    /// Print the next pending feedback.
    Output,
    Exit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{0}: missing {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("{0}: unexpected argument {1}")]
    UnexpectedArgument(&'static str, String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    UnknownButton(#[from] UnknownButton),
}

pub(crate) const HELP: &str = "\
press <button>   hold a button (a, b, x, y, up, lb, start, ...)
release <button> let go of a button
lt <0-255>       set the left trigger
rt <0-255>       set the right trigger
ls <x> <y>       move the left stick
rs <x> <y>       move the right stick
<empty line>     show the next host feedback
exit             unplug and quit";

pub(crate) fn parse_command(line: &str) -> Result<PlayCommand, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(PlayCommand::Output);
    };
    let command = match name.to_ascii_lowercase().as_str() {
        "exit" | "quit" => PlayCommand::Exit,
        "press" => PlayCommand::Input(Input::Pressed(button(&mut words, "press")?)),
        "release" => PlayCommand::Input(Input::Released(button(&mut words, "release")?)),
        "lt" => PlayCommand::Input(Input::LeftTrigger(number(&mut words, "lt", "level")?)),
        "rt" => PlayCommand::Input(Input::RightTrigger(number(&mut words, "rt", "level")?)),
        "ls" => {
            let x = number(&mut words, "ls", "x")?;
            let y = number(&mut words, "ls", "y")?;
            PlayCommand::Input(Input::LeftStick(x, y))
        }
        "rs" => {
            let x = number(&mut words, "rs", "x")?;
            let y = number(&mut words, "rs", "y")?;
            PlayCommand::Input(Input::RightStick(x, y))
        }
        _ => return Err(CommandError::UnknownCommand(name.to_string())),
    };
    if let Some(extra) = words.next() {
        return Err(CommandError::UnexpectedArgument(
            command_name(&command),
            extra.to_string(),
        ));
    }
    Ok(command)
}

fn word<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, CommandError> {
    words
        .next()
        .ok_or(CommandError::MissingArgument(command, what))
}

fn button<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<Button, CommandError> {
    Ok(word(words, command, "button")?.parse()?)
}

fn number<'a, T: FromStr>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    what: &'static str,
) -> Result<T, CommandError> {
    let value = word(words, command, what)?;
    value
        .parse()
        .map_err(|_| CommandError::InvalidValue(value.to_string()))
}

fn command_name(command: &PlayCommand) -> &'static str {
    match command {
        PlayCommand::Input(Input::Pressed(_)) => "press",
        PlayCommand::Input(Input::Released(_)) => "release",
        PlayCommand::Input(Input::LeftTrigger(_)) => "lt",
        PlayCommand::Input(Input::RightTrigger(_)) => "rt",
        PlayCommand::Input(Input::LeftStick(..)) => "ls",
        PlayCommand::Input(Input::RightStick(..)) => "rs",
        PlayCommand::Output => "",
        PlayCommand::Exit => "exit",
    }
}
