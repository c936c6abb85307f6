//! Command-line arguments.

use anyhow::{Result, bail};
use pond_types::SessionId;

pub const USAGE: &str = "\
Usage: pond [--session ID] [--reset] [--list]

  --session ID   play (or resume) the ritual stored under ID (default: \"default\")
  --reset        forget the ritual stored under the session id and exit
  --list         list archived memories and stored sessions, then exit
  -h, --help     show this help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(SessionId),
    Reset(SessionId),
    List,
    Help,
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut session = SessionId::default();
    let mut reset = false;
    let mut list = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--session" | "-s" => {
                let Some(id) = args.next().filter(|id| !id.trim().is_empty()) else {
                    bail!("--session needs a non-empty id");
                };
                session = SessionId::new(id.trim());
            }
            "--reset" => reset = true,
            "--list" => list = true,
            "-h" | "--help" => return Ok(Command::Help),
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(match (list, reset) {
        (true, true) => bail!("--list and --reset cannot be combined"),
        (true, false) => Command::List,
        (false, true) => Command::Reset(session),
        (false, false) => Command::Play(session),
    })
}
