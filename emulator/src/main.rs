mod session;

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process;

use crossterm::style::Stylize;
use signal_core::timing::Milliseconds;

use session::{Session, SessionConfig};

const USAGE: &str = "Usage: signal-emulator [--poll <ms>] [--transcript <path>]";

fn main() -> io::Result<()> {
    let config = parse_config(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut writer = stdout.lock();
    let mut session = Session::new(&config)?;
    let mut line = String::new();

    for notice in session.take_notifications()? {
        writeln!(writer, "{}", paint(&notice, color))?;
    }
    writeln!(
        writer,
        "Traffic light emulator ready (poll {}). Type `help` for commands or `exit` to quit.",
        config.poll_period
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed)? {
            writeln!(writer, "{}", paint(&response, color))?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Highlights lit lamps and errors when writing to a terminal.
fn paint(line: &str, color: bool) -> String {
    if !color {
        return line.to_string();
    }

    line.split(' ')
        .map(|token| match token {
            "red=on" => token.red().bold().to_string(),
            "green=on" => token.green().bold().to_string(),
            "ERR" => token.yellow().to_string(),
            _ => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_config<I>(args: I) -> Result<SessionConfig, String>
where
    I: IntoIterator<Item = String>,
{
    let mut config = SessionConfig::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };

        let mut value = |name: &str| {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("Expected value after {name}"))
        };

        match flag.as_str() {
            "--poll" => {
                let raw = value("--poll")?;
                let period = raw
                    .trim_end_matches("ms")
                    .parse::<u32>()
                    .ok()
                    .filter(|period| *period > 0)
                    .ok_or_else(|| format!("Invalid poll period `{raw}`"))?;
                config.poll_period = Milliseconds::new(period);
            }
            "--transcript" => {
                config.transcript_path = PathBuf::from(value("--transcript")?);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => return Err(format!("Unknown argument `{other}`")),
        }
    }

    Ok(config)
}
