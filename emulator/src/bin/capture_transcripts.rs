use std::io;
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, SessionConfig};

/// Scripted sessions replayed into `transcripts/`.
const SCRIPTS: &[(&str, &[&str])] = &[
    (
        "mode-walk",
        &["status", "tap", "tap 60ms", "tap", "status", "tap", "history"],
    ),
    (
        "auto-cycle",
        &[
            "tap", "tap", "tap", "wait 3s", "wait 500ms", "wait 500ms", "status", "wait 5s",
            "wait 1ms", "history 12", "tap",
        ],
    ),
    ("debounce", &["tap 20ms", "tap 49ms", "tap 50ms", "press", "wait 2s", "release", "status"]),
];

fn main() -> io::Result<()> {
    for (name, commands) in SCRIPTS {
        record_script(name, commands)?;
    }
    Ok(())
}

fn record_script(name: &str, commands: &[&str]) -> io::Result<()> {
    let config = SessionConfig {
        transcript_path: PathBuf::from(format!("transcripts/{name}.log")),
        ..SessionConfig::default()
    };
    let mut session = Session::new(&config)?;
    session.take_notifications()?;
    for command in commands {
        let _ = session.handle_command(command)?;
    }
    Ok(())
}
