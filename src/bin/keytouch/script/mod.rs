//! Line-oriented key scripts read from stdin.

mod command;
mod spawn;

pub(crate) use command::ScriptCommand;
pub(crate) use spawn::spawn_script_thread;

/// One parsed stdin line, or the reason it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScriptEvent {
    Command(ScriptCommand),
    Invalid { line: usize, message: String },
}
