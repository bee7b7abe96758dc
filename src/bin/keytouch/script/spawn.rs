use crossbeam_channel::Sender;
use keytouch::log_debug;
use std::io::{self, BufRead, BufReader, Read};
use std::thread;

use super::command::parse_line;
use super::ScriptEvent;

pub(crate) fn spawn_script_thread(tx: Sender<ScriptEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || read_script(io::stdin(), &tx))
}

/// Forward parsed lines until EOF, a read error, or the receiver going away.
fn read_script<R: Read>(source: R, tx: &Sender<ScriptEvent>) {
    let reader = BufReader::new(source);
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log_debug(&format!("stdin read error: {err}"));
                break;
            }
        };
        let event = match parse_line(&line) {
            Ok(Some(command)) => ScriptEvent::Command(command),
            Ok(None) => continue,
            Err(message) => ScriptEvent::Invalid {
                line: index + 1,
                message,
            },
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptCommand;
    use crossbeam_channel::unbounded;
    use keytouch::keys::{KEY_5, KEY_POUND};

    #[test]
    fn forwards_commands_and_reports_bad_lines_with_numbers() {
        let (tx, rx) = unbounded();
        let script = "# open the grid\npress pound\n\nfrobnicate\npress 5\n";
        read_script(script.as_bytes(), &tx);
        drop(tx);
        let events: Vec<ScriptEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ScriptEvent::Command(ScriptCommand::Press(KEY_POUND)));
        assert!(matches!(events[1], ScriptEvent::Invalid { line: 4, .. }));
        assert_eq!(events[2], ScriptEvent::Command(ScriptCommand::Press(KEY_5)));
    }

    #[test]
    fn stops_when_receiver_is_gone() {
        let (tx, rx) = unbounded();
        drop(rx);
        read_script("press 1\npress 2\n".as_bytes(), &tx);
    }
}
