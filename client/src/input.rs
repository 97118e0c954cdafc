//! Keyboard input for the terminal client

use log::debug;
use std::io::BufRead;
use tokio::sync::mpsc;

/// Reads stdin on a dedicated thread and forwards each line.
///
/// Blocking stdin reads would stall a runtime worker, so they live on a
/// plain thread. The channel closes when stdin hits EOF.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || forward_lines(std::io::stdin().lock(), &tx));
    rx
}

fn forward_lines<R: BufRead>(reader: R, tx: &mpsc::UnboundedSender<String>) {
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        if tx.send(line).is_err() {
            break;
        }
    }
    debug!("Input closed");
}
