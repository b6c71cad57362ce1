// UI layer: colored progress lines and visible pauses.
// Everything here writes to stdout for the person watching the run;
// diagnostics go through `tracing` instead.

use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::{Duration, Instant};

pub fn heading(msg: &str) {
    println!("{}", msg.magenta());
}

pub fn step(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn detail(msg: &str) {
    println!("{}", msg.blue());
}

pub fn warn(msg: &str) {
    println!("{}", msg.yellow().bold());
}

pub fn error(msg: &str) {
    println!("{}", msg.red());
}

/// A timed wait. The processor pauses through this so tests can observe
/// waits without sleeping.
pub trait Pause {
    fn pause(&mut self, duration: Duration, reason: &str);
}

/// Sleeps the current thread behind a spinner counting down the wait.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinnerPause;

impl Pause for SpinnerPause {
    fn pause(&mut self, duration: Duration, reason: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        let start = Instant::now();
        loop {
            let elapsed = start.elapsed();
            if elapsed >= duration {
                break;
            }
            let left = duration - elapsed;
            spinner.set_message(format!("{reason} ({}s)", left.as_secs() + 1));
            spinner.tick();
            thread::sleep(left.min(Duration::from_millis(200)));
        }
        spinner.finish_and_clear();
    }
}
