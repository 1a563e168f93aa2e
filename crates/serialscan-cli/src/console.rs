use serialscan_scanner::{EventSink, Verdict};

const CYAN: &str = "\x1b[36m";
const MAGENTA: &str = "\x1b[35m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Event sink that renders scan diagnostics onto the terminal.
///
/// Informational events print cyan, descriptor and graph summaries
/// magenta, warnings red, and the verdict green or red. With colour
/// disabled the same lines print without escape codes.
pub struct ConsoleSink {
    color: bool,
    quiet: bool,
}

impl ConsoleSink {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self { color, quiet }
    }

    fn paint(&self, code: &str, line: &str) {
        if self.color {
            println!("{code}{line}{RESET}");
        } else {
            println!("{line}");
        }
    }
}

impl EventSink for ConsoleSink {
    fn info(&mut self, message: &str) {
        if !self.quiet {
            self.paint(CYAN, &format!("* {message}"));
        }
    }

    fn warn(&mut self, message: &str) {
        self.paint(RED, &format!("* {message}"));
    }

    fn descriptor(&mut self, name: &str, suid: i64, num_fields: i16) {
        if !self.quiet {
            self.paint(MAGENTA, &format!("* {name} / {suid} / {num_fields}"));
        }
    }

    fn graph(&mut self, handle: usize, count: u32) {
        if !self.quiet {
            self.paint(
                MAGENTA,
                &format!("* handle {handle}: traversed {count} references"),
            );
        }
    }

    fn verdict(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Safe => self.paint(GREEN, "* verdict: safe"),
            Verdict::Unsafe { reason } => {
                self.paint(RED, &format!("* verdict: unsafe ({reason})"));
            }
        }
    }
}
