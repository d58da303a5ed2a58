use std::io::{self, Write};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Numbered steps of a command.
///
/// On a terminal each running step shows a spinner on stderr and each
/// finished one a check mark with its notes. Otherwise the notes go to the
/// log at info level.
pub struct Progress {
    interactive: bool,
    total: u8,
    completed: u8,
    started: Instant,
    current: Option<Step>,
    spinner: Option<ProgressBar>,
}

struct Step {
    name: &'static str,
    started: Instant,
}

impl Progress {
    pub fn new(interactive: bool, total: u8) -> Self {
        Self {
            interactive,
            total,
            completed: 0,
            started: Instant::now(),
            current: None,
            spinner: None,
        }
    }

    pub fn begin(&mut self, name: &'static str) {
        self.clear_spinner();
        let label = step_label(self.completed + 1, self.total, name);
        if self.interactive {
            self.spinner = Some(spinner(label));
        } else {
            log::debug!("{label}");
        }
        self.current = Some(Step {
            name,
            started: Instant::now(),
        });
    }

    /// Ends the running step. Does nothing if no step was begun.
    pub fn done(&mut self, notes: &[String]) {
        self.clear_spinner();
        let Some(step) = self.current.take() else {
            return;
        };
        self.completed += 1;

        if self.interactive {
            let _ = write_step(&mut io::stderr().lock(), step.name, step.started.elapsed(), notes);
        } else {
            for note in notes {
                log::info!("{}: {}", step.name, note);
            }
        }
    }

    pub fn finish(mut self, summary: &str) {
        self.clear_spinner();
        let elapsed = self.started.elapsed();
        if self.interactive {
            let _ = write_footer(&mut io::stderr().lock(), summary, elapsed);
        } else {
            log::info!(
                "{} ({} of {} steps, {:.2}s)",
                summary,
                self.completed,
                self.total,
                elapsed.as_secs_f64()
            );
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(bar) = self.spinner.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Progress {
    /// A command that fails mid-step must not leave a spinner behind the
    /// error box.
    fn drop(&mut self) {
        self.clear_spinner();
    }
}

fn spinner(label: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .expect("spinner template is valid. This is a library bug.")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    bar.enable_steady_tick(Duration::from_millis(80));
    bar.set_message(label);
    bar
}

fn step_label(index: u8, total: u8, name: &str) -> String {
    format!("[{index}/{total}] {name}...")
}

fn write_step<W: Write>(
    out: &mut W,
    name: &str,
    elapsed: Duration,
    notes: &[String],
) -> io::Result<()> {
    writeln!(
        out,
        "  \x1b[32m✓\x1b[0m {:<44} {:>5.1}s",
        name,
        elapsed.as_secs_f64()
    )?;
    for note in notes {
        writeln!(out, "      \x1b[2m·\x1b[0m {note}")?;
    }
    Ok(())
}

fn write_footer<W: Write>(out: &mut W, summary: &str, elapsed: Duration) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  \x1b[2m╺━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━╸\x1b[0m"
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "  \x1b[32m✓\x1b[0m {:<30} {:>20}",
        summary,
        format!("Total: {:.2}s", elapsed.as_secs_f64())
    )?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn labels_are_numbered() {
        assert_eq!(step_label(2, 3, "Converting potentials"), "[2/3] Converting potentials...");
    }

    #[test]
    fn step_lists_its_notes_in_order() {
        let notes = vec!["4 dihedral types".to_string(), "real units".to_string()];
        let text = rendered(|out| write_step(out, "Converting", Duration::from_millis(1250), &notes));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Converting"));
        assert!(lines[0].ends_with("1.2s") || lines[0].ends_with("1.3s"));
        assert!(lines[1].ends_with("4 dihedral types"));
        assert!(lines[2].ends_with("real units"));
    }

    #[test]
    fn footer_reports_total_time() {
        let text = rendered(|out| write_footer(out, "Compatible", Duration::from_secs(2)));
        assert!(text.contains("Compatible"));
        assert!(text.contains("Total: 2.00s"));
    }

    #[test]
    fn silent_progress_counts_completed_steps() {
        let mut progress = Progress::new(false, 2);
        progress.done(&[]);
        assert_eq!(progress.completed, 0);

        progress.begin("Reading topology");
        progress.done(&["3 sites".to_string()]);
        progress.begin("Writing topology");
        progress.done(&[]);
        assert_eq!(progress.completed, 2);
        assert!(progress.current.is_none());
        progress.finish("Done");
    }
}
