use std::io::{self, Write};

use anyhow::Error;

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    if let Some(hints) = HintCollector::collect(err) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn new() -> Self {
        Self {
            hints: Vec::new(),
            has_typed_hints: false,
        }
    }

    fn collect(err: &Error) -> Option<Vec<String>> {
        let mut collector = Self::new();

        collector.collect_io_hints(err);
        collector.collect_model_hints(err);

        if !collector.has_typed_hints {
            collector.collect_fallback_hints(err);
        }

        if collector.hints.is_empty() {
            None
        } else {
            Some(collector.hints)
        }
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn mark_typed(&mut self) {
        self.has_typed_hints = true;
    }

    fn collect_io_hints(&mut self, err: &Error) {
        use gmso::IoError;

        let Some(io_err) = err.chain().find_map(|e| e.downcast_ref::<IoError>()) else {
            return;
        };

        self.mark_typed();

        match io_err {
            IoError::Io { source } => self.collect_std_io_hints(source),

            IoError::Deserialize(_) => {
                self.add("The topology document is not valid TOML or has misplaced keys");
                self.add("Sections are [[atom_types]], [[connection_types]], [[sites]], [[bonds]], [[angles]], [[dihedrals]] and [[impropers]]");
            }

            IoError::Serialize(_) => {
                self.add("The topology could not be rendered as TOML");
                self.add("Check for non-finite parameter values or positions");
            }

            IoError::Resolve { .. } => {
                self.add("A reference in the document points to nothing");
                self.add("Sites name their atom type; connections use 0-based site and connection type indices");
            }

            // The wrapped library error is reported by collect_model_hints.
            IoError::Model { .. } => {}
        }
    }

    fn collect_std_io_hints(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("Check that the file path is correct");
            }
            ErrorKind::PermissionDenied => {
                self.add("Check file permissions with `ls -la`");
            }
            ErrorKind::InvalidData => {
                self.add("The input is not valid UTF-8 text");
            }
            _ => {
                self.add("An operating system I/O error occurred");
            }
        }
    }

    fn collect_model_hints(&mut self, err: &Error) {
        use gmso::Error as ModelError;

        let Some(model_err) = err.chain().find_map(|e| e.downcast_ref::<ModelError>()) else {
            return;
        };

        self.mark_typed();

        match model_err {
            ModelError::Expression { .. } => {
                self.add("Expressions use +, -, *, /, **, parentheses and functions such as exp, cos, sqrt");
            }

            ModelError::UnitParse(_) => {
                self.add("Quantities are written as \"<value> <unit>\", e.g. \"0.3 nm\" or \"1000 kJ/(mol*nm**2)\"");
                self.add("Known units include kJ, kcal, eV, nm, angstrom, mol, g, amu, e, K, rad and degree");
            }

            ModelError::Unit(_) => {
                self.add("A parameter has units of the wrong dimension for this operation");
            }

            ModelError::InvalidPotential { .. } => {
                self.add("Every parameter of a potential must appear in its expression");
                self.add("Independent variables cannot also be parameters");
            }

            ModelError::InvalidConnection(_) => {
                self.add("Bonds have 2 members, angles 3, dihedrals and impropers 4, all distinct");
                self.add("A connection's type must be of the same kind as the connection");
            }

            ModelError::InvalidSite { .. } => {
                self.add("Check that every site's atom_type names a defined [[atom_types]] entry");
            }

            ModelError::TemplateNotFound(_) => {
                self.add("Run `gmso templates` to list the available templates");
                self.add("Add your own with --templates FILE");
            }

            ModelError::TemplateParse(_) | ModelError::TemplateNameMismatch { .. } => {
                self.add("Each template is a TOML table whose key matches its `name` field");
                self.add("Required fields: name, expression, independent_variables");
            }

            ModelError::EngineIncompatibility { .. } => {
                self.add("No accepted template has the same functional form as this potential");
                self.add("Accept more templates with --accept, or convert the potential first");
                self.add("Parameter names must match the template's symbols");
            }

            ModelError::Conversion(_) => {
                self.add("OPLS to RB needs an OPLSTorsionPotential; RB to OPLS needs c5 = 0");
                self.add("All coefficients must carry energy units");
            }
        }
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = error_chain_text(err);

        if msg.contains("terminal") || msg.contains("stdin") {
            self.add("Input appears to be from a terminal");
            self.add("Provide input via -i/--input or pipe a document to stdin");
            return;
        }

        if msg.contains("no such file") || msg.contains("not found") {
            self.add("Check that the file path is correct");
            return;
        }

        if msg.contains("permission denied") {
            self.add("Check file permissions with `ls -la`");
        }
    }
}

fn error_chain_text(err: &Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}
