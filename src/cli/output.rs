//! Handles all user-facing output for the CLI.
//!
//! Every printer writes to a `WriteColor` sink so the same code drives the
//! terminal and the in-memory buffers used in tests.

use std::io::{self, IsTerminal, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::manifest::{CheckOutcome, CheckReport};
use crate::path::ModelPath;
use crate::reference::UntypedReference;
use crate::types::TypeDescriptor;

/// Stdout with color only when attached to a terminal.
pub fn stdout() -> StandardStream {
    let choice = if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

pub fn print_path<W: WriteColor>(out: &mut W, path: &ModelPath) -> io::Result<()> {
    field(out, "path", &path.to_string())?;
    field(out, "depth", &path.depth().to_string())?;
    let parent = path
        .parent()
        .map_or_else(|| "-".to_string(), |p| p.to_string());
    field(out, "parent", &parent)?;
    field(out, "name", path.name().unwrap_or("-"))
}

pub fn print_type<W: WriteColor>(out: &mut W, descriptor: &TypeDescriptor) -> io::Result<()> {
    field(out, "type", &descriptor.to_string())?;
    field(out, "raw", &descriptor.raw_type().to_string())?;
    field(out, "parameterized", &descriptor.is_parameterized().to_string())
}

pub fn print_reference<W: WriteColor>(out: &mut W, reference: &UntypedReference) -> io::Result<()> {
    writeln!(out, "{reference}")
}

/// Prints one line per reference and a summary. Returns true when nothing failed.
pub fn print_check_report<W: WriteColor>(
    out: &mut W,
    manifest: &str,
    reports: &[CheckReport],
) -> io::Result<bool> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{manifest}")?;
    out.reset()?;

    let mut failed = 0;
    for report in reports {
        let (tag, color) = match &report.outcome {
            CheckOutcome::Resolved => ("ok", Color::Green),
            CheckOutcome::Assignable { .. } => ("assignable", Color::Cyan),
            CheckOutcome::Mismatch { .. } => ("mismatch", Color::Red),
            CheckOutcome::Missing => ("missing", Color::Red),
        };
        if report.outcome.is_failure() {
            failed += 1;
        }
        write!(out, "  ")?;
        out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(out, "{tag:<10}")?;
        out.reset()?;
        write!(
            out,
            " {}: {}",
            report.reference.path(),
            report.reference.descriptor()
        )?;
        match &report.outcome {
            CheckOutcome::Assignable { actual } | CheckOutcome::Mismatch { actual } => {
                writeln!(out, " (found {actual})")?
            }
            CheckOutcome::Resolved | CheckOutcome::Missing => writeln!(out)?,
        }
    }

    let passed = reports.len() - failed;
    let summary_color = if failed == 0 { Color::Green } else { Color::Red };
    out.set_color(ColorSpec::new().set_fg(Some(summary_color)))?;
    writeln!(out, "{passed} passed, {failed} failed")?;
    out.reset()?;
    Ok(failed == 0)
}

fn field<W: WriteColor>(out: &mut W, name: &str, value: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    write!(out, "{name}:")?;
    out.reset()?;
    writeln!(out, " {value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::Buffer;

    fn rendered(buffer: Buffer) -> String {
        String::from_utf8(buffer.into_inner()).unwrap()
    }

    #[test]
    fn path_fields() {
        let mut buffer = Buffer::no_color();
        print_path(&mut buffer, &ModelPath::parse("tasks.compile").unwrap()).unwrap();
        assert_eq!(
            rendered(buffer),
            "path: tasks.compile\ndepth: 2\nparent: tasks\nname: compile\n"
        );
    }

    #[test]
    fn root_path_fields() {
        let mut buffer = Buffer::no_color();
        print_path(&mut buffer, &ModelPath::root()).unwrap();
        assert_eq!(rendered(buffer), "path: <root>\ndepth: 0\nparent: -\nname: -\n");
    }

    #[test]
    fn check_report_lines() {
        let reports = vec![
            CheckReport {
                reference: UntypedReference::parse("a", "A").unwrap(),
                outcome: CheckOutcome::Resolved,
            },
            CheckReport {
                reference: UntypedReference::parse("b", "B").unwrap(),
                outcome: CheckOutcome::Mismatch {
                    actual: TypeDescriptor::raw("C").unwrap(),
                },
            },
        ];
        let mut buffer = Buffer::no_color();
        let ok = print_check_report(&mut buffer, "m.yaml", &reports).unwrap();
        assert!(!ok);
        let text = rendered(buffer);
        assert!(text.contains("ok         a: A\n"), "{text}");
        assert!(text.contains("mismatch   b: B (found C)\n"), "{text}");
        assert!(text.ends_with("1 passed, 1 failed\n"), "{text}");
    }
}
