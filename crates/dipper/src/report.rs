//! Renders errors into user-facing diagnostics.
//!
//! Every diagnostic shows the offending source line with its neighbors and
//! a column arrow. Runtime errors additionally dump the failing frame: the
//! current instruction, its bytecode index, and the register file with
//! bound names.

use std::fmt::Write;

use crate::errors::{CompileError, ParseError, SourcePos, VmError};

const PREFIX: &str = "    ";

/// Builds the standard diagnostic: a header naming the file and position,
/// three source lines around the error with a column arrow, and the
/// exception name plus message.
#[must_use]
pub fn render(
    filename: &str,
    source: &str,
    pos: SourcePos,
    excname: &str,
    message: &str,
) -> String {
    let mut out = format!(
        "Error in file {filename} line {}, col {}:\n",
        pos.line, pos.col
    );
    for line in source_view(source, pos) {
        out.push_str(&line);
        out.push('\n');
    }
    if message.is_empty() {
        out.push_str(excname);
    } else {
        let _ = write!(out, "{excname}: {message}");
    }
    out
}

/// The source excerpt: the line before, the offending line, a column
/// arrow, and the line after. Lines outside the file are skipped.
fn source_view(source: &str, pos: SourcePos) -> Vec<String> {
    let mut view = Vec::new();
    if pos.line == 0 {
        return view;
    }
    let lines: Vec<&str> = source.lines().collect();
    let lineno = pos.line as usize;

    for shown in [lineno - 1, lineno] {
        if shown >= 1 {
            if let Some(text) = lines.get(shown - 1) {
                view.push(format!("{PREFIX}{shown}: {text}"));
            }
        }
    }
    if pos.col >= 1 {
        let mut pointer = "-".repeat(pos.col as usize - 1);
        pointer.push('^');
        view.push(format!("{PREFIX}   {pointer}"));
    }
    if let Some(text) = lines.get(lineno) {
        view.push(format!("{PREFIX}{}: {text}", lineno + 1));
    }
    view
}

/// Diagnostic for a parse error.
#[must_use]
pub fn render_parse(filename: &str, source: &str, err: &ParseError) -> String {
    render(filename, source, err.pos, "ParseError", &err.message)
}

/// Diagnostic for a compile error.
#[must_use]
pub fn render_compile(filename: &str, source: &str, err: &CompileError) -> String {
    render(filename, source, err.pos, "CompileError", &err.message)
}

/// Diagnostic for a runtime error: the source excerpt for the failing
/// instruction's annotation, plus the instruction and frame contents.
#[must_use]
pub fn render_runtime(filename: &str, source: &str, err: &VmError) -> String {
    let Some(trace) = &err.trace else {
        return format!("RuntimeError: {}", err.error);
    };
    let mut out = render(
        filename,
        source,
        trace.pos,
        "RuntimeError",
        &err.error.to_string(),
    );
    let _ = write!(
        out,
        "\n  in function '{}' at instruction {}: {}",
        trace.function, trace.instr_index, trace.instr
    );
    out.push_str("\n  frame registers:");
    for line in &trace.registers {
        let _ = write!(out, "\n    {line}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "fn main() {\n    return nope\n}\n";

    #[test]
    fn diagnostic_shows_context_and_arrow() {
        let rendered = render(
            "test.dip",
            SOURCE,
            SourcePos::new(2, 12),
            "CompileError",
            "variable 'nope' not defined",
        );
        assert!(rendered.starts_with("Error in file test.dip line 2, col 12:"));
        assert!(rendered.contains("    1: fn main() {"));
        assert!(rendered.contains("    2:     return nope"));
        assert!(rendered.contains("-----------^"));
        assert!(rendered.contains("    3: }"));
        assert!(rendered.ends_with("CompileError: variable 'nope' not defined"));
    }

    #[test]
    fn first_line_has_no_predecessor() {
        let rendered = render("t.dip", SOURCE, SourcePos::new(1, 1), "ParseError", "boom");
        assert!(!rendered.contains("0:"));
        assert!(rendered.contains("    1: fn main() {"));
    }

    #[test]
    fn stable_without_source() {
        let rendered = render("t.dip", "", SourcePos::new(9, 1), "E", "m");
        assert!(rendered.contains("line 9"));
        assert!(rendered.ends_with("E: m"));
    }
}
