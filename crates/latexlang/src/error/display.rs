use super::{Error, SourceLine};
use colored::*;

pub fn format_error(f: &mut std::fmt::Formatter<'_>, err: &Error) -> std::fmt::Result {
    let printer = Printer {
        indent: err.line.to_string().len() + 1,
    };
    writeln!(f, "{}: {}", "Error".bright_red().bold(), err.title().bold())?;
    printer
        .new_line()
        .without_separator()
        .with_indent_adjustment(1)
        .with_content(match err.source_line() {
            None => format!["{} line {}", ">>>".bright_cyan().bold(), err.line],
            Some(s) => format![
                "{} line {}, column {}",
                ">>>".bright_cyan().bold(),
                err.line,
                s.column + 1
            ],
        })
        .print(f)?;
    if let Some(s) = err.source_line() {
        fmt_source_line(&printer, f, err.line, s)?;
    }
    for note in err.notes() {
        printer.new_line().print(f)?;
        printer
            .new_line()
            .with_separator('=')
            .with_content(format!["{} {}", "note:".bold(), note])
            .print(f)?;
    }
    Ok(())
}

fn fmt_source_line(
    printer: &Printer,
    f: &mut std::fmt::Formatter<'_>,
    line_number: usize,
    s: &SourceLine,
) -> std::fmt::Result {
    printer.new_line().print(f)?;
    printer
        .new_line()
        .with_margin_content(format!["{line_number}"])
        .with_content(highlight_substring(&s.content, s.column, s.len))
        .print(f)?;
    printer
        .new_line()
        .with_content(format![
            "{}{}",
            " ".repeat(s.column),
            "^".repeat(s.len.max(1)).bright_red().bold(),
        ])
        .print(f)
}

fn highlight_substring(line: &str, start: usize, length: usize) -> String {
    match (line.get(..start), line.get(start..start + length), line.get(start + length..)) {
        (Some(a), Some(b), Some(c)) => format!["{}{}{}", a, b.bold(), c.trim_end()],
        _ => line.into(),
    }
}

struct Printer {
    indent: usize,
}

struct PrintLineBuilder<'a> {
    printer: &'a Printer,
    margin_content: String,
    separator: Option<char>,
    content: String,
    indent_adjustment: usize,
}

impl Printer {
    fn new_line(&self) -> PrintLineBuilder<'_> {
        PrintLineBuilder {
            printer: self,
            margin_content: "".into(),
            separator: Some('|'),
            content: "".into(),
            indent_adjustment: 0,
        }
    }
}

impl<'a> PrintLineBuilder<'a> {
    fn with_content<T: Into<String>>(mut self, content: T) -> Self {
        self.content = content.into();
        self
    }
    fn with_margin_content<T: Into<String>>(mut self, content: T) -> Self {
        self.margin_content = content.into();
        self
    }
    fn with_indent_adjustment(mut self, u: usize) -> Self {
        self.indent_adjustment = u;
        self
    }
    fn with_separator(mut self, c: char) -> Self {
        self.separator = Some(c);
        self
    }
    fn without_separator(mut self) -> Self {
        self.separator = None;
        self
    }

    fn print(self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indent: usize = self
            .printer
            .indent
            .saturating_sub(self.indent_adjustment)
            .saturating_sub(self.margin_content.len() + 1);
        let margin_content = format!["{}{} ", " ".repeat(indent), self.margin_content];
        let separator = match self.separator {
            None => "".to_string(),
            Some(c) => format!["{c} "],
        };
        writeln!(
            f,
            "{}{}{}",
            margin_content.bright_cyan(),
            separator.bright_cyan(),
            self.content
        )
    }
}
