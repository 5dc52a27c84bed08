use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use std::io::{self, Write};

/// Character offsets into the source text, end exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.start, other.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuntimeErrorKind {
    UndefinedVariable,
    UndefinedFunction,
    ArityMismatch,
    TypeMismatch,
    DivisionByZero,
    Overflow,
    InvalidRange,
    CallDepthExceeded,
    InputExhausted,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError(RuntimeErrorKind),
}

#[derive(Debug, Clone)]
pub struct PhaeError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl PhaeError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn runtime_error(kind: RuntimeErrorKind, span: Span, message: String) -> Self {
        Self::new(ErrorKind::RuntimeError(kind), span, message)
    }

    /// The runtime sub-kind, if this is a runtime error.
    pub fn runtime_kind(&self) -> Option<RuntimeErrorKind> {
        match self.kind {
            ErrorKind::RuntimeError(kind) => Some(kind),
            _ => None,
        }
    }

    /// Process exit status used by the `phae` binary.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::LexError | ErrorKind::ParseError => 2,
            ErrorKind::RuntimeError(_) => 3,
        }
    }

    /// Renders the error as an annotated diagnostic into `out`.
    pub fn write_report<W: Write>(&self, source: &str, filename: Option<&str>, out: W) -> io::Result<()> {
        let filename = filename.unwrap_or("<stdin>");

        let color = match self.kind {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError(_) => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError(_) => "Runtime Error",
        };

        // Clamp so an end-of-input span never points past the source.
        let len = source.chars().count();
        let start = self.span.start.min(len);
        let end = self.span.end.min(len).max(start);

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_message(format!("{}: {}", kind_str.fg(color), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder = report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .write((filename, Source::from(source)), out)
    }

    /// Renders the error on stderr, falling back to the plain message if the
    /// diagnostic cannot be written.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        if self.write_report(source, filename, io::stderr()).is_err() {
            eprintln!("Error: {}", self);
        }
    }
}

impl fmt::Display for PhaeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PhaeError {}
