use crate::ast::Program;
use crate::error::{PhaeError, RuntimeErrorKind, Span};
use crate::evaluator::{stack_size_for, Evaluator};
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, BufRead, Write};
use std::panic;
use std::thread;
use tracing::debug;

/// Line that ends a program read from an interactive channel.
pub const DEFAULT_SENTINEL: &str = "END";

/// Collects program text up to a line equal to `sentinel` (surrounding
/// whitespace ignored) or the end of input. Lines after the sentinel are
/// left in `reader` for `input` statements.
pub fn read_source<R: BufRead>(reader: &mut R, sentinel: &str) -> io::Result<String> {
    let mut source = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line.trim() == sentinel {
            break;
        }
        source.push_str(line.trim_end_matches(&['\n', '\r'][..]));
        source.push('\n');
    }
    debug!(bytes = source.len(), "read program source");
    Ok(source)
}

/// Scans and parses a program.
pub fn compile(source: &str) -> Result<Program, PhaeError> {
    let tokens = Lexer::new(source).scan_tokens()?;
    Parser::new(tokens).parse()
}

/// Compiles and interprets `source`, stopping at the first error. Output
/// written before the error stays written.
pub fn run_source<R: BufRead, W: Write>(source: &str, evaluator: &mut Evaluator<R, W>) -> Result<(), PhaeError> {
    let program = compile(source)?;
    let result = evaluator.interpret(&program);

    let flushed = evaluator
        .output_mut()
        .flush()
        .map_err(|e| io_error(Span::single(0), e));
    result.and(flushed)
}

/// Like [`run_source`], but reports any error as a diagnostic on stderr.
pub fn run<R: BufRead, W: Write>(
    source: &str,
    filename: Option<&str>,
    evaluator: &mut Evaluator<R, W>,
) -> Result<(), PhaeError> {
    run_source(source, evaluator).map_err(|error| {
        error.report(source, filename);
        error
    })
}

/// Writes the token stream of `source`, one token per line.
pub fn dump_tokens<W: Write>(source: &str, mut out: W) -> Result<(), PhaeError> {
    let tokens = Lexer::new(source).scan_tokens()?;
    for token in &tokens {
        writeln!(out, "{}", token).map_err(|e| io_error(token.span.clone(), e))?;
    }
    out.flush().map_err(|e| io_error(Span::single(0), e))
}

/// Runs `f` on a thread with enough stack for `max_call_depth` nested calls,
/// so deep recursion ends in a depth error rather than a stack overflow.
/// A panic on that thread is resumed on the caller's.
pub fn on_interpreter_stack<F, T>(max_call_depth: usize, f: F) -> io::Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let stack_size = stack_size_for(max_call_depth);
    debug!(stack_size, max_call_depth, "spawning interpreter thread");
    let handle = thread::Builder::new()
        .name("phae-interpreter".to_string())
        .stack_size(stack_size)
        .spawn(f)?;
    Ok(handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
}

fn io_error(span: Span, error: io::Error) -> PhaeError {
    PhaeError::runtime_error(RuntimeErrorKind::Io, span, format!("I/O error: {}", error))
}
