use crate::ast::{Expr, Stmt};
use crate::evaluator::Evaluator;
use crate::runner;
use crate::value::Value;
use std::io::{self, BufRead, Write};

/// Interactive session. Each program is entered over several lines and ended
/// with the sentinel line; variables and functions persist between programs.
pub fn start(sentinel: &str, max_call_depth: usize) {
    println!("Phae Interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("End each program with a line containing '{}'.", sentinel);
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut evaluator = Evaluator::stdio().with_max_call_depth(max_call_depth);

    loop {
        prompt("> ");

        match read_program(evaluator.input_mut(), sentinel) {
            Ok(Some(source)) => {
                if !source.trim().is_empty() {
                    run_repl_program(&source, &mut evaluator);
                }
            }
            Ok(None) => {
                println!();
                println!("Goodbye!");
                break;
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    // A prompt that fails to show is not worth ending the session over.
    let _ = io::stdout().flush();
}

/// Returns `None` when the user asks to leave or input ends before a
/// program was started.
fn read_program<R: BufRead>(input: &mut R, sentinel: &str) -> io::Result<Option<String>> {
    let mut source = String::new();

    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(if source.is_empty() { None } else { Some(source) });
        }

        let trimmed = line.trim();
        if trimmed == sentinel {
            return Ok(Some(source));
        }
        if source.is_empty() && (trimmed == "exit" || trimmed == "quit") {
            return Ok(None);
        }

        source.push_str(&line);
        prompt("... ");
    }
}

fn run_repl_program<R: BufRead, W: Write>(source: &str, evaluator: &mut Evaluator<R, W>) {
    let program = match runner::compile(source) {
        Ok(program) => program,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    // A lone call statement echoes its result, like an expression at a prompt.
    if let [Stmt::Call { name, args, span }] = program.statements.as_slice() {
        let call = Expr::Call {
            name: name.clone(),
            args: args.clone(),
            span: span.clone(),
        };
        match evaluator.evaluate_expression(&call) {
            Ok(Value::Absent) => {}
            Ok(value) => {
                let _ = evaluator.output_mut().flush();
                println!("{}", value);
            }
            Err(error) => {
                let _ = evaluator.output_mut().flush();
                error.report(source, None);
            }
        }
        return;
    }

    if let Err(error) = evaluator.interpret(&program) {
        let _ = evaluator.output_mut().flush();
        error.report(source, None);
    }
}
