use clap::{value_parser, Arg, ArgAction, Command};
use phae::evaluator::DEFAULT_MAX_CALL_DEPTH;
use phae::runner::{self, DEFAULT_SENTINEL};
use phae::{repl, Evaluator};
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

const EXIT_IO_ERROR: i32 = 4;

struct Options {
    sentinel: String,
    max_call_depth: usize,
    dump_tokens: bool,
}

fn cli() -> Command {
    Command::new("phae")
        .about("Interpreter for the Phae scripting language")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("file")
                .help("The script file to execute, or '-' to read the program from stdin")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sentinel")
                .long("sentinel")
                .value_name("TEXT")
                .help("Line that ends a program read from stdin")
                .default_value(DEFAULT_SENTINEL),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token stream of FILE instead of running it")
                .requires("file")
                .conflicts_with("interactive")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_name("N")
                .help("Maximum nesting of function calls")
                .value_parser(value_parser!(usize))
                .default_value("1000"),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = cli().get_matches();

    let options = Options {
        sentinel: matches
            .get_one::<String>("sentinel")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SENTINEL.to_string()),
        max_call_depth: matches
            .get_one::<usize>("max-depth")
            .copied()
            .unwrap_or(DEFAULT_MAX_CALL_DEPTH),
        dump_tokens: matches.get_flag("tokens"),
    };
    let file = matches
        .get_one::<String>("file")
        .filter(|_| !matches.get_flag("interactive"))
        .cloned();

    // The main thread's stack is too small for deep recursion in debug builds.
    let code = runner::on_interpreter_stack(options.max_call_depth, move || match file {
        Some(file) if file == "-" => run_stdin(&options),
        Some(file) => run_file(&file, &options),
        None => {
            repl::start(&options.sentinel, options.max_call_depth);
            0
        }
    });

    match code {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error starting interpreter thread: {}", e);
            process::exit(EXIT_IO_ERROR);
        }
    }
}

/// Reads the program from stdin up to the sentinel; the remaining lines
/// answer `input` statements.
fn run_stdin(options: &Options) -> i32 {
    let mut input = io::stdin().lock();
    let source = match runner::read_source(&mut input, &options.sentinel) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading program from stdin: {}", e);
            return EXIT_IO_ERROR;
        }
    };

    execute(&source, None, input, options)
}

fn run_file(path: &str, options: &Options) -> i32 {
    if !Path::new(path).exists() {
        eprintln!("Error: File '{}' not found", path);
        return EXIT_IO_ERROR;
    }

    match fs::read_to_string(path) {
        Ok(source) => execute(&source, Some(path), io::stdin().lock(), options),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path, e);
            EXIT_IO_ERROR
        }
    }
}

fn execute<R: BufRead>(source: &str, filename: Option<&str>, input: R, options: &Options) -> i32 {
    if options.dump_tokens {
        return match runner::dump_tokens(source, io::stdout().lock()) {
            Ok(()) => 0,
            Err(error) => {
                error.report(source, filename);
                error.exit_code()
            }
        };
    }

    info!(file = filename.unwrap_or("<stdin>"), "running program");
    let mut evaluator = Evaluator::new(input, io::stdout()).with_max_call_depth(options.max_call_depth);
    match runner::run(source, filename, &mut evaluator) {
        Ok(()) => 0,
        Err(error) => error.exit_code(),
    }
}
