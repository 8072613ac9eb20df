use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use lox_interpreter as lox;

use lox::ast_printer::AstPrinter;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to lox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its syntax tree
    Parse { filename: PathBuf },

    /// Evaluates a file containing a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a file as a Lox program
    Run { filename: PathBuf },
}

fn read_source(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source = fs::read_to_string(filename)
        .with_context(|| format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);
    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("lox.log").context("Failed to create lox.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("lox_interpreter::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to lox.log");
    Ok(())
}

fn tokenize(source: &str, json: bool) -> Result<i32> {
    let mut stdout = io::stdout().lock();
    let mut failed = false;

    for item in Scanner::new(source) {
        match item {
            Ok(token) if json => writeln!(stdout, "{}", serde_json::to_string(&token)?)?,
            Ok(token) => writeln!(stdout, "{}", token)?,
            Err(e) => {
                failed = true;
                eprintln!("{}", e);
            }
        }
    }

    Ok(if failed { 65 } else { 0 })
}

fn parse(source: &str) -> Result<i32> {
    let (tokens, diagnostics) = Scanner::new(source).scan_all();
    if diagnostics.has_errors() {
        eprintln!("{}", diagnostics);
        return Ok(65);
    }

    match Parser::new(&tokens).parse() {
        Ok(statements) => {
            println!("{}", AstPrinter::print_program(&statements));
            Ok(0)
        }
        Err(diagnostics) => {
            eprintln!("{}", diagnostics);
            Ok(65)
        }
    }
}

fn evaluate(source: &str) -> Result<i32> {
    let (tokens, diagnostics) = Scanner::new(source).scan_all();
    if diagnostics.has_errors() {
        eprintln!("{}", diagnostics);
        return Ok(65);
    }

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(65);
        }
    };

    let mut interpreter = Interpreter::new();
    let code = match interpreter.evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            70
        }
    };

    Ok(code)
}

fn run(source: &str) -> Result<i32> {
    match lox::run(source, Box::new(io::stdout())) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(0)
        }
        Err(e) => {
            debug!("Run failed: {:?}", e);
            eprintln!("{}", e);
            Ok(e.exit_code())
        }
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    }

    info!("CLI arguments: {:?}", args);

    let code = match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(&read_source(filename)?, *json)?,
        Commands::Parse { filename } => parse(&read_source(filename)?)?,
        Commands::Evaluate { filename } => evaluate(&read_source(filename)?)?,
        Commands::Run { filename } => run(&read_source(filename)?)?,
    };

    if code != 0 {
        process::exit(code);
    }

    Ok(())
}
