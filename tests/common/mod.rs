#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use lox_interpreter as lox;

use lox::error::{LoxError, RunError};

/// In-memory `print` sink that stays readable after the interpreter takes
/// ownership of its clone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Outcome {
    pub output: String,
    pub result: Result<(), RunError>,
}

pub fn run(source: &str) -> Outcome {
    let buffer = SharedBuffer::default();
    let result = lox::run(source, Box::new(buffer.clone()));

    Outcome {
        output: buffer.contents(),
        result,
    }
}

/// Runs a program that must succeed and returns its printed lines.
pub fn run_lines(source: &str) -> Vec<String> {
    let outcome = run(source);

    if let Err(e) = &outcome.result {
        panic!("program failed:\n{}\n--- source ---\n{}", e, source);
    }

    outcome.output.lines().map(str::to_string).collect()
}

/// Runs a program that must fail at runtime; returns output so far and the
/// error.
pub fn run_runtime_error(source: &str) -> (String, LoxError) {
    let outcome = run(source);

    match outcome.result {
        Err(RunError::Runtime(e)) => (outcome.output, e),
        Err(RunError::Static(d)) => panic!("expected a runtime error, got static errors:\n{}", d),
        Ok(()) => panic!("expected a runtime error, program succeeded:\n{}", source),
    }
}

/// Runs a program that must be rejected statically; returns rendered errors.
pub fn static_errors(source: &str) -> Vec<String> {
    let outcome = run(source);

    match outcome.result {
        Err(RunError::Static(d)) => {
            assert!(outcome.output.is_empty(), "nothing may run after a static error");
            d.iter().map(|e| e.to_string()).collect()
        }
        Err(RunError::Runtime(e)) => panic!("expected static errors, got runtime error: {}", e),
        Ok(()) => panic!("expected static errors, program succeeded:\n{}", source),
    }
}
