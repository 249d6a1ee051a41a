//! Basic usage examples for the interpreter library.

use sweepvm::{Interpreter, InterpreterConfig};

fn arithmetic_example() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Arithmetic Example ===");
    let mut interpreter = Interpreter::compile("add 2 3", InterpreterConfig::default())?;
    interpreter.run()?;
    println!("tokens after reduction: {:?}", interpreter.tokens().iter().map(|t| &t.orig_str).collect::<Vec<_>>());
    Ok(())
}

fn print_example() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Print Example ===");
    let mut config = InterpreterConfig::default();
    config.print_buffer_enabled = true;
    let mut interpreter = Interpreter::compile("print \"Hi\"", config)?;
    interpreter.run()?;
    println!("program output: {}", interpreter.print_buffer());
    Ok(())
}

fn conditional_example() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Conditional Example ===");
    let mut interpreter = Interpreter::compile("if 1 q 42 q 99", InterpreterConfig::default())?;
    interpreter.run()?;
    println!("result: {:?}", interpreter.tokens()[0].data);
    Ok(())
}

fn error_handling_example() {
    println!("\n=== Error Handling Example ===");
    match Interpreter::compile("list 1 2 3", InterpreterConfig::default()) {
        Ok(_) => println!("unexpectedly compiled a program missing its `end`"),
        Err(e) => println!("correctly rejected: {e}"),
    }
}

fn main() {
    let examples: [(&str, fn() -> Result<(), Box<dyn std::error::Error>>); 3] = [
        ("Arithmetic", arithmetic_example),
        ("Print", print_example),
        ("Conditional", conditional_example),
    ];
    for (name, example) in examples {
        if let Err(e) = example() {
            println!("{name} failed: {e}");
        }
    }
    error_handling_example();
}
