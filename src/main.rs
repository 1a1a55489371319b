use std::io;
use io::{BufRead, Write};

use ansi_term::Colour::{Blue, Yellow};

use definer::Interpreter;

/// Shows pending prompts and the input header for `interpreter`.
fn show_header(interpreter: &mut Interpreter, output: &mut impl Write) -> io::Result<()> {
    for prompt in interpreter.take_prompts() {
        writeln!(output, "{}", Yellow.paint(prompt))?;
    }
    let current = interpreter.state().current;
    if let Some(unit) = interpreter.graph().get(current) {
        let header = match unit.representations().first() {
            Some(rep) => format!("{} {}", current, rep),
            None => current.to_string(),
        };
        writeln!(output, "{}", Blue.paint(header))?;
    }
    write!(output, "definer> ")?;
    output.flush()
}

fn main() -> io::Result<()> {
    env_logger::init();
    let mut input = io::stdin().lock();
    let mut output = io::stdout();
    let mut interpreter = Interpreter::new();
    while !interpreter.is_done() {
        show_header(&mut interpreter, &mut output)?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 { break; }
        interpreter.interpret(&line);
    }
    for prompt in interpreter.take_prompts() {
        writeln!(output, "{}", Yellow.paint(prompt))?;
    }
    Ok(())
}
