use es5_interp::{DEFAULT_MAX_CALL_DEPTH, Interpreter, InterpreterOptions, JSError, TokenKind, TokenStream};
use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Scripts and the REPL run on a thread with this much stack.
const MAIN_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(clap::Parser)]
#[command(name = "js", version, about = "ECMAScript 5 interpreter")]
struct Cli {
    /// Execute script
    #[arg(short, long)]
    eval: Option<String>,

    /// Maximum nesting depth of function calls
    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,

    /// JavaScript file to execute
    file: Option<PathBuf>,
}

fn main() -> Result<(), BoxError> {
    env_logger::init();
    let cli = <Cli as clap::Parser>::parse();
    let handle = std::thread::Builder::new()
        .name("js-main".to_string())
        .stack_size(MAIN_STACK_SIZE)
        .spawn(move || run_main(cli))?;
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err("interpreter thread panicked".into()),
    }
}

fn run_main(cli: Cli) -> Result<(), BoxError> {
    let options = InterpreterOptions {
        max_call_depth: cli.max_depth,
        filename: cli.file.as_ref().map(|f| f.display().to_string()),
    };
    let script = if let Some(script) = cli.eval {
        script
    } else if let Some(ref file) = cli.file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file {}: {e}", file.display());
                std::process::exit(1);
            }
        }
    } else {
        return run_persistent_repl(options);
    };

    let mut interpreter = Interpreter::with_options(options)?;
    match interpreter.execute_string(&script, None) {
        Ok(value) => println!("{value}"),
        Err(err) => {
            report_error(&err);
            if let Some(file_path) = cli.file.as_ref() {
                eprintln!("  in file: {}", file_path.display());
            }
            std::process::exit(1);
        }
    }
    Ok(())
}

fn report_error(err: &JSError) {
    eprintln!("{}", err.user_message());
    log::debug!("script failed: {err:?}");
}

/// Whether every bracket opened in `source` has been closed, so a REPL
/// submission can be run instead of waiting for more lines.
fn is_complete_input(source: &str) -> bool {
    let mut tokens = TokenStream::new(source, None);
    let mut depth: i64 = 0;
    loop {
        match tokens.next().kind {
            TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
            TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => depth -= 1,
            TokenKind::Eof => return depth <= 0,
            TokenKind::Invalid => return true,
            _ => {}
        }
    }
}

#[allow(clippy::println_empty_string)]
fn run_persistent_repl(options: InterpreterOptions) -> Result<(), BoxError> {
    use rustyline::Editor;
    use rustyline::error::ReadlineError;

    let ver = clap::crate_version!();
    println!("ECMAScript 5 REPL v{ver}. Type 'exit' or Ctrl-D to quit.");

    let mut rl = Editor::<(), rustyline::history::FileHistory>::new()?;
    let history_path: Option<PathBuf> = std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".es5_repl_history"));
    if let Some(ref p) = history_path
        && let Err(e) = rl.load_history(p)
    {
        log::debug!("no REPL history loaded from {}: {e}", p.display());
    }

    let mut interpreter = Interpreter::with_options(options)?;
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "js> " } else { ".... " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if buffer.is_empty() && (trimmed == "exit" || trimmed == ".exit") {
                    break;
                }
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                if !is_complete_input(&buffer) {
                    continue;
                }
                if buffer.trim().is_empty() {
                    buffer.clear();
                    continue;
                }
                rl.add_history_entry(buffer.clone())?;
                match interpreter.execute_string(&buffer, Some("repl")) {
                    Ok(value) => println!("{value}"),
                    Err(e) => report_error(&e),
                }
                buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                println!("");
                buffer.clear();
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye");
                break;
            }
            Err(err) => {
                eprintln!("Readline error: {err}");
                break;
            }
        }
    }

    if let Some(ref p) = history_path {
        rl.save_history(p)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_tracks_brackets() {
        assert!(is_complete_input("1 + 2"));
        assert!(!is_complete_input("function f() {"));
        assert!(is_complete_input("function f() {\n return [1, (2)];\n}"));
        assert!(is_complete_input("'{'"));
    }
}
