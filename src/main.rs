use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap::Subcommand;
use lambda_interpreter::{Interpreter, LangError, Lexer};
use miette::{IntoDiagnostic, NamedSource, Report, WrapErr};

#[derive(Parser, Debug)]
#[command(version, about = "Tokenize, parse or run a script")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the token stream, one token per line
    Tokenize { filename: PathBuf },
    /// Print the syntax tree as an S-expression
    Parse { filename: PathBuf },
    /// Evaluate the program
    Run { filename: PathBuf },
}

fn read(filename: &Path) -> miette::Result<String> {
    fs::read_to_string(filename)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading `{}` failed", filename.display()))
}

fn report(filename: &Path, source: &str, e: LangError) -> ! {
    let (line, column) = e.line_column(source);
    eprintln!("[line {line}, column {column}] Error: {e}");
    let report = Report::new(e).with_source_code(NamedSource::new(
        filename.display().to_string(),
        source.to_string(),
    ));
    eprintln!("{report:?}");
    std::process::exit(65);
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Tokenize { filename } => {
            let file_contents = read(&filename)?;
            for token in Lexer::new(&file_contents) {
                match token {
                    Ok(token) => println!("{token}"),
                    Err(e) => report(&filename, &file_contents, e),
                }
            }
            println!("EOF");
        }
        Commands::Parse { filename } => {
            let file_contents = read(&filename)?;
            let program = lambda_interpreter::Parser::new(&file_contents)
                .and_then(|parser| parser.parse())
                .unwrap_or_else(|e| report(&filename, &file_contents, e));
            println!("{program}");
        }
        Commands::Run { filename } => {
            let file_contents = read(&filename)?;
            if let Err(e) = Interpreter::stdout().run(&file_contents) {
                report(&filename, &file_contents, e);
            }
        }
    }
    Ok(())
}
