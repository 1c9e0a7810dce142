use std::fs;

use anyhow::{anyhow, Result};
use clap::Parser;
use dfalex::Lexer;

#[derive(Parser)]
struct Cli {
    /// Token rule as KIND=PATTERN; earlier rules win ties.
    #[arg(short, long = "rule", required = true)]
    rules: Vec<String>,
    file: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let rules = args
        .rules
        .iter()
        .map(|rule| {
            rule.split_once('=')
                .ok_or_else(|| anyhow!("rule {rule:?} is not KIND=PATTERN"))
        })
        .collect::<Result<Vec<_>>>()?;
    let lexer = Lexer::new(rules)?;

    let text = fs::read_to_string(args.file)?;
    for token in lexer.lex(&text)? {
        println!("{}\t{:?}", token.kind, token.lexeme);
    }

    Ok(())
}
