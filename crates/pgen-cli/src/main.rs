use anyhow::Context as _;
use clap::Parser;
use pgen::{emit::RustTables, Automaton, Config};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of grammar definition file.
    input: PathBuf,

    /// Print the states, items and actions of the automaton.
    #[arg(long)]
    dump: bool,

    /// Write the parse table as a Rust module to this path.
    #[arg(long, value_name = "OUT.rs")]
    emit: Option<PathBuf>,

    /// Parse this text with the generated table and print the AST.
    #[arg(long, value_name = "TEXT")]
    parse: Option<String>,

    /// Use SLR(1) lookaheads instead of LALR(1).
    #[arg(long)]
    slr: bool,

    #[arg(long, value_name = "N")]
    max_states: Option<usize>,

    #[arg(long, value_name = "N")]
    max_rules: Option<usize>,

    #[arg(long, value_name = "N")]
    max_symbols: Option<usize>,

    #[arg(long, value_name = "N")]
    max_augmented_rules: Option<usize>,

    #[arg(long, value_name = "N")]
    max_rhs_len: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let mut config = Config::new();
    if args.slr {
        config.use_slr();
    }
    if let Some(max) = args.max_states {
        config.max_states(max);
    }
    if let Some(max) = args.max_rules {
        config.max_rules(max);
    }
    if let Some(max) = args.max_symbols {
        config.max_symbols(max);
    }
    if let Some(max) = args.max_augmented_rules {
        config.max_augmented_rules(max);
    }
    if let Some(max) = args.max_rhs_len {
        config.max_rhs_len(max);
    }

    let automaton = config
        .generate(&source)
        .with_context(|| format!("failed to compile {}", args.input.display()))?;
    report_conflicts(&automaton);

    if args.dump {
        print!("{}", automaton.display());
    }

    if let Some(out_file) = &args.emit {
        emit(&automaton, out_file)?;
    }

    if let Some(text) = &args.parse {
        let node = pgen::parse_str(&automaton, text).context("failed to parse the input text")?;
        println!("{}", node);
    }

    Ok(())
}

fn report_conflicts(automaton: &Automaton) {
    let conflicts = automaton.conflicts();
    if conflicts.is_empty() {
        return;
    }
    println!(
        "[warning] The automaton has {} shift/reduce and {} reduce/reduce conflicts:",
        conflicts.shift_reduce(),
        conflicts.reduce_reduce()
    );
    for line in conflicts
        .display(automaton.rules(), automaton.symbols())
        .to_string()
        .lines()
    {
        println!("[warning]   {}", line);
    }
}

fn emit(automaton: &Automaton, out_file: &Path) -> anyhow::Result<()> {
    let mut generated: Vec<u8> = RustTables::new(automaton).to_string().into();

    // attempt to apply rustfmt to generated code.
    let sh = xshell::Shell::new()?;
    let res = xshell::cmd!(sh, "rustfmt --emit=stdout --color=never --quiet")
        .quiet()
        .stdin(&generated)
        .output();
    if let Ok(output) = res {
        if output.status.success() {
            generated = output.stdout;
        }
    }

    if out_file.exists() {
        let backup_file = out_file.with_extension("rs.bak");
        fs::copy(out_file, &backup_file).with_context(|| {
            anyhow::anyhow!(
                "failed to backup the output file to {}",
                backup_file.display()
            )
        })?;
    }
    fs::write(out_file, &generated).with_context(|| {
        anyhow::anyhow!("failed to write the parse table to {}", out_file.display())
    })?;
    Ok(())
}
