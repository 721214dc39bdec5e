use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vsql::DataType;
use vsql::cli::{self, CheckOptions, CheckResult, CliError, CompileOptions};

#[derive(ClapParser)]
#[command(name = "vsql")]
#[command(about = "vSQL - typed expressions compiled to Oracle SQL")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON query description into SQL
    Compile {
        /// Query description (reads from stdin if not provided)
        file: Option<PathBuf>,

        /// Schema definition for field references
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Indentation level of the output
        #[arg(long, default_value_t = 0)]
        indent: usize,
    },

    /// Validate a serialized expression and print its type
    Check {
        /// Serialized expression (reads from stdin if not provided)
        file: Option<PathBuf>,

        /// Schema definition for field references
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Required type of the expression
        #[arg(short = 't', long = "type")]
        expected: Option<DataType>,
    },

    /// List datatypes and the aggregates they permit
    Types,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compile { file, schema, indent } => run_compile(file, schema, indent),
        Commands::Check { file, schema, expected } => run_check(file, schema, expected),
        Commands::Types => {
            print!("{}", cli::types_overview());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("VSQL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(file: Option<PathBuf>) -> Result<Option<String>, CliError> {
    match file {
        Some(path) => Ok(Some(fs::read_to_string(path)?)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn read_schema(schema: Option<PathBuf>) -> Result<Option<String>, CliError> {
    schema.map(fs::read_to_string).transpose().map_err(CliError::Io)
}

fn run_compile(file: Option<PathBuf>, schema: Option<PathBuf>, indent: usize) -> Result<(), CliError> {
    let options = CompileOptions {
        input: read_input(file)?,
        schema: read_schema(schema)?,
        indent,
    };
    print!("{}", cli::execute_compile(&options)?);
    Ok(())
}

fn run_check(file: Option<PathBuf>, schema: Option<PathBuf>, expected: Option<DataType>) -> Result<(), CliError> {
    let options = CheckOptions {
        input: read_input(file)?,
        schema: read_schema(schema)?,
        expected,
    };
    match cli::execute_check(&options)? {
        CheckResult::Valid(datatype) => println!("{}", datatype),
        CheckResult::Invalid(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    }
    Ok(())
}
