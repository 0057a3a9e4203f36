use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use conditions::RunContext;
use detid::InterpreterRegistry;
use table::ValueKind;
use tools::{
    describe_id, dump_file, load_config, pack_fields, parse_assignment, parse_detector_id,
    parse_subdetector, resolve_report, ResolveRequest,
};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "condb",
    version,
    about = "Detector id and conditions table inspection tools"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the named fields of a detector id.
    Unpack {
        /// Raw id, decimal or 0x hexadecimal.
        id: String,
    },
    /// Build a detector id from field values.
    Pack {
        /// Subdetector number or name (ecal, hcal, tagger, recoil, trigscint, simspecial).
        subdetector: String,
        /// Field assignments such as `layer=3`.
        fields: Vec<String>,
    },
    /// Decode a conditions text file and print it re-encoded.
    Dump {
        /// Path to the table file.
        file: PathBuf,
        /// Value columns to load.
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,
        /// Cell value type.
        #[arg(long, value_enum, default_value_t = KindArg::Double)]
        kind: KindArg,
        /// Write one column per identifier field.
        #[arg(long)]
        expand: bool,
        /// Accept files keyed by identifier fields instead of `Id`.
        #[arg(long)]
        fields: bool,
    },
    /// Resolve one condition for a run from a JSON configuration.
    Resolve {
        /// Resolver configuration JSON.
        #[arg(long)]
        config: PathBuf,
        /// Condition name.
        #[arg(long)]
        name: String,
        /// Run number.
        #[arg(long)]
        run: u32,
        /// Treat the run as simulated.
        #[arg(long)]
        sim: bool,
        /// Print only the row of this id.
        #[arg(long)]
        id: Option<String>,
        /// Write one column per identifier field.
        #[arg(long)]
        expand: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Int,
    Double,
}

impl From<KindArg> for ValueKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Int => Self::Integer,
            KindArg::Double => Self::Double,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let registry =
        InterpreterRegistry::with_standard_layouts().context("build identifier layouts")?;

    match cli.command {
        Command::Unpack { id } => {
            let id = parse_detector_id(&id)?;
            println!("{}", describe_id(&registry, id));
        }
        Command::Pack {
            subdetector,
            fields,
        } => {
            let tag = parse_subdetector(&subdetector)?;
            let assignments = fields
                .iter()
                .map(|field| parse_assignment(field))
                .collect::<Result<Vec<_>>>()?;
            let id = pack_fields(&registry, tag, &assignments)?;
            println!("{}", describe_id(&registry, id));
        }
        Command::Dump {
            file,
            columns,
            kind,
            expand,
            fields,
        } => {
            let registry = (fields || expand).then_some(&registry);
            let text = dump_file(&file, &columns, kind.into(), registry, expand)?;
            print!("{text}");
        }
        Command::Resolve {
            config,
            name,
            run,
            sim,
            id,
            expand,
        } => {
            let config = load_config(&config)?;
            let id = id.as_deref().map(parse_detector_id).transpose()?;
            let request = ResolveRequest {
                name: &name,
                context: RunContext::new(run, sim),
                id,
                expand,
            };
            let report = resolve_report(&config, registry, request)
                .with_context(|| format!("resolve '{name}' for run {run}"))?;
            print!("{report}");
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
