use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use psiarray::{loader, IndexConfig, PsiTable, Searchable, SuffixTable};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log construction progress at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the suffix array of a text and write it one offset per line
    BuildSa {
        /// Path to the text file
        #[arg(short, long)]
        text: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build a psi index and write it with bincode
    Index {
        #[command(flatten)]
        source: Source,

        #[command(flatten)]
        steps: Steps,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Look up queries; reads one query per line from stdin when none are given
    Search {
        /// Path to the text file
        #[arg(short, long, required_unless_present = "index")]
        text: Option<PathBuf>,

        /// Precomputed suffix array, one offset per line
        #[arg(long = "suffix-array")]
        suffix_array: Option<PathBuf>,

        /// Psi index written by the `index` command
        #[arg(long, conflicts_with_all = ["text", "suffix_array"])]
        index: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Oracle::Psi)]
        oracle: Oracle,

        #[command(flatten)]
        steps: Steps,

        queries: Vec<String>,
    },
    /// Print memory statistics of the suffix table and the psi index
    Stats {
        #[command(flatten)]
        source: Source,

        #[command(flatten)]
        steps: Steps,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Oracle {
    /// Plain suffix array
    Sa,
    /// Compressed psi index
    Psi,
}

#[derive(Args, Debug)]
struct Source {
    /// Path to the text file
    #[arg(short, long)]
    text: PathBuf,

    /// Precomputed suffix array, one offset per line
    #[arg(long = "suffix-array")]
    suffix_array: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct Steps {
    /// JSON file with compress_step, sample_step and sample_char_step
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    compress_step: Option<usize>,

    #[arg(long)]
    sample_step: Option<usize>,
}

impl Steps {
    fn resolve(&self) -> Result<IndexConfig> {
        let mut config = match &self.config {
            Some(path) => IndexConfig::read_from_file(path)?,
            None => IndexConfig::default(),
        };
        if let Some(step) = self.compress_step {
            config.compress_step = step;
        }
        if let Some(step) = self.sample_step {
            config.sample_step = step;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_table(text: &Path, suffix_array: Option<&Path>) -> Result<SuffixTable> {
    let text = loader::read_text(text)?;
    match suffix_array {
        Some(path) => {
            let table = loader::read_suffix_array(path)?;
            let table = SuffixTable::from_parts(text.into_boxed_slice(), table.into_boxed_slice())
                .with_context(|| format!("loading suffix array {:?}", path))?;
            if !table.is_sorted() {
                bail!("suffix array {:?} does not sort the text", path);
            }
            Ok(table)
        }
        None => Ok(SuffixTable::new(text)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::BuildSa { text, output } => {
            let table = SuffixTable::new(loader::read_text(&text)?);
            loader::write_suffix_array(&output, table.table())?;
            log::info!("wrote {} suffixes to {:?}", table.len(), output);
        }
        Command::Index {
            source,
            steps,
            output,
        } => {
            let config = steps.resolve()?;
            let table = load_table(&source.text, source.suffix_array.as_deref())?;
            let psi = PsiTable::from_table(&table, &config)?;

            let file = File::create(&output).with_context(|| format!("creating {:?}", output))?;
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, &psi)?;
            writer.flush()?;
            log::info!("wrote psi index to {:?}", output);
        }
        Command::Search {
            text,
            suffix_array,
            index,
            oracle,
            steps,
            queries,
        } => {
            let queries = if queries.is_empty() {
                io::stdin().lock().lines().collect::<io::Result<Vec<_>>>()?
            } else {
                queries
            };

            if let Some(path) = index {
                if oracle == Oracle::Sa {
                    bail!("--index only holds the psi oracle");
                }
                let file = File::open(&path).with_context(|| format!("opening {:?}", path))?;
                let psi: PsiTable = bincode::deserialize_from(BufReader::new(file))
                    .with_context(|| format!("reading psi index {:?}", path))?;
                log::info!(
                    "loaded psi index over {} suffixes ({:?})",
                    psi.len(),
                    psi.config()
                );
                return run_queries(&psi, &queries);
            }

            let Some(text) = text else {
                bail!("either --text or --index is required");
            };
            let table = load_table(&text, suffix_array.as_deref())?;
            match oracle {
                Oracle::Sa => run_queries(&table, &queries)?,
                Oracle::Psi => {
                    let psi = PsiTable::from_table(&table, &steps.resolve()?)?;
                    drop(table);
                    run_queries(&psi, &queries)?
                }
            }
        }
        Command::Stats { source, steps } => {
            let config = steps.resolve()?;
            let table = load_table(&source.text, source.suffix_array.as_deref())?;
            let psi = PsiTable::from_table(&table, &config)?;
            let stats = serde_json::json!({
                "suffix_table": table.memory_statistics(),
                "psi_table": psi.memory_statistics(),
                "config": config,
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn run_queries<S: Searchable>(index: &S, queries: &[String]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for query in queries {
        match index.find(query.as_bytes())? {
            Some(hit) => {
                let kind = if hit.is_exact() { "exact" } else { "partial" };
                writeln!(out, "{}\t{}\t{}", query, hit.value(), kind)?
            }
            None => writeln!(out, "{}\t-\tnot-found", query)?,
        }
    }
    out.flush()?;
    Ok(())
}
