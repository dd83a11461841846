use clap::Parser;
use latexlang::search::{Match, Matcher};
use latexlang::token::Encoding;
use latexlang::{NodeId, ParserOptions, Tree};
use rand::SeedableRng;
use std::io::Read;
use std::path::PathBuf;

fn main() {
    if let Err(err) = Cli::parse().run() {
        if !err.is_empty() {
            eprintln!("{err}");
        }
        std::process::exit(1);
    }
}

/// Tools for inspecting LaTeX parse trees.
#[derive(Debug, Parser)]
#[command(
    name = "latextree",
    author = "The Latexlang Project",
    version = "0.1",
    about,
    long_about,
    max_term_width(100)
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Initial encoding of the input: ascii, latin1, latin9, utf8 or utf8x.
    #[arg(short = 'e', long, default_value = "utf8", value_parser = parse_encoding)]
    encoding: Encoding,

    /// Additional environment whose body is not parsed, like `verbatim`.
    ///
    /// May be given multiple times.
    #[arg(long = "raw-env")]
    raw_environments: Vec<String>,

    /// Additional environment whose body is in math mode, like `align`.
    ///
    /// May be given multiple times.
    #[arg(long = "math-env")]
    math_environments: Vec<String>,

    /// Increase logging verbosity. May be repeated up to three times.
    ///
    /// The RUST_LOG environment variable overrides this flag.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_encoding(s: &str) -> Result<Encoding, String> {
    Encoding::from_inputenc_option(s).ok_or_else(|| {
        format!["unknown encoding `{s}`; expected one of ascii, latin1, latin9, utf8, utf8x"]
    })
}

impl Cli {
    fn run(self) -> Result<(), String> {
        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        let _ = env_logger::builder()
            .filter_level(level)
            .parse_default_env()
            .try_init();

        let mut options = ParserOptions::default().with_encoding(self.encoding);
        for name in self.raw_environments {
            options = options.with_raw_environment(name);
        }
        for name in self.math_environments {
            options = options.with_math_environment(name);
        }
        match self.command {
            Command::Check(check) => check.run(options),
            Command::Tree(tree) => tree.run(options),
            Command::Roundtrip(roundtrip) => roundtrip.run(options),
            Command::Search(search) => search.run(options),
            Command::Commands(commands) => commands.run(options),
            Command::Environments(environments) => environments.run(options),
            Command::Random(random) => random.run(),
        }
    }
}

#[derive(Clone, Debug, clap::Subcommand)]
enum Command {
    /// Check that a LaTeX file parses.
    ///
    /// Errors are reported with the offending source line highlighted.
    Check(Check),

    /// Print the parse tree of a LaTeX file.
    Tree(PrintTree),

    /// Check that rendering the parse tree of a LaTeX file reproduces the file exactly.
    Roundtrip(Roundtrip),

    /// Search a LaTeX file for a regular expression and print the matching nodes.
    ///
    /// Each match is resolved to the smallest run of sibling nodes that covers it.
    Search(Search),

    /// Print every use of a command.
    Commands(Commands),

    /// Print every instance of an environment.
    Environments(Environments),

    /// Print a random LaTeX document.
    ///
    /// The document is well formed and is useful for fuzzing and benchmarking.
    Random(Random),
}

/// Path to a LaTeX file, or `-` to read from standard input.
#[derive(Clone, Debug, clap::Args)]
struct Input {
    /// Path to the LaTeX file, or `-` for standard input.
    path: PathBuf,
}

impl Input {
    fn display_name(&self) -> String {
        if self.is_stdin() {
            "<stdin>".into()
        } else {
            self.path.display().to_string()
        }
    }

    fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    fn read(&self) -> Result<Vec<u8>, String> {
        if self.is_stdin() {
            let mut data = vec![];
            std::io::stdin()
                .read_to_end(&mut data)
                .map_err(|err| format!["failed to read standard input: {err}"])?;
            return Ok(data);
        }
        std::fs::read(&self.path)
            .map_err(|err| format!["failed to read file {}: {err}", self.path.display()])
    }

    fn parse(&self, options: ParserOptions) -> Result<(Vec<u8>, Tree), String> {
        let source = self.read()?;
        log::info!("parsing {} ({} bytes)", self.display_name(), source.len());
        match latexlang::parse_with_options(&source, options) {
            Ok(tree) => Ok((source, tree)),
            Err(err) => Err(format!["{err}"]),
        }
    }
}

#[derive(Clone, Debug, clap::Args)]
struct Check {
    #[command(flatten)]
    input: Input,

    /// Print plain error messages instead of annotated reports.
    #[arg(long)]
    plain: bool,
}

impl Check {
    fn run(self, options: ParserOptions) -> Result<(), String> {
        let source = self.input.read()?;
        let err = match latexlang::parse_with_options(&source, options) {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };
        if self.plain {
            return Err(format!["{err}"]);
        }
        let name = self.input.display_name();
        let cache: (&str, _) = (
            &name,
            ariadne::Source::from(String::from_utf8_lossy(&source).into_owned()),
        );
        if let Err(print_err) = err.ariadne_report(&name).eprint(cache) {
            return Err(format!["{err}\n(failed to print report: {print_err})"]);
        }
        Err("".into())
    }
}

#[derive(Clone, Debug, clap::Args)]
struct PrintTree {
    #[command(flatten)]
    input: Input,

    /// Print the tree as JSON.
    #[arg(long)]
    json: bool,

    /// On a parse error, print the tree built before the error.
    #[arg(long)]
    partial: bool,
}

impl PrintTree {
    fn run(self, options: ParserOptions) -> Result<(), String> {
        let source = self.input.read()?;
        let tree = match latexlang::parse_with_options(&source, options) {
            Ok(tree) => tree,
            Err(err) => {
                if self.partial {
                    if let Some(dump) = err.tree_dump() {
                        print!("{dump}");
                    }
                }
                return Err(format!["{err}"]);
            }
        };
        if self.json {
            let json = serde_json::to_string_pretty(&tree)
                .map_err(|err| format!["failed to serialize tree: {err}"])?;
            println!("{json}");
        } else {
            print!("{}", tree.dump(tree.root()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
struct Roundtrip {
    #[command(flatten)]
    input: Input,
}

impl Roundtrip {
    fn run(self, options: ParserOptions) -> Result<(), String> {
        let (source, tree) = self.input.parse(options)?;
        let output = tree.to_latex(tree.root());
        if output == source {
            println!("{}: ok ({} bytes)", self.input.display_name(), source.len());
            return Ok(());
        }
        let offset = source
            .iter()
            .zip(output.iter())
            .position(|(a, b)| a != b)
            .unwrap_or(source.len().min(output.len()));
        Err(format![
            "{}: rendered tree differs from the input at byte {offset} (line {})",
            self.input.display_name(),
            line_of(&source, offset)
        ])
    }
}

#[derive(Clone, Debug, clap::Args)]
struct Search {
    #[command(flatten)]
    input: Input,

    /// Regular expression to search for.
    pattern: String,

    /// Widen each match to its enclosing node this many times.
    #[arg(short = 'w', long, default_value_t = 0)]
    widen: usize,
}

impl Search {
    fn run(self, options: ParserOptions) -> Result<(), String> {
        let pattern = regex::bytes::Regex::new(&self.pattern)
            .map_err(|err| format!["invalid pattern: {err}"])?;
        let (_, tree) = self.input.parse(options)?;
        let matcher = Matcher::new(&tree);
        let matches = matcher.find_all(&pattern);
        log::info!("{} matches", matches.len());
        for mut m in matches {
            for _ in 0..self.widen {
                m = match matcher.parent_match(&m) {
                    None => break,
                    Some(parent) => parent,
                };
            }
            print_match(&tree, matcher.text(), &m);
        }
        Ok(())
    }
}

fn print_match(tree: &Tree, text: &[u8], m: &Match) {
    let kinds: Vec<String> = m
        .nodes
        .iter()
        .map(|id| format!["{:?}", tree.kind(*id)])
        .collect();
    println!(
        "line {}, bytes {}..{}: {}{}",
        line_of(text, m.start),
        m.start,
        m.end,
        kinds.join(" "),
        if m.exact { "" } else { " (inexact)" }
    );
    println!("    {}", String::from_utf8_lossy(&m.text).escape_debug());
}

#[derive(Clone, Debug, clap::Args)]
struct Commands {
    #[command(flatten)]
    input: Input,

    /// Name of the command, with or without the leading backslash.
    name: String,
}

impl Commands {
    fn run(self, options: ParserOptions) -> Result<(), String> {
        let (_, tree) = self.input.parse(options)?;
        for id in tree.find_commands(tree.root(), &self.name) {
            print_node(&tree, id);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
struct Environments {
    #[command(flatten)]
    input: Input,

    /// Name of the environment.
    name: String,
}

impl Environments {
    fn run(self, options: ParserOptions) -> Result<(), String> {
        let (_, tree) = self.input.parse(options)?;
        for id in tree.find_environments(tree.root(), &self.name) {
            print_node(&tree, id);
        }
        Ok(())
    }
}

fn print_node(tree: &Tree, id: NodeId) {
    println!("line {}: {}", tree.line(id), tree.to_latex_string(id));
}

#[derive(Clone, Debug, clap::Args)]
struct Random {
    /// Seed for the random number generator.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Number of top level constructs in the document.
    #[arg(short = 'n', long, default_value_t = 100)]
    items: usize,

    /// Maximum nesting depth.
    #[arg(short, long, default_value_t = 4)]
    depth: usize,
}

impl Random {
    fn run(self) -> Result<(), String> {
        let mut rng = rand::prelude::StdRng::seed_from_u64(self.seed);
        let weights = Default::default();
        let document =
            performance::generate_random_latex_document(&mut rng, self.items, self.depth, &weights);
        println!("{document}");
        Ok(())
    }
}

fn line_of(source: &[u8], offset: usize) -> usize {
    source[..offset.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}
