//! Purpose: `rawtree` CLI entry point: inspect, count, describe, and produce transfer buffers.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit JSON on stdout; logs and errors go to stderr.
//! Invariants: Errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Buffer files are read under a shared lock and written under an exclusive one.
#![allow(clippy::result_large_err)]
use std::cell::Cell;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use fs2::FileExt;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use rawtree::api::{
    BufferLock, BufferPool, Error, ErrorKind, NodeType, PoolOptions, RawTransfer, SnapshotOptions,
    ToRecord, Visitor, catalog, decode, decode_file, to_exit_code, traverse, write_const_program,
};

/// Default size of buffers written by `sample`.
const SAMPLE_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` overrides the level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `rawtree --help`."));
            }
        },
    };

    command_dispatch::dispatch_command(cli.command).map_err(add_discriminant_hint)
}

#[derive(Parser)]
#[command(
    name = "rawtree",
    version,
    about = "Lazy views over raw-transfer syntax tree buffers",
    long_about = None,
    after_help = r#"EXAMPLES
  $ rawtree sample --out tree.bin --source-out tree.js
  $ rawtree inspect tree.bin --source tree.js --pretty
  $ rawtree stats tree.bin --source tree.js --only IdentifierReference,NumericLiteral
  $ rawtree layout VariableDeclaration
  $ rawtree layout --fingerprint"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Section {
    Program,
    Comments,
    Module,
    Errors,
    All,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Decode a buffer and print its snapshot as JSON",
        after_help = r#"EXAMPLES
  $ rawtree inspect tree.bin --source tree.js
  $ rawtree inspect tree.bin --source tree.js --section module --pretty
  $ rawtree inspect tree.bin --source tree.js --range --strip-parens"#
    )]
    Inspect {
        #[arg(help = "Transfer buffer file", value_hint = ValueHint::FilePath)]
        buffer: PathBuf,
        #[arg(long, help = "Source text the buffer was produced from", value_hint = ValueHint::FilePath)]
        source: PathBuf,
        #[arg(long, value_enum, default_value = "all", help = "Part of the transfer to print")]
        section: Section,
        #[arg(long, help = "Pretty-print the JSON")]
        pretty: bool,
        #[arg(long, help = "Add a `range: [start, end]` pair to every node")]
        range: bool,
        #[arg(long, help = "Print parenthesized expressions as the expression inside")]
        strip_parens: bool,
    },
    #[command(
        about = "Count node types with the eager visitor",
        after_help = r#"EXAMPLES
  $ rawtree stats tree.bin --source tree.js
  $ rawtree stats tree.bin --source tree.js --only VariableDeclaration,NumericLiteral"#
    )]
    Stats {
        #[arg(help = "Transfer buffer file", value_hint = ValueHint::FilePath)]
        buffer: PathBuf,
        #[arg(long, help = "Source text the buffer was produced from", value_hint = ValueHint::FilePath)]
        source: PathBuf,
        #[arg(long, value_delimiter = ',', help = "Only count these node types")]
        only: Vec<String>,
    },
    #[command(
        about = "Describe the binary layout",
        long_about = r#"Describe the binary layout.

Without a name, lists every node, record, and union. With a name, prints that entry's
size, field offsets, sentinels, or discriminant table."#
    )]
    Layout {
        #[arg(help = "Node, record, or union name")]
        name: Option<String>,
        #[arg(long, help = "Print the layout version and table fingerprint")]
        fingerprint: bool,
    },
    #[command(
        about = "Write a `const <name> = <value>;` buffer and its source",
        after_help = r#"EXAMPLES
  $ rawtree sample --out tree.bin --source-out tree.js
  $ rawtree sample --out tree.bin --source-out tree.js --name answer --value 42"#
    )]
    Sample {
        #[arg(long, help = "Buffer file to write", value_hint = ValueHint::FilePath)]
        out: PathBuf,
        #[arg(long, help = "Source file to write", value_hint = ValueHint::FilePath)]
        source_out: PathBuf,
        #[arg(long, default_value = "x", help = "Declared identifier")]
        name: String,
        #[arg(long, default_value_t = 1.0, help = "Initializer value")]
        value: f64,
        #[arg(long, default_value_t = SAMPLE_BUFFER_SIZE, help = "Buffer size in bytes (multiple of 16)")]
        size: usize,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ rawtree completion bash > ~/.local/share/bash-completion/completions/rawtree
  $ rawtree completion zsh > ~/.zfunc/_rawtree"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn read_source(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read source file")
            .with_path(path)
            .with_source(err)
    })
}

fn open_transfer(buffer: &Path, source: &Path) -> Result<(RawTransfer, BufferLock), Error> {
    let text = read_source(source)?;
    decode_file(buffer, text)
}

fn section_json(
    transfer: &RawTransfer,
    section: Section,
    options: &SnapshotOptions,
) -> Result<Value, Error> {
    match section {
        Section::Program => transfer.program().to_record_with(options),
        Section::Comments => transfer.comments()?.to_record_with(options),
        Section::Module => transfer.module().to_record_with(options),
        Section::Errors => transfer.errors()?.to_record_with(options),
        Section::All => {
            let mut map = Map::new();
            for (key, part) in [
                ("program", Section::Program),
                ("comments", Section::Comments),
                ("module", Section::Module),
                ("errors", Section::Errors),
            ] {
                map.insert(key.to_string(), section_json(transfer, part, options)?);
            }
            Ok(Value::Object(map))
        }
    }
}

fn snapshot_options(range: bool, strip_parens: bool) -> SnapshotOptions {
    SnapshotOptions::new()
        .with_range(range)
        .with_preserve_parens(!strip_parens)
}

fn stats_json(transfer: &RawTransfer, only: &[String]) -> Result<Value, Error> {
    let selected = if only.is_empty() {
        NodeType::ALL.to_vec()
    } else {
        only.iter()
            .map(|name| name.parse::<NodeType>())
            .collect::<Result<Vec<_>, _>>()?
    };
    let counts: Vec<Cell<u64>> = (0..NodeType::COUNT).map(|_| Cell::new(0)).collect();
    let mut visitor = Visitor::new();
    for node_type in &selected {
        let counts = &counts;
        visitor.on_enter(*node_type, move |node| {
            let slot = &counts[node.node_type().id()];
            slot.set(slot.get() + 1);
            Ok(())
        });
    }
    let program = transfer.program();
    traverse(&program, &mut visitor)?;
    drop(visitor);

    let mut by_type = BTreeMap::new();
    let mut total = 0;
    for node_type in selected {
        let count = counts[node_type.id()].get();
        if count > 0 {
            by_type.insert(node_type.name(), count);
            total += count;
        }
    }
    Ok(json!({ "total": total, "counts": by_type }))
}

fn layout_json(name: Option<&str>, fingerprint: bool) -> Result<Value, Error> {
    if fingerprint {
        return Ok(json!({
            "version": rawtree::api::LAYOUT_VERSION,
            "fingerprint": catalog::fingerprint()?,
        }));
    }
    let Some(name) = name else {
        let table = catalog::table();
        return Ok(json!({
            "version": table.version,
            "nodes": table.nodes.iter().map(|layout| layout.name).collect::<Vec<_>>(),
            "records": table.records.iter().map(|layout| layout.name).collect::<Vec<_>>(),
            "unions": table.unions.iter().map(|layout| layout.name).collect::<Vec<_>>(),
        }));
    };
    let entry = catalog::lookup(name).ok_or_else(|| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("no layout named `{name}`"))
            .with_hint("Run `rawtree layout` to list every name.")
    })?;
    serde_json::to_value(entry).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode layout")
            .with_source(err)
    })
}

/// Writes the fixture through a pooled buffer, checks it decodes, then saves both files.
fn write_sample(
    out: &Path,
    source_out: &Path,
    name: &str,
    value: f64,
    size: usize,
) -> Result<Value, Error> {
    let pool = BufferPool::new(PoolOptions::new(size).with_max_idle(1))?;
    let mut handle = pool.acquire();
    let source = write_const_program(handle.bytes_mut(), name, value)?;
    write_locked(out, handle.bytes())?;
    std::fs::write(source_out, &source).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write source file")
            .with_path(source_out)
            .with_source(err)
    })?;

    let transfer = decode(handle, source.clone())?;
    let statements = transfer.program().body()?.len();
    transfer.dispose();
    Ok(json!({
        "buffer": out.display().to_string(),
        "source": source_out.display().to_string(),
        "size": size,
        "text": source,
        "statements": statements,
        "pooled": pool.idle_count(),
    }))
}

fn write_locked(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let io_error = |message: &'static str| {
        move |err: io::Error| {
            Error::new(ErrorKind::Io)
                .with_message(message)
                .with_path(path)
                .with_source(err)
        }
    };
    let mut file: File = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(io_error("failed to open buffer file"))?;
    FileExt::lock_exclusive(&file).map_err(io_error("failed to lock buffer file"))?;
    file.set_len(0).map_err(io_error("failed to truncate buffer file"))?;
    file.write_all(bytes).map_err(io_error("failed to write buffer file"))?;
    file.flush().map_err(io_error("failed to flush buffer file"))?;
    FileExt::unlock(&file).map_err(io_error("failed to unlock buffer file"))?;
    tracing::debug!(path = %path.display(), len = bytes.len(), "wrote buffer file");
    Ok(())
}

fn emit_json(value: &Value, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Discriminant => "unexpected discriminant".to_string(),
        ErrorKind::Bounds => "read outside the buffer".to_string(),
        ErrorKind::Utf8 => "invalid UTF-8".to_string(),
        ErrorKind::Visitor => "visitor aborted".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    if let Some(union_name) = err.union_name() {
        inner.insert("union".to_string(), json!(union_name));
    }
    if let Some(discriminant) = err.discriminant() {
        inner.insert("discriminant".to_string(), json!(discriminant));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn add_discriminant_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Discriminant || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "The buffer was written by a producer with a different layout. Compare `rawtree layout --fingerprint`.",
    )
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
