//! Purpose: Hold top-level CLI command dispatch for `rawtree`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command prints exactly one JSON document on success.
//! Invariants: Helpers in `main.rs` remain the source of command business logic.

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "rawtree", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Inspect {
            buffer,
            source,
            section,
            pretty,
            range,
            strip_parens,
        } => {
            let options = snapshot_options(range, strip_parens);
            let (transfer, lock) = open_transfer(&buffer, &source)?;
            let value = section_json(&transfer, section, &options)
                .map_err(|err| err.with_path(&buffer))?;
            drop(transfer);
            drop(lock);
            emit_json(&value, pretty);
            Ok(RunOutcome::ok())
        }
        Command::Stats {
            buffer,
            source,
            only,
        } => {
            let (transfer, lock) = open_transfer(&buffer, &source)?;
            let value = stats_json(&transfer, &only).map_err(|err| {
                if err.kind() == ErrorKind::Usage {
                    err
                } else {
                    err.with_path(&buffer)
                }
            })?;
            drop(transfer);
            drop(lock);
            emit_json(&value, false);
            Ok(RunOutcome::ok())
        }
        Command::Layout { name, fingerprint } => {
            if fingerprint && name.is_some() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("--fingerprint cannot be combined with a name")
                    .with_hint("Use `rawtree layout --fingerprint` by itself."));
            }
            let value = layout_json(name.as_deref(), fingerprint)?;
            emit_json(&value, name.is_some());
            Ok(RunOutcome::ok())
        }
        Command::Sample {
            out,
            source_out,
            name,
            value,
            size,
        } => {
            if out == source_out {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("--out and --source-out must be different files"));
            }
            let summary = write_sample(&out, &source_out, &name, value, size)?;
            emit_json(&summary, false);
            Ok(RunOutcome::ok())
        }
    }
}
