use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use narpassword::invoke::{parse_script, Invocation, Session, DEFAULT_BUFFER};
use narpassword::layout::{CHECKSUM_BYTE, COUNTER_BYTE, PASSWORD_LEN};
use narpassword::BitBuffer;
use serde_json::{json, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "narpassword", about = "Inspect and edit Metroid password buffers")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show counter and checksum of a buffer
    Inspect {
        /// Buffer bytes as hex
        buffer: BitBuffer,
    },
    /// Print the buffer with a corrected checksum
    FixChecksum { buffer: BitBuffer },
    /// Fail if the stored checksum is wrong
    Validate { buffer: BitBuffer },
    /// Rotate the window and print the buffer
    Rotate {
        buffer: BitBuffer,
        #[arg(short, long, value_enum, default_value_t = Direction::Left)]
        direction: Direction,
        /// Rotate by the counter byte instead of a single bit
        #[arg(long)]
        by_counter: bool,
        #[arg(short, long, default_value_t = 1)]
        times: usize,
    },
    /// Apply a JSON array of invocations, printing one result per line
    Run {
        script: PathBuf,
        /// Initial content of the working buffer (default: empty buffer)
        #[arg(short, long)]
        buffer: Option<BitBuffer>,
        /// Stop at the first failing invocation
        #[arg(long)]
        fail_fast: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Left,
    Right,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Inspect { buffer } => inspect(&buffer),
        Command::FixChecksum { mut buffer } => {
            buffer.fix_checksum()?;
            println!("{buffer}");
            Ok(())
        }
        Command::Validate { buffer } => validate(&buffer, &mut io::stdout().lock()),
        Command::Rotate {
            mut buffer,
            direction,
            by_counter,
            times,
        } => {
            for _ in 0..times {
                match (direction, by_counter) {
                    (Direction::Left, false) => buffer.rotate_left()?,
                    (Direction::Right, false) => buffer.rotate_right()?,
                    (Direction::Left, true) => buffer.rotate_left_by_counter()?,
                    (Direction::Right, true) => buffer.rotate_right_by_counter()?,
                }
            }
            println!("{buffer}");
            Ok(())
        }
        Command::Run {
            script,
            buffer,
            fail_fast,
        } => run(&script, buffer.unwrap_or_default(), fail_fast),
    }
}

fn inspect(buffer: &BitBuffer) -> anyhow::Result<()> {
    let password_len = buffer.len().min(PASSWORD_LEN);
    let password = buffer.get_bytes(0, password_len.saturating_sub(1))?;
    println!("password: {}", hex_line(password));
    println!("counter:  {}", buffer.get_byte(COUNTER_BYTE)?);
    let stored = buffer.get_byte(CHECKSUM_BYTE)?;
    let computed = buffer.checksum()?;
    println!("checksum: stored {stored:#04x}, computed {computed:#04x}");
    if stored != computed {
        warn!(stored, computed, "Checksum mismatch");
    }
    Ok(())
}

fn validate(buffer: &BitBuffer, out: &mut impl Write) -> anyhow::Result<()> {
    buffer.validate_checksum()?;
    writeln!(out, "checksum valid")?;
    Ok(())
}

fn hex_line(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn run(script: &Path, buffer: BitBuffer, fail_fast: bool) -> anyhow::Result<()> {
    let json = fs::read_to_string(script)
        .with_context(|| format!("Unable to read script {}", script.display()))?;
    let invocations = parse_script(&json).context("Unable to parse script")?;
    info!(count = invocations.len(), ?script, "Running script");

    let mut session = Session::with_buffer(DEFAULT_BUFFER, buffer);
    run_script(&mut session, &invocations, fail_fast, &mut io::stdout().lock())?;
    for name in session.names() {
        if let Some(buffer) = session.buffer(name) {
            info!(name, %buffer, "Final buffer");
        }
    }
    Ok(())
}

/// Applies `invocations` in order and writes one JSON line per invocation to `out`. Failing
/// invocations produce an `error` line, or end the run if `fail_fast` is set.
fn run_script(
    session: &mut Session,
    invocations: &[Invocation],
    fail_fast: bool,
    out: &mut impl Write,
) -> anyhow::Result<Vec<Value>> {
    let mut lines = Vec::with_capacity(invocations.len());
    for invocation in invocations {
        let line = match session.apply(invocation) {
            Ok(result) => json!({ "op": invocation.op, "result": result }),
            Err(err) if fail_fast => {
                return Err(err).with_context(|| format!("Invocation {:?} failed", invocation.op))
            }
            Err(err) => json!({ "op": invocation.op, "error": err.to_string() }),
        };
        writeln!(out, "{line}")?;
        lines.push(line);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::{run_script, validate};
    use anyhow::Result;
    use narpassword::invoke::{parse_script, Session};
    use narpassword::BitBuffer;
    use serde_json::json;

    const SCRIPT: &str = r#"[
        {"op": "setByte", "args": [6, 20]},
        {"op": "getBytes", "args": ["banana", 7]},
        {"op": "fixChecksum"},
        {"op": "getByte", "args": [17]}
    ]"#;

    #[test]
    fn continues_after_failing_invocation() -> Result<()> {
        let invocations = parse_script(SCRIPT)?;
        let mut session = Session::new();
        let mut out = Vec::new();
        let lines = run_script(&mut session, &invocations, false, &mut out)?;

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], json!({"op": "setByte", "result": null}));
        let error = lines[1]["error"].as_str().unwrap();
        assert!(error.contains("must be a number"));
        assert!(lines[1].get("result").is_none());
        assert_eq!(lines[3], json!({"op": "getByte", "result": 20}));

        let written = String::from_utf8(out)?;
        let written: Vec<serde_json::Value> = written
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?;
        assert_eq!(written, lines);
        Ok(())
    }

    #[test]
    fn fail_fast_stops_at_failing_invocation() -> Result<()> {
        let invocations = parse_script(SCRIPT)?;
        let mut session = Session::new();
        let mut out = Vec::new();
        let err = run_script(&mut session, &invocations, true, &mut out).unwrap_err();

        assert!(format!("{err:#}").contains("must be a number"));
        assert_eq!(String::from_utf8(out)?.lines().count(), 1);
        // the invocations after the failing one were not applied
        assert_eq!(session.buffer("working").unwrap().get_byte(17)?, 0);
        Ok(())
    }

    #[test]
    fn validate_reports_success() -> Result<()> {
        let mut buffer = BitBuffer::empty();
        buffer.set_byte(6, 20)?;
        buffer.set_byte(17, 30)?;
        let mut out = Vec::new();
        let err = validate(&buffer, &mut out).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("expected checksum"));
        assert!(out.is_empty());

        buffer.fix_checksum()?;
        validate(&buffer, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "checksum valid\n");
        Ok(())
    }
}
