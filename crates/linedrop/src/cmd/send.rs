use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use bytes::Bytes;
use linedrop_session::{connect, ClientSession, SessionError, UploadOutcome};

use crate::cmd::SendArgs;
use crate::exit::{session_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_upload, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session =
        connect(args.addr.as_str()).map_err(|err| session_error("connect failed", err))?;

    let code = if let Some(path) = &args.file {
        send_file(&mut session, path, format)?
    } else {
        let stdin = std::io::stdin();
        prompt_loop(&mut session, &mut stdin.lock(), format)?
    };

    session
        .finish()
        .map_err(|err| session_error("session termination failed", err))?;

    Ok(code)
}

fn send_file<R: std::io::Read, W: Write>(
    session: &mut ClientSession<R, W>,
    path: &Path,
    format: OutputFormat,
) -> CliResult<i32> {
    let contents = fs::read(path).map_err(|err| {
        crate::exit::io_error(&format!("failed reading {}", path.display()), err)
    })?;
    let lines = split_lines(&contents);
    if lines.is_empty() {
        return Err(CliError::new(
            USAGE,
            format!("{} has no lines to send", path.display()),
        ));
    }

    let count = lines.len();
    let outcome = session
        .upload(lines)
        .map_err(|err| session_error("upload failed", err))?;
    print_upload(1, count, outcome, format);

    Ok(match outcome {
        UploadOutcome::Accepted => SUCCESS,
        UploadOutcome::Rejected => FAILURE,
    })
}

fn prompt_loop<R: std::io::Read, W: Write, I: BufRead>(
    session: &mut ClientSession<R, W>,
    input: &mut I,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut batch = 1usize;
    let mut any_rejected = false;

    loop {
        prompt("Lines in next batch (0 to finish): ");
        let count = match read_trimmed_line(input)? {
            Some(text) => parse_batch_size(&text)?,
            None => break, // stdin closed; terminate the session
        };
        if count == 0 {
            break;
        }

        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            match read_trimmed_line(input)? {
                Some(text) => lines.push(Bytes::from(text)),
                None => {
                    return Err(CliError::new(
                        USAGE,
                        format!("stdin closed after {} of {count} lines", lines.len()),
                    ))
                }
            }
        }

        match session.upload(lines) {
            Ok(outcome) => {
                print_upload(batch, count, outcome, format);
                if outcome == UploadOutcome::Rejected {
                    any_rejected = true;
                }
                batch += 1;
            }
            // The server answered outside the contract; the session is
            // still usable, so report and keep prompting.
            Err(SessionError::UnexpectedResponse { byte }) => {
                tracing::warn!(byte, "unexpected response to upload");
                any_rejected = true;
                batch += 1;
            }
            Err(err) => return Err(session_error("upload failed", err)),
        }
    }

    Ok(if any_rejected { FAILURE } else { SUCCESS })
}

fn prompt(text: &str) {
    let mut err = std::io::stderr();
    let _ = err.write_all(text.as_bytes());
    let _ = err.flush();
}

/// Read one console line, stripping the trailing newline (and a CR
/// left by Windows consoles). Returns `None` at end of input.
fn read_trimmed_line<I: BufRead>(input: &mut I) -> CliResult<Option<String>> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|err| crate::exit::io_error("failed reading stdin", err))?;
    if read == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

fn parse_batch_size(text: &str) -> CliResult<usize> {
    text.trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid line count: {text:?}")))
}

/// Split file contents on LF. A trailing newline does not produce a
/// final empty line; interior empty lines are kept.
fn split_lines(contents: &[u8]) -> Vec<Bytes> {
    if contents.is_empty() {
        return Vec::new();
    }
    let trimmed = contents.strip_suffix(b"\n").unwrap_or(contents);
    trimmed
        .split(|byte| *byte == b'\n')
        .map(Bytes::copy_from_slice)
        .collect()
}
