//! Interactive read-eval-print loop.

use std::io::Write as _;

use linker_client::Session;
use linker_core::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::commands::{Flow, execute, parse_command};

/// Consecutive read failures tolerated before the loop gives up.
const MAX_READ_ERRORS: usize = 5;

/// Read commands from `input` until `exit`, `quit` or end of input.
///
/// A line that fails to parse or run is reported and the loop continues.
/// Lines that are not valid UTF-8 are skipped with a warning.
pub async fn run<R>(session: &mut Session, mut input: R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut read_errors = 0;

    loop {
        print!("linker> ");
        std::io::stdout().flush()?;

        buf.clear();
        match input.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => read_errors = 0,
            Err(e) => {
                read_errors += 1;
                tracing::warn!(error = %e, attempt = read_errors, "failed to read command");
                if read_errors >= MAX_READ_ERRORS {
                    return Err(e);
                }
                continue;
            }
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "skipping input line that is not valid UTF-8");
                println!("{}", Error::MalformedInput("input line is not valid UTF-8".into()));
                continue;
            }
        };

        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match execute(session, command).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => println!("{e}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linker_core::AppConfig;

    async fn make_session(dir: &std::path::Path) -> Session {
        let config = AppConfig {
            cache_dir: dir.join("cache"),
            reports_dir: dir.join("reports"),
            dsm_dir: dir.to_path_buf(),
            ..AppConfig::default()
        };
        Session::from_config(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(dir.path()).await;

        let input: &[u8] = b"help\n\xff\xfe\xfd\nset URL https://education.musc.edu/a\nquit\nset URL https://other.edu/\n";
        run(&mut session, input).await.unwrap();

        assert_eq!(session.url(), Some("https://education.musc.edu/a"));
    }

    #[tokio::test]
    async fn test_command_errors_do_not_end_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = make_session(dir.path()).await;

        let input: &[u8] = b"load Education abc\nlookup https://education.musc.edu/\nbogus\nset SELECTOR #content\n";
        run(&mut session, input).await.unwrap();

        assert_eq!(session.selector(), "#content");
    }
}
