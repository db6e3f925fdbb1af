//! Interactive channel reading one request per line.

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::time::{Duration, Instant};

use serde_json::json;

use super::{Channel, ChannelError, StopSignal};

const EXIT_COMMAND: &str = "exit";

/// Reads requests line by line from `R` and writes each response, followed by
/// a newline, to `W`.
///
/// Blank lines are skipped. End of input or the `exit` command stop the
/// worker.
#[derive(Debug)]
pub struct CommandLineChannel<R = BufReader<Stdin>, W = Stdout> {
    reader: R,
    writer: W,
    stop: StopSignal,
    read_time: Duration,
    write_time: Duration,
}

impl CommandLineChannel {
    /// Channel over the process's standard input and output.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> CommandLineChannel<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    /// Channel over arbitrary streams.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            stop: StopSignal::new(),
            read_time: Duration::ZERO,
            write_time: Duration::ZERO,
        }
    }

    /// Gives back the output stream.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R, W> Channel for CommandLineChannel<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn get_request(&mut self, buffer: &mut Vec<u8>) -> Result<bool, ChannelError> {
        let mut line = String::new();
        loop {
            if self.stop.is_raised() {
                return Ok(false);
            }
            line.clear();
            let started = Instant::now();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .map_err(|source| ChannelError::io("reading command line", source))?;
            self.read_time = started.elapsed();
            let command = line.trim();
            if bytes_read == 0 || command == EXIT_COMMAND {
                return Ok(false);
            }
            if !command.is_empty() {
                buffer.clear();
                buffer.extend_from_slice(command.as_bytes());
                return Ok(true);
            }
        }
    }

    fn write_response(&mut self, response: &[u8]) -> Result<(), ChannelError> {
        let started = Instant::now();
        self.writer
            .write_all(response)
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush())
            .map_err(|source| ChannelError::io("writing command line response", source))?;
        self.write_time = started.elapsed();
        Ok(())
    }

    fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    fn try_clone(&self) -> Result<Box<dyn Channel>, ChannelError> {
        Err(ChannelError::clone_unsupported("command line"))
    }

    fn request_read_time(&self) -> Duration {
        self.read_time
    }

    fn response_write_time(&self) -> Duration {
        self.write_time
    }

    fn sender_info(&self) -> String {
        "CommandLine".to_owned()
    }

    fn status(&self) -> serde_json::Value {
        json!({ "kind": "command_line", "stopped": self.stop.is_raised() })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn channel(input: &str) -> CommandLineChannel<Cursor<Vec<u8>>, Vec<u8>> {
        CommandLineChannel::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn reads_trimmed_lines_and_skips_blank_ones() {
        let mut channel = channel("\n  echo \"a, b\", 2  \n\nping\n");
        let mut buffer = Vec::new();
        assert!(channel.get_request(&mut buffer).expect("first"));
        assert_eq!(buffer, b"echo \"a, b\", 2");
        assert!(channel.get_request(&mut buffer).expect("second"));
        assert_eq!(buffer, b"ping");
        assert!(!channel.get_request(&mut buffer).expect("eof"));
    }

    #[test]
    fn exit_stops_the_worker() {
        let mut channel = channel("exit\nping\n");
        assert!(!channel.get_request(&mut Vec::new()).expect("exit"));
    }

    #[test]
    fn responses_end_with_a_newline() {
        let mut channel = channel("");
        channel.write_response(b"pong").expect("write");
        channel.write_response(b"again").expect("write");
        assert_eq!(channel.into_writer(), b"pong\nagain\n");
    }

    #[test]
    fn stopped_channels_read_nothing() {
        let mut channel = channel("ping\n");
        channel.shutdown();
        assert!(!channel.get_request(&mut Vec::new()).expect("stopped"));
        assert!(matches!(
            channel.try_clone(),
            Err(ChannelError::CloneUnsupported { .. })
        ));
    }
}
