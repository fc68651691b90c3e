use anyhow::{bail, Context, Result};
use log::debug;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use mft_proto::ascii::{ACK, LF, NAK};
use mft_proto::Error;

/// Host side of one MFT serial link.
struct Console<IO: Read + Write> {
    port: IO,
}

/// What the board answered to one command.
#[derive(Debug, PartialEq)]
enum Reply {
    Ack(Option<String>),
    Nak,
}

impl<IO: Read + Write> Console<IO> {
    fn send(&mut self, line: &str) -> Result<()> {
        debug!("Sending {:?}", line);
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(&[LF])?;
        self.port.flush()?;
        Ok(())
    }

    /// Collect bytes until the port goes quiet.
    fn receive(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let mut buf = [0; 64];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(len) => data.extend_from_slice(&buf[..len]),
                Err(err) if err.kind() == ErrorKind::TimedOut => break,
                Err(err) => return Err(err.into()),
            }
        }
        debug!("Received {:?}", data);
        Ok(data)
    }

    fn command(&mut self, line: &str) -> Result<Reply> {
        self.send(line)?;
        let data = self.receive()?;
        match data.split_first() {
            Some((&NAK, _)) => Ok(Reply::Nak),
            Some((&ACK, rest)) => {
                let text = String::from_utf8_lossy(rest);
                let text = text.trim_end_matches(|c| c == '\n' || c == '\r');
                Ok(Reply::Ack((!text.is_empty()).then(|| text.to_string())))
            }
            Some(_) => bail!("Unexpected reply {:?}", String::from_utf8_lossy(&data)),
            None => bail!("No reply"),
        }
    }

    /// Ask the board why the last command failed.
    fn last_error(&mut self) -> Result<Option<Error>> {
        match self.command("GERR")? {
            Reply::Ack(Some(code)) => Ok(Error::from_code(code.parse().context("Bad GERR reply")?)),
            reply => bail!("Unexpected GERR reply {:?}", reply),
        }
    }
}

fn run_line<IO: Read + Write>(console: &mut Console<IO>, line: &str) -> Result<()> {
    match console.command(line)? {
        Reply::Ack(None) => println!("OK"),
        Reply::Ack(Some(value)) => println!("{}", value),
        Reply::Nak => match console.last_error()? {
            Some(err) => println!("NAK: {}", err),
            None => println!("NAK"),
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args();
    args.next(); // Skip program name
    let port = args.next().unwrap_or_else(|| "/dev/ttyACM0".to_string());
    let baud = match args.next() {
        Some(baud) => baud.parse().context("Invalid baud rate")?,
        None => 115_200,
    };

    let serial = serialport::new(&port, baud)
        .timeout(Duration::from_millis(100))
        .open()
        .with_context(|| format!("Failed to open serial port {}", port))?;
    let mut console = Console { port: serial };

    // drop anything the board sent at power up
    console.receive()?;

    let mut stdout = std::io::stdout();
    loop {
        print!(">> ");
        stdout.flush()?;
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Err(err) = run_line(&mut console, line) {
            println!("{:?}", err)
        }
    }
    Ok(())
}
