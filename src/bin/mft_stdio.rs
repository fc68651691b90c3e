use std::error::Error;
use std::io::{self, Read, Write};

use mft_proto::{mft, Engine, Step};

fn stdio_main_loop() -> Result<(), Box<dyn Error>> {
    let mut engine = Engine::new(mft::COMMANDS, mft::Mft::default());
    let mut stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let mut data_in = [0; 64];
        let len = stdin.read(&mut data_in)?;
        if len == 0 {
            break;
        }
        let mut data = &data_in[..len];
        while !data.is_empty() {
            let accepted = engine.receive_data(data);
            data = &data[accepted..];
            while engine.step() == Step::Progress {
                stdout.write_all(&engine.take_output())?;
            }
            if accepted == 0 && engine.queued() > 0 {
                // the buffer holds a line too long to ever complete
                return Err("receive buffer overrun".into());
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    stdio_main_loop()
}
