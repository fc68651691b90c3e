#![allow(dead_code)]

use std::cell::RefCell;
use std::cmp::min;
use std::io::{Error, ErrorKind, Read, Write};
use std::rc::Rc;

use mft_proto::mft::{Mft, COMMANDS};
use mft_proto::{Engine, Step};

/// Host end of a simulated serial line.
pub struct SerialInterface {
    rx: Vec<u8>,
    rx_pos: usize,
    tx: Vec<u8>,
    /// Largest read handed out, to mimic bytes trickling in.
    pub chunk: usize,
    do_read_error: bool,
}

pub struct SerialIOPlane(Rc<RefCell<SerialInterface>>);

impl SerialIOPlane {
    pub fn new(serial_if: &Rc<RefCell<SerialInterface>>) -> SerialIOPlane {
        SerialIOPlane(serial_if.clone())
    }
}

impl SerialInterface {
    pub fn new(rx: &[u8]) -> Rc<RefCell<SerialInterface>> {
        Rc::new(RefCell::new(SerialInterface {
            rx: rx.to_vec(),
            rx_pos: 0,
            tx: Vec::new(),
            chunk: usize::MAX,
            do_read_error: false,
        }))
    }

    pub fn with_chunk(rx: &[u8], chunk: usize) -> Rc<RefCell<SerialInterface>> {
        let serial_if = Self::new(rx);
        serial_if.borrow_mut().chunk = chunk;
        serial_if
    }

    pub fn trigger_read_error(&mut self) {
        self.do_read_error = true;
    }

    /// Everything the device sent so far.
    pub fn sent(&self) -> &[u8] {
        &self.tx
    }
}

impl Read for SerialIOPlane {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut inner = self.0.borrow_mut();
        if inner.do_read_error {
            inner.do_read_error = false;
            return Err(Error::new(ErrorKind::PermissionDenied, "read error"));
        }
        let old_pos = inner.rx_pos;
        let len = min(min(buf.len(), inner.chunk), inner.rx.len() - old_pos);
        inner.rx_pos = old_pos + len;
        buf[..len].copy_from_slice(&inner.rx[old_pos..inner.rx_pos]);
        Ok(len)
    }
}

impl Write for SerialIOPlane {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().tx.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Device main loop: read what's available, step the engine until it's
/// idle, send the output. Returns when the line runs dry.
pub fn serve<IO: Read + Write>(engine: &mut Engine<Mft>, serial: &mut IO) -> std::io::Result<()> {
    'main: loop {
        let mut buf = [0; 32];
        let len = serial.read(&mut buf)?;
        if len == 0 {
            break 'main;
        }
        assert_eq!(engine.receive_data(&buf[..len]), len, "receive buffer overrun");
        while engine.step() == Step::Progress {}
        serial.write_all(&engine.take_output())?;
    }
    Ok(())
}

/// Run `input` through a fresh MFT engine, `chunk` bytes at a time, and
/// return the engine and everything it sent.
pub fn chat_chunked(input: &[u8], chunk: usize) -> (Engine<Mft>, Vec<u8>) {
    init_logger();
    let serial_sim = SerialInterface::with_chunk(input, chunk);
    let mut serial = SerialIOPlane::new(&serial_sim);
    let mut engine = Engine::new(COMMANDS, Mft::default());
    serve(&mut engine, &mut serial).unwrap();
    let sent = serial_sim.borrow().sent().to_vec();
    (engine, sent)
}

pub fn chat(input: &[u8]) -> (Engine<Mft>, Vec<u8>) {
    chat_chunked(input, usize::MAX)
}

/// Continue a session on an existing engine.
pub fn resume(engine: &mut Engine<Mft>, input: &[u8]) -> Vec<u8> {
    let serial_sim = SerialInterface::new(input);
    let mut serial = SerialIOPlane::new(&serial_sim);
    serve(engine, &mut serial).unwrap();
    let sent = serial_sim.borrow().sent().to_vec();
    sent
}
