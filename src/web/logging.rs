//! `tracing` output for the browser console

use std::io;

use wasm_bindgen::JsValue;

/// Buffers one formatted event and writes it to `console.log` on drop
#[derive(Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
    }
}

/// Install the console subscriber
///
/// No clock is available to the subscriber in the browser, so events carry
/// no timestamp.
pub fn init() {
    let installed = tracing_subscriber::fmt()
        .with_writer(ConsoleWriter::default)
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
