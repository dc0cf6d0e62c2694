//! Output sink for derived best quotes

use std::io::{self, Write};

use crate::error::Result;
use crate::orderbook::BestQuote;

/// Receives one best quote per processed cycle
#[cfg_attr(test, mockall::automock)]
pub trait QuoteSink {
    fn emit(&mut self, quote: &BestQuote) -> Result<()>;
}

/// Writes each quote as one text line
#[derive(Debug)]
pub struct LineSink<W: Write> {
    writer: W,
}

impl LineSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> QuoteSink for LineSink<W> {
    fn emit(&mut self, quote: &BestQuote) -> Result<()> {
        writeln!(self.writer, "{}", quote)?;
        self.writer.flush()?;
        Ok(())
    }
}
