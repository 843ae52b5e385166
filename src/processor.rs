//! Feed processor
//!
//! Reads feed records line by line, applies each to its symbol's book and
//! writes a report for every record that is rejected.

use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::{Config, DumpFormat};
use crate::error::{OrderBookError, Result};
use crate::orderbook::{OrderBook, OrderBookManager, Side};
use crate::parser::{Operation, Record};
use crate::stats::ProcessorStats;

/// Totals for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: u64,
    pub accepted: u64,
    pub rejected: u64,
    /// Books alive when the feed ended
    pub books: usize,
}

/// Dispatches feed records to the books they name
pub struct OrderProcessor {
    manager: OrderBookManager,
    config: Config,
    stats: ProcessorStats,
}

impl OrderProcessor {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            manager: OrderBookManager::new(),
            config,
            stats: ProcessorStats::new()?,
        })
    }

    pub fn manager(&self) -> &OrderBookManager {
        &self.manager
    }

    pub fn stats(&self) -> &ProcessorStats {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Apply one feed line.
    ///
    /// Returns the report to emit when the line is rejected: the error and
    /// the line, then the affected book's depth view if the book resolved.
    pub fn process_line(&mut self, line: &str) -> Option<String> {
        let record = match Record::parse(line, self.config.delimiter) {
            Ok(record) => record,
            Err(err) => return Some(reject(&self.stats, err, line, None)),
        };

        let book = match self.manager.get(&record.symbol) {
            Ok(book) => book,
            Err(err) => return Some(reject(&self.stats, err, line, None)),
        };

        match apply(book, &record) {
            Ok(drained) => {
                self.stats.record_applied(record.operation.code());
                // Only a delete that empties the book reclaims it
                if drained && self.manager.remove(&record.symbol).is_some() {
                    self.stats.record_reclaimed();
                }
                None
            }
            Err(err) => {
                let depth = self.config.print_book_on_error.then(|| book.to_string());
                Some(reject(&self.stats, err, line, depth.as_deref()))
            }
        }
    }

    /// Process every line of `reader`, writing rejection reports to `writer`
    pub async fn run<R, W>(&mut self, reader: R, writer: &mut W) -> Result<RunSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(delimiter = %self.config.delimiter, "Processing order feed");

        let mut lines = reader.lines();
        let mut summary = RunSummary::default();

        while let Some(line) = lines.next_line().await? {
            summary.records += 1;
            match self.process_line(&line) {
                None => summary.accepted += 1,
                Some(report) => {
                    summary.rejected += 1;
                    writer.write_all(report.as_bytes()).await?;
                }
            }
        }
        writer.flush().await?;

        summary.books = self.manager.len();
        info!(
            records = summary.records,
            accepted = summary.accepted,
            rejected = summary.rejected,
            books = summary.books,
            "Order feed processed"
        );
        Ok(summary)
    }

    /// Render the end-of-run dump of every book
    pub fn render_dump(&self, format: DumpFormat) -> Result<Option<String>> {
        match format {
            DumpFormat::Off => Ok(None),
            DumpFormat::Text => {
                let mut out = String::new();
                self.manager.print(&mut out).map_err(|_| {
                    OrderBookError::Serialization("failed to render depth view".to_string())
                })?;
                Ok(Some(out))
            }
            DumpFormat::Json => {
                let mut out = serde_json::to_string_pretty(&self.manager.snapshots())?;
                out.push('\n');
                Ok(Some(out))
            }
        }
    }
}

/// Open the feed file for buffered line reads
pub async fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).await?;
    debug!(path = %path.display(), "Opened order feed");
    Ok(BufReader::new(file))
}

/// Apply a parsed record; true when a delete left the book empty
fn apply(book: &mut OrderBook, record: &Record) -> Result<bool> {
    match record.operation {
        Operation::Add { side, size, price } => {
            let side = Side::try_from(side)?;
            book.add(side, record.id, size, price)?;
            Ok(false)
        }
        Operation::Modify { size, price } => {
            book.modify(record.id, size, price)?;
            Ok(false)
        }
        Operation::Delete => {
            book.delete(record.id)?;
            Ok(book.is_empty())
        }
    }
}

fn reject(stats: &ProcessorStats, err: OrderBookError, line: &str, depth: Option<&str>) -> String {
    warn!(kind = err.kind(), error = %err, line, "Rejected record");
    stats.record_rejected(&err);

    let mut report = format!("{}:{}\n", err, line);
    if let Some(depth) = depth {
        report.push_str(depth);
        report.push('\n');
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_processor() -> OrderProcessor {
        OrderProcessor::new(Config::default()).unwrap()
    }

    #[test]
    fn test_accepted_records_produce_no_report() {
        let mut processor = create_processor();
        assert!(processor.process_line("ABC|A|B|1|100|10.0").is_none());
        assert!(processor.process_line("ABC|A|S|2|80|10.5").is_none());
        assert!(processor.process_line("ABC|M|1|90|10.0").is_none());

        let book = processor.manager().find("ABC").unwrap();
        assert_eq!(book.order(1).unwrap().size, 90);
        assert_eq!(processor.stats().applied('A'), 2);
        assert_eq!(processor.stats().applied('M'), 1);
    }

    #[test]
    fn test_malformed_record_never_touches_registry() {
        let mut processor = create_processor();
        let report = processor.process_line("ABC|A|B|1|100").unwrap();
        assert_eq!(report, "Bad input line: missing price:ABC|A|B|1|100\n");

        let report = processor.process_line("ABC|Q|1").unwrap();
        assert_eq!(report, "Bad operation 'Q':ABC|Q|1\n");

        assert!(processor.manager().is_empty());
        assert_eq!(processor.manager().node_count(), 0);
        assert_eq!(processor.stats().rejected("malformed_record"), 1);
        assert_eq!(processor.stats().rejected("invalid_operation"), 1);
    }

    #[test]
    fn test_bad_symbol_is_reported_without_depth() {
        let mut processor = create_processor();
        let report = processor.process_line("AB9|D|1").unwrap();
        assert_eq!(report, "Invalid character '9' in symbol \"AB9\":AB9|D|1\n");
        assert_eq!(processor.manager().node_count(), 0);
    }

    #[test]
    fn test_book_error_reports_depth_view() {
        let mut processor = create_processor();
        processor.process_line("ABC|A|B|1|100|10.0");

        let report = processor.process_line("ABC|A|S|1|5|11.0").unwrap();
        let depth = processor.manager().find("ABC").unwrap().to_string();
        assert_eq!(
            report,
            format!("OrderID 1 already exists:ABC|A|S|1|5|11.0\n{}\n", depth)
        );
    }

    #[test]
    fn test_invalid_side_reports_depth_view() {
        let mut processor = create_processor();
        let report = processor.process_line("ABC|A|X|1|100|10.0").unwrap();
        assert!(report.starts_with("Bad side 'X':ABC|A|X|1|100|10.0\n"));
        assert!(report.contains("OrderCount"));
        assert_eq!(processor.stats().rejected("invalid_side"), 1);
    }

    #[test]
    fn test_depth_view_can_be_suppressed() {
        let config = Config {
            print_book_on_error: false,
            ..Config::default()
        };
        let mut processor = OrderProcessor::new(config).unwrap();
        let report = processor.process_line("ABC|D|5").unwrap();
        assert_eq!(report, "OrderID 5 does not exist:ABC|D|5\n");
    }

    #[test]
    fn test_draining_delete_reclaims_book() {
        let mut processor = create_processor();
        processor.process_line("XY|A|B|1|10|1.0");
        processor.process_line("XY|A|S|2|10|2.0");

        assert!(processor.process_line("XY|D|1").is_none());
        assert!(processor.manager().contains("XY"));

        assert!(processor.process_line("XY|D|2").is_none());
        assert!(processor.manager().find("XY").is_none());
        assert_eq!(processor.manager().node_count(), 0);
        assert_eq!(processor.stats().reclaimed(), 1);

        // A later reference starts from a fresh book
        assert!(processor.process_line("XY|A|B|1|5|1.0").is_none());
        assert_eq!(processor.manager().find("XY").unwrap().len(), 1);
    }

    #[test]
    fn test_failed_record_on_new_symbol_keeps_empty_book() {
        let mut processor = create_processor();
        let report = processor.process_line("NEW|M|3|1|1.0").unwrap();
        assert!(report.starts_with("OrderID 3 does not exist:NEW|M|3|1|1.0\n"));

        let book = processor.manager().find("NEW").unwrap();
        assert!(book.is_empty());
    }

    #[tokio::test]
    async fn test_run_writes_reports_and_summary() {
        let feed = "\
ABC|A|B|1|100|10.0
ABC|A|B|2|50|10.0
ABC|A|B|3|30|9.5
ABC|A|S|4|80|10.5

ABC|D|9
AA|A|S|1|1|1.0
";
        let mut processor = create_processor();
        let mut out = Vec::new();
        let summary = processor.run(feed.as_bytes(), &mut out).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                records: 7,
                accepted: 5,
                rejected: 2,
                books: 2,
            }
        );

        let out = String::from_utf8(out).unwrap();
        let depth = processor.manager().find("ABC").unwrap().to_string();
        assert_eq!(
            out,
            format!(
                "Bad input line: missing symbol:\nOrderID 9 does not exist:ABC|D|9\n{}\n",
                depth
            )
        );
    }

    #[tokio::test]
    async fn test_run_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "B|A|B|1|10|1.0").unwrap();
        writeln!(file, "AB|A|S|2|10|2.0").unwrap();
        writeln!(file, "AA|A|S|3|10|3.0").unwrap();
        writeln!(file, "AA|D|3").unwrap();

        let reader = open_input(file.path()).await.unwrap();
        let mut processor = create_processor();
        let mut out = Vec::new();
        let summary = processor.run(reader, &mut out).await.unwrap();

        assert_eq!(summary.rejected, 0);
        assert!(out.is_empty());
        assert_eq!(processor.manager().symbols(), vec!["AB", "B"]);
    }

    #[tokio::test]
    async fn test_open_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_input(&dir.path().join("missing.txt")).await;
        assert!(matches!(result, Err(OrderBookError::Io(_))));
    }

    #[test]
    fn test_render_dump() {
        let mut processor = create_processor();
        processor.process_line("AB|A|B|1|10|1.0");
        processor.process_line("AA|A|S|2|20|2.0");
        processor.process_line("B|A|S|3|30|3.0");

        assert!(processor.render_dump(DumpFormat::Off).unwrap().is_none());

        let text = processor.render_dump(DumpFormat::Text).unwrap().unwrap();
        let tickers: Vec<&str> = text.lines().filter(|l| l.starts_with("Ticker:")).collect();
        assert_eq!(tickers, vec!["Ticker: AA", "Ticker: AB", "Ticker: B"]);

        let json = processor.render_dump(DumpFormat::Json).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["symbol"], "AA");
        assert_eq!(value[0]["asks"][0]["total_size"], 20);
        assert_eq!(value[2]["metrics"]["ask_orders"], 1);
    }
}
