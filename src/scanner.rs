//! Whole-file scanning.
//!
//! [`BlockScanner`] runs the [`BlockParser`] from the first line to the last,
//! collecting every parsed block and every rejected one. Rejections never
//! stop the scan; the parser resumes from wherever the failing block left
//! the cursor.

use tracing::debug;

use crate::models::ParsedBlock;
use crate::parser::{BlockParser, LineCursor, SkippedBlock};
use crate::timestamp::TimestampNormalizer;

/// Everything found in one export.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub blocks: Vec<ParsedBlock>,
    pub skipped: Vec<SkippedBlock>,
}

impl ScanReport {
    /// Number of blocks attempted.
    pub fn total(&self) -> usize {
        self.blocks.len() + self.skipped.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockScanner {
    parser: BlockParser,
}

impl BlockScanner {
    pub fn new(normalizer: TimestampNormalizer) -> Self {
        Self {
            parser: BlockParser::new(normalizer),
        }
    }

    pub fn scan_lines(&self, lines: &[&str]) -> ScanReport {
        let mut cursor = LineCursor::new(lines);
        let mut report = ScanReport::default();

        while let Some(result) = self.parser.next_block(&mut cursor) {
            match result {
                Ok(block) => {
                    debug!(
                        line = block.line,
                        date = %block.date,
                        time = %block.time,
                        freq_mhz = block.freq_mhz,
                        "parsed block"
                    );
                    report.blocks.push(block);
                }
                Err(skipped) => {
                    debug!(line = skipped.line, reason = %skipped.failure, "skipped block");
                    report.skipped.push(skipped);
                }
            }
        }

        report
    }

    /// Split `text` on `\n` / `\r\n` and scan it.
    pub fn scan_text(&self, text: &str) -> ScanReport {
        let lines: Vec<&str> = text.lines().collect();
        self.scan_lines(&lines)
    }
}
