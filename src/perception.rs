//! Landmark feed from an external perception process.
//!
//! Face mesh, hand and segmentation models run outside this crate. Their
//! results arrive as one JSON object per processed frame, one per line, in
//! the shape of [`LandmarkFrame`]:
//!
//! ```text
//! {"image_width":640,"image_height":480,"face":[{"x":0.51,"y":0.43,"z":-0.02},...],
//!  "hands":{"left":[...21 points...]},"segmentation":{"width":640,"height":480,"data":[...]}}
//! ```
//!
//! Missing keys mean nothing was detected. A line that cannot be decoded is
//! logged and counts as a frame without detections.

use crate::{landmarks::LandmarkFrame, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads [`LandmarkFrame`] records from a line-oriented JSON stream
pub struct JsonLinesFeed<R> {
    reader: R,
    buffer: String,
    line_number: usize,
    malformed: usize,
}

impl<R: BufRead> JsonLinesFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line_number: 0,
            malformed: 0,
        }
    }

    /// Read the next frame, `None` at end of stream
    ///
    /// Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading from the underlying stream fails
    pub fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                debug!("Landmark feed ended after {} lines", self.line_number);
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim();
            if line.is_empty() {
                continue;
            }

            return Ok(Some(match serde_json::from_str::<LandmarkFrame>(line) {
                Ok(frame) => frame,
                Err(e) => {
                    self.malformed += 1;
                    warn!("Skipping malformed landmark line {}: {e}", self.line_number);
                    LandmarkFrame::default()
                }
            }));
        }
    }

    /// Lines read so far, blank ones included
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Lines that could not be decoded
    #[must_use]
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

impl JsonLinesFeed<Box<dyn BufRead>> {
    /// Open a feed from a file path, or from standard input for `-`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader: Box<dyn BufRead> = if path == Path::new("-") {
            Box::new(BufReader::new(io::stdin()))
        } else {
            Box::new(BufReader::new(File::open(path)?))
        };
        Ok(Self::new(reader))
    }
}
