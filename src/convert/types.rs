//! Source format types

use crate::error::{Error, Result};
use arrow::csv::reader::Format;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Format of a downloaded source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceFormat {
    /// Already columnar, uploaded as downloaded
    Parquet,
    /// Delimited text, converted to Parquet before upload
    Delimited(DelimitedFormat),
}

impl SourceFormat {
    /// Tab separated, gzip compressed, `\N` for null (IMDB dumps)
    pub fn imdb_tsv() -> Self {
        Self::Delimited(DelimitedFormat {
            delimiter: '\t',
            gzip: true,
            has_header: true,
            null_token: Some("\\N".to_string()),
        })
    }

    /// Whether files need a conversion step before upload
    pub fn needs_conversion(&self) -> bool {
        matches!(self, Self::Delimited(_))
    }

    /// Check format options
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Parquet => Ok(()),
            Self::Delimited(format) => format.arrow_format().map(|_| ()),
        }
    }
}

/// Options for delimited text sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimitedFormat {
    /// Field delimiter (single ASCII character)
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Whether the file is gzip compressed
    #[serde(default)]
    pub gzip: bool,

    /// Whether the first row holds column names
    #[serde(default = "default_has_header")]
    pub has_header: bool,

    /// Exact field value read as null
    #[serde(default)]
    pub null_token: Option<String>,
}

fn default_delimiter() -> char {
    ','
}

fn default_has_header() -> bool {
    true
}

impl Default for DelimitedFormat {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            gzip: false,
            has_header: default_has_header(),
            null_token: None,
        }
    }
}

impl DelimitedFormat {
    /// Build the arrow csv format for these options
    pub fn arrow_format(&self) -> Result<Format> {
        if !self.delimiter.is_ascii() {
            return Err(Error::invalid_value(
                "format.delimiter",
                format!("'{}' is not an ASCII character", self.delimiter),
            ));
        }

        let mut format = Format::default()
            .with_header(self.has_header)
            .with_delimiter(self.delimiter as u8);

        if let Some(token) = &self.null_token {
            let pattern = format!("^{}$", regex::escape(token));
            let regex = Regex::new(&pattern)
                .map_err(|e| Error::invalid_value("format.null_token", e.to_string()))?;
            format = format.with_null_regex(regex);
        }

        Ok(format)
    }
}
