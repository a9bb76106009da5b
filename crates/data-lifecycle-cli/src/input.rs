// crates/data-lifecycle-cli/src/input.rs
// ============================================================================
// Module: CLI Inputs
// Description: Bounded reads from local files or S3, plus record decoding.
// Purpose: Turn operator-supplied CSV, JSON, and SQL inputs into typed data.
// Dependencies: aws-config, aws-sdk-s3, csv, serde_json, tokio
// ============================================================================

//! ## Overview
//! Inputs are named either by a local path or by an `s3://bucket/key` URI
//! and are read under a hard size limit. CSV files carry a header row and
//! may start with a UTF-8 byte order mark; every cell becomes a text value.
//! JSON inputs are arrays of objects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use data_lifecycle_core::RawItem;
use data_lifecycle_core::RawValue;
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::Runtime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of any CLI input.
pub(crate) const MAX_INPUT_BYTES: usize = 16 * 1024 * 1024;
/// URI scheme for S3 objects.
const S3_SCHEME: &str = "s3://";
/// UTF-8 byte order mark.
const UTF8_BOM: char = '\u{feff}';

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Input loading and decoding errors.
#[derive(Debug, Error)]
pub(crate) enum InputError {
    /// Local read failure.
    #[error("input io error: {0}")]
    Io(String),
    /// Input exceeds the size limit.
    #[error("input exceeds size limit: {size} bytes (limit {limit})")]
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
    /// Malformed input location.
    #[error("invalid input location: {0}")]
    Location(String),
    /// S3 request failure.
    #[error("input s3 error: {0}")]
    S3(String),
    /// Content could not be decoded.
    #[error("input parse error: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Locations
// ============================================================================

/// Where an input lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputLocation {
    /// Local file.
    Local(PathBuf),
    /// S3 object.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },
}

impl InputLocation {
    /// Parses a local path or an `s3://bucket/key` URI.
    pub(crate) fn parse(value: &str) -> Result<Self, InputError> {
        let Some(rest) = value.strip_prefix(S3_SCHEME) else {
            if value.trim().is_empty() {
                return Err(InputError::Location("path is empty".to_string()));
            }
            return Ok(Self::Local(PathBuf::from(value)));
        };
        match rest.split_once('/') {
            Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok(Self::S3 {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            _ => Err(InputError::Location(format!("expected s3://bucket/key, got {value}"))),
        }
    }

    /// Reads the input under [`MAX_INPUT_BYTES`].
    pub(crate) fn read(&self, region: Option<&str>) -> Result<Vec<u8>, InputError> {
        match self {
            Self::Local(path) => read_bytes_with_limit(path, MAX_INPUT_BYTES),
            Self::S3 {
                bucket,
                key,
            } => S3ObjectReader::new(region)?.read(bucket, key, MAX_INPUT_BYTES),
        }
    }
}

/// Reads a file from disk while enforcing a hard size limit.
pub(crate) fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, InputError> {
    let file = File::open(path)
        .map_err(|err| InputError::Io(format!("{}: {err}", path.display())))?;
    let size = file.metadata().map_err(|err| InputError::Io(err.to_string()))?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(InputError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| InputError::Io(err.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(InputError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: S3 Reader
// ============================================================================

/// Blocking reader for S3 objects.
struct S3ObjectReader {
    /// S3 client handle.
    client: Client,
    /// Tokio runtime for blocking SDK calls.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for S3ObjectReader {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = thread::spawn(move || drop(runtime));
        }
    }
}

impl S3ObjectReader {
    /// Creates a reader for the given region (environment default when unset).
    fn new(region: Option<&str>) -> Result<Self, InputError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| InputError::Io(err.to_string()))?;
        let shared_config = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = region {
                loader = loader.region(Region::new(region.to_string()));
            }
            loader.load().await
        });
        Ok(Self {
            client: Client::new(&shared_config),
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Downloads one object, rejecting bodies over `max_bytes`.
    fn read(&self, bucket: &str, key: &str, max_bytes: usize) -> Result<Vec<u8>, InputError> {
        let runtime = self
            .runtime
            .as_deref()
            .ok_or_else(|| InputError::S3("s3 reader closed".to_string()))?;
        let client = self.client.clone();
        let bytes = runtime.block_on(async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| InputError::S3(format!("{}", DisplayErrorContext(&err))))?;
            if let Some(length) = output.content_length()
                && usize::try_from(length).ok().is_none_or(|length| length > max_bytes)
            {
                return Err(InputError::TooLarge {
                    size: u64::try_from(length).unwrap_or(0),
                    limit: max_bytes,
                });
            }
            let data =
                output.body.collect().await.map_err(|err| InputError::S3(err.to_string()))?;
            Ok(data.into_bytes().to_vec())
        })?;
        if bytes.len() > max_bytes {
            return Err(InputError::TooLarge {
                size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
                limit: max_bytes,
            });
        }
        Ok(bytes)
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes UTF-8 text, dropping a leading byte order mark.
pub(crate) fn decode_text(bytes: &[u8]) -> Result<&str, InputError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| InputError::Parse("input must be utf-8".to_string()))?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}

/// One decoded CSV data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CsvRow {
    /// 1-based data row number (the header is row 0).
    pub(crate) number: usize,
    /// Cells keyed by header, or the reason the row is unusable.
    pub(crate) item: Result<RawItem, String>,
}

/// Decodes CSV text with a header row into raw items.
///
/// Short rows leave trailing fields absent; rows longer than the header are
/// rejected individually.
pub(crate) fn parse_csv_items(text: &str) -> Result<Vec<CsvRow>, InputError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
    let headers = reader.headers().map_err(|err| InputError::Parse(err.to_string()))?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(InputError::Parse("csv header row is empty".to_string()));
    }
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let number = index + 1;
        let item = match record {
            Ok(record) if record.len() > headers.len() => Err(format!(
                "row has {} cells but the header has {}",
                record.len(),
                headers.len()
            )),
            Ok(record) => Ok(headers
                .iter()
                .zip(record.iter())
                .map(|(name, cell)| (name.to_string(), RawValue::text(cell)))
                .collect()),
            Err(err) => Err(err.to_string()),
        };
        rows.push(CsvRow {
            number,
            item,
        });
    }
    Ok(rows)
}

/// Decodes a JSON array of objects into raw items.
pub(crate) fn parse_json_items(text: &str) -> Result<Vec<RawItem>, InputError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| InputError::Parse(err.to_string()))?;
    let Value::Array(elements) = value else {
        return Err(InputError::Parse("expected a json array of objects".to_string()));
    };
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            RawValue::item_from_json(element).ok_or_else(|| {
                InputError::Parse(format!("element {index} is not an object"))
            })
        })
        .collect()
}
