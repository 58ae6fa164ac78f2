//! Month-partitioned output.
//!
//! Records are grouped by the calendar year and month of their timestamp and each group lands in
//! its own `payments-<year>-<month>` file. Existing files with the same name are replaced.
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Decimal128Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::Datelike;
use csv::WriterBuilder;
use log::{debug, info};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::prelude::ToPrimitive;

use crate::config::OutputFormat;
use crate::error::GenError;
use crate::record::{TransactionRecord, COLUMNS, NUM_DECIMAL_PLACES};

/// `(year, month)` of a record's timestamp.
pub type PartitionKey = (i32, u32);

pub const DECIMAL_PRECISION: u8 = 38;

#[must_use]
pub fn partition_key(record: &TransactionRecord) -> PartitionKey {
    (record.timestamp.year(), record.timestamp.month())
}

#[must_use]
pub fn partition(
    records: impl IntoIterator<Item = TransactionRecord>,
) -> BTreeMap<PartitionKey, Vec<TransactionRecord>> {
    let mut partitions: BTreeMap<PartitionKey, Vec<TransactionRecord>> = BTreeMap::new();
    for record in records {
        partitions
            .entry(partition_key(&record))
            .or_default()
            .push(record);
    }
    partitions
}

#[must_use]
pub fn file_name((year, month): PartitionKey, format: OutputFormat) -> String {
    format!("payments-{year}-{month:02}.{}", format.extension())
}

/// Arrow schema of every Parquet file written, fields in [`COLUMNS`] order.
#[must_use]
pub fn schema() -> SchemaRef {
    let utf8 = |name: &str| Field::new(name, DataType::Utf8, false);
    let int = |name: &str, nullable: bool| Field::new(name, DataType::Int64, nullable);
    #[allow(clippy::cast_possible_wrap)]
    let scale = NUM_DECIMAL_PLACES as i8;
    Arc::new(Schema::new(vec![
        utf8(COLUMNS[0]),
        int(COLUMNS[1], false),
        Field::new(
            COLUMNS[2],
            DataType::Decimal128(DECIMAL_PRECISION, scale),
            false,
        ),
        Field::new(
            COLUMNS[3],
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        utf8(COLUMNS[4]),
        int(COLUMNS[5], true),
        int(COLUMNS[6], true),
        int(COLUMNS[7], false),
        int(COLUMNS[8], false),
        utf8(COLUMNS[9]),
        utf8(COLUMNS[10]),
        utf8(COLUMNS[11]),
        Field::new(COLUMNS[12], DataType::Boolean, false),
        utf8(COLUMNS[13]),
        utf8(COLUMNS[14]),
        int(COLUMNS[15], true),
        utf8(COLUMNS[16]),
        utf8(COLUMNS[17]),
    ]))
}

/// # Errors
/// Errors when an amount cannot be held at [`NUM_DECIMAL_PLACES`] decimal places, or the columns
/// do not line up with [`schema`]
pub fn to_record_batch(records: &[TransactionRecord]) -> Result<RecordBatch, GenError> {
    fn strings<'a>(
        records: &'a [TransactionRecord],
        field: impl Fn(&'a TransactionRecord) -> &'a str,
    ) -> ArrayRef {
        Arc::new(StringArray::from_iter_values(records.iter().map(field)))
    }

    #[allow(clippy::cast_possible_wrap)]
    let scale = NUM_DECIMAL_PLACES as i8;
    let mantissas = records
        .iter()
        .map(|r| {
            let mut value = r.transaction_value;
            value.rescale(NUM_DECIMAL_PLACES);
            if value.scale() == NUM_DECIMAL_PLACES {
                Ok(value.mantissa())
            } else {
                Err(GenError::InvalidAmount(
                    r.transaction_value.to_f64().unwrap_or(f64::NAN),
                ))
            }
        })
        .collect::<Result<Vec<i128>, GenError>>()?;
    let values =
        Decimal128Array::from(mantissas).with_precision_and_scale(DECIMAL_PRECISION, scale)?;
    let timestamps = TimestampMicrosecondArray::from_iter_values(
        records.iter().map(|r| r.timestamp.timestamp_micros()),
    )
    .with_timezone("UTC");

    let columns: Vec<ArrayRef> = vec![
        strings(records, |r| r.id.as_str()),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.provider))),
        Arc::new(values),
        Arc::new(timestamps),
        strings(records, |r| r.merchant_name.as_str()),
        Arc::new(Int64Array::from_iter(records.iter().map(|r| r.merchant_ssn))),
        Arc::new(Int64Array::from_iter(records.iter().map(|r| r.merchant_mcc))),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.acquiring_bank),
        )),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.issuing_bank),
        )),
        strings(records, |r| r.hashed_customer_id.as_str()),
        strings(records, |r| r.network.as_str()),
        strings(records, |r| r.card_type.as_str()),
        Arc::new(BooleanArray::from(
            records.iter().map(|r| r.is_reversal).collect::<Vec<_>>(),
        )),
        strings(records, |r| r.transaction_status.as_str()),
        strings(records, |r| r.currency.as_str()),
        Arc::new(Int64Array::from_iter(
            records.iter().map(|r| r.merchant_location),
        )),
        strings(records, |r| r.device_type.as_str()),
        strings(records, |r| r.payment_method.as_str()),
    ];

    Ok(RecordBatch::try_new(schema(), columns)?)
}

fn write_parquet(path: &Path, records: &[TransactionRecord]) -> Result<(), GenError> {
    let batch = to_record_batch(records)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(File::create(path)?, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_csv(path: &Path, records: &[TransactionRecord]) -> Result<(), GenError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one file per `(year, month)` present in `records` under `output_dir`, creating the
/// directory when needed. Returns the written paths in chronological order.
///
/// # Errors
/// Errors when the directory or a file cannot be created, or a partition fails to serialize
pub fn write_partitions(
    records: Vec<TransactionRecord>,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<Vec<PathBuf>, GenError> {
    fs::create_dir_all(output_dir)?;
    debug!("Writing {} records to {}", records.len(), output_dir.display());

    let mut written = Vec::new();
    for (key, group) in partition(records) {
        let path = output_dir.join(file_name(key, format));
        match format {
            OutputFormat::Parquet => write_parquet(&path, &group)?,
            OutputFormat::Csv => write_csv(&path, &group)?,
        }
        info!("Wrote {} records to {}", group.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
