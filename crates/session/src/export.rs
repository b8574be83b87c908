//! CSV export of the ratings table, laid out like the sheets reviewers
//! already download: a leading unnamed row-index column, then the record.

use shared::domain::RatingRecord;
use thiserror::Error;

pub const EXPORT_HEADER: [&str; 5] = ["", "item", "Description", "Rating", "Timestamp"];
pub const EXPORT_FILE_NAME: &str = "ratings.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode ratings csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush ratings csv: {0}")]
    Flush(String),
    #[error("ratings csv is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub fn ratings_csv(records: &[RatingRecord]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADER)?;
    for (index, record) in records.iter().enumerate() {
        writer.write_record([
            index.to_string().as_str(),
            record.item.as_str(),
            record.description.as_str(),
            record.rating.as_str(),
            record.timestamp.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{ItemId, Rating};

    fn record(item: &str, description: &str, rating: Rating, timestamp: &str) -> RatingRecord {
        RatingRecord {
            item: ItemId::from(item),
            description: description.to_string(),
            rating,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn single_record_matches_existing_export_shape() {
        let csv = ratings_csv(&[record("x", "d", Rating::Good, "2024-01-01 00:00:00")])
            .expect("export");
        assert_eq!(
            csv,
            ",item,Description,Rating,Timestamp\n0,x,d,Good,2024-01-01 00:00:00\n"
        );
    }

    #[test]
    fn empty_store_exports_header_only() {
        let csv = ratings_csv(&[]).expect("export");
        assert_eq!(csv, ",item,Description,Rating,Timestamp\n");
    }

    #[test]
    fn rows_are_indexed_in_order_and_quoted_when_needed() {
        let csv = ratings_csv(&[
            record("a", "plain", Rating::Good, "2024-01-01 00:00:00"),
            record("b", "has, comma", Rating::Bad, "2024-01-01 00:00:01"),
            record("c", "say \"hi\"", Rating::Good, "2024-01-01 00:00:02"),
        ])
        .expect("export");

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "0,a,plain,Good,2024-01-01 00:00:00");
        assert_eq!(lines[2], "1,b,\"has, comma\",Bad,2024-01-01 00:00:01");
        assert_eq!(lines[3], "2,c,\"say \"\"hi\"\"\",Good,2024-01-01 00:00:02");
    }
}
