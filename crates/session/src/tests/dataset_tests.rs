use super::*;

use std::io::Write;

// "hello" / "world" in base64.
const CSV: &str = "item,description,image\nA,first item,aGVsbG8=\nB,\"second, with comma\",d29ybGQ=\n";

#[test]
fn parses_rows_in_file_order() {
    let items = parse_items(CSV.as_bytes()).expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, ItemId::from("A"));
    assert_eq!(items[0].description, "first item");
    assert_eq!(decode_image(&items[0]).expect("image"), b"hello");
    assert_eq!(items[1].id, ItemId::from("B"));
    assert_eq!(items[1].description, "second, with comma");
    assert_eq!(decode_image(&items[1]).expect("image"), b"world");
}

#[test]
fn ignores_extra_columns() {
    let csv = "id_col,item,description,image,notes\n1,A,desc,aGVsbG8=,extra\n";
    let items = parse_items(csv.as_bytes()).expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, ItemId::from("A"));
}

#[test]
fn tolerates_line_wrapped_base64() {
    let csv = "item,description,image\nA,desc,\"aGVs\nbG8=\"\n";
    let items = parse_items(csv.as_bytes()).expect("items");
    assert_eq!(items[0].image, "aGVsbG8=");
    assert_eq!(decode_image(&items[0]).expect("image"), b"hello");
}

#[test]
fn invalid_base64_only_fails_when_decoded() {
    let csv = "item,description,image\nA,alpha,aGVsbG8=\nB,beta,aGVsbG8=\nbroken,desc,***\n";
    let items = parse_items(csv.as_bytes()).expect("rows load without decoding");
    assert_eq!(items.len(), 3);
    assert_eq!(decode_image(&items[0]).expect("image"), b"hello");

    let err = decode_image(&items[2]).expect_err("invalid image");
    match err {
        DatasetError::InvalidImage { item, .. } => assert_eq!(item, ItemId::from("broken")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_duplicate_identifiers() {
    let csv = "item,description,image\nA,one,aGVsbG8=\nA,two,aGVsbG8=\n";
    let err = parse_items(csv.as_bytes()).expect_err("duplicate");
    assert!(matches!(err, DatasetError::DuplicateItem { item } if item == ItemId::from("A")));
}

#[test]
fn missing_image_column_is_malformed() {
    let csv = "item,description\nA,one\n";
    let err = parse_items(csv.as_bytes()).expect_err("no image column");
    assert!(matches!(err, DatasetError::Malformed { .. }));
}

#[test]
fn header_only_file_has_no_items() {
    let items = parse_items(b"item,description,image\n").expect("items");
    assert!(items.is_empty());
}

#[tokio::test]
async fn csv_file_reports_missing_source_with_user_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data.csv");
    let err = CsvFile::new(&path).load().await.expect_err("missing file");

    assert!(err.is_source_not_found());
    assert_eq!(
        err.to_string(),
        format!(
            "The file at path `{}` was not found. Please check the file path.",
            path.display()
        )
    );
}

#[tokio::test]
async fn csv_file_loads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(CSV.as_bytes()).expect("write csv");

    let source = CsvFile::new(file.path());
    let items = source.load().await.expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(source.describe(), file.path().display().to_string());
}

#[tokio::test]
async fn static_items_return_their_contents() {
    let item = Item {
        id: ItemId::from("x"),
        description: "d".to_string(),
        image: "AQID".to_string(),
    };
    let source = StaticItems(vec![item.clone()]);
    assert_eq!(source.load().await.expect("items"), vec![item]);
}
