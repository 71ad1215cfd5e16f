use super::*;

#[test]
fn test_ingest_basic_csv() {
    let t = ingest(b"name,age\nAlice,30\nBob,\n", &IngestFormat::csv()).unwrap();
    assert_eq!(t.column_names(), vec!["name".to_owned(), "age".to_owned()]);
    assert_eq!(t.row_count(), 2);
    assert_eq!(column(&t, "age"), vec![Some("30".to_owned()), None]);
}

#[test]
fn test_ingest_skips_blank_lines() {
    let t = ingest(b"a,b\n\n1,2\n   \n3,4\n", &IngestFormat::csv()).unwrap();
    assert_eq!(t.row_count(), 2);
}

#[test]
fn test_ingest_keeps_all_empty_rows() {
    let t = ingest(b"a,b\n,\n1,2\n", &IngestFormat::csv()).unwrap();
    assert_eq!(t.row_count(), 2);
    assert_eq!(column(&t, "a"), vec![None, Some("1".to_owned())]);
}

#[test]
fn test_ingest_honours_quotes() {
    let t = ingest(
        b"name,note\n\"Smith, Jo\",\"said \"\"hi\"\"\"\n",
        &IngestFormat::csv(),
    )
    .unwrap();
    assert_eq!(column(&t, "name"), vec![Some("Smith, Jo".to_owned())]);
    assert_eq!(column(&t, "note"), vec![Some("said \"hi\"".to_owned())]);
}

#[test]
fn test_ingest_rejects_ragged_rows() {
    let err = ingest(b"a,b\n1,2\n3\n", &IngestFormat::csv()).unwrap_err();
    assert_eq!(err.kind(), "format_error");
    assert!(err.to_string().contains("line 3"), "{err}");

    let err = ingest(b"a,b\n1,2,3\n", &IngestFormat::csv()).unwrap_err();
    assert_eq!(err.kind(), "format_error");
}

#[test]
fn test_ingest_rejects_missing_or_bad_header() {
    assert_eq!(
        ingest(b"", &IngestFormat::csv()).unwrap_err().kind(),
        "format_error"
    );
    assert_eq!(
        ingest(b"\n  \n", &IngestFormat::csv()).unwrap_err().kind(),
        "format_error"
    );
    assert_eq!(
        ingest(b"a,a\n1,2\n", &IngestFormat::csv()).unwrap_err().kind(),
        "format_error"
    );
    assert_eq!(
        ingest(b"a,,c\n1,2,3\n", &IngestFormat::csv()).unwrap_err().kind(),
        "format_error"
    );
}

#[test]
fn test_ingest_rejects_invalid_utf8() {
    let err = ingest(&[b'a', b'\n', 0xff, 0xfe], &IngestFormat::csv()).unwrap_err();
    assert_eq!(err.kind(), "format_error");
}

#[test]
fn test_ingest_null_tokens_and_bom() {
    let t = ingest("\u{feff}id,score\n1,NA\n2,null\n3,7\n".as_bytes(), &IngestFormat::csv())
        .unwrap();
    assert_eq!(t.column_names()[0], "id");
    assert_eq!(column(&t, "score"), vec![None, None, Some("7".to_owned())]);

    let keep = IngestFormat::csv().with_null_tokens(vec![String::new()]);
    let t = ingest(b"id,score\n1,NA\n", &keep).unwrap();
    assert_eq!(column(&t, "score"), vec![Some("NA".to_owned())]);
}

#[test]
fn test_ingest_tsv() {
    let format = IngestFormat::from_file_name("export.TSV");
    assert_eq!(format.delimiter, b'\t');
    let t = ingest(b"a\tb\n1\t2\n", &format).unwrap();
    assert_eq!(column(&t, "b"), vec![Some("2".to_owned())]);
}

#[test]
fn test_csv_output_reads_back() {
    let t = ingest(b"name,age\n\"Smith, Jo\",30\nBob,\n", &IngestFormat::csv()).unwrap();
    let bytes = to_csv_bytes(&t).unwrap();
    let back = ingest(&bytes, &IngestFormat::csv()).unwrap();
    assert_eq!(back, t);
}

#[test]
fn test_single_column_nulls_survive_csv_output() {
    let t = ingest(b"name\nAlice\nNA\nBob\n", &IngestFormat::csv()).unwrap();
    assert_eq!(t.row_count(), 3);

    let bytes = to_csv_bytes(&t).unwrap();
    assert_eq!(ingest(&bytes, &IngestFormat::csv()).unwrap(), t);
}
