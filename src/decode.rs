use std::collections::{BTreeMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::{
    wire::{QueryResult, QueryResultRow},
    Cast, Field, FieldType, PsdbError, Row,
};

/// Headers, type map and typed rows assembled from one wire result.
#[derive(Debug, Default)]
pub(crate) struct Assembled {
    pub headers: Vec<String>,
    pub types: BTreeMap<String, FieldType>,
    pub rows: Vec<Row>,
}

/// Splits a packed row into per-column raw values.
///
/// The base64 blob is decoded once and sliced front to back by `lengths`. A
/// negative length is `NULL` and consumes nothing. Slices past the end of the
/// blob come back truncated or empty; the service is trusted on lengths.
pub(crate) fn decode_row(row: &QueryResultRow) -> Result<Vec<Option<Vec<u8>>>, PsdbError> {
    let blob = BASE64
        .decode(row.values.as_bytes())
        .map_err(|err| PsdbError::Decode(format!("invalid base64 row values: {err}")))?;

    let mut offset = 0usize;
    row.lengths
        .iter()
        .map(|size| -> Result<Option<Vec<u8>>, PsdbError> {
            let width = size.trim().parse::<i64>().map_err(|err| {
                PsdbError::Decode(format!("invalid column length '{size}': {err}"))
            })?;
            if width < 0 {
                return Ok(None);
            }
            let width = usize::try_from(width).unwrap_or(usize::MAX);
            let start = offset.min(blob.len());
            let end = offset.saturating_add(width).min(blob.len());
            offset = offset.saturating_add(width);
            Ok(Some(blob[start..end].to_vec()))
        })
        .collect()
}

/// Decodes one row and casts each cell against its field.
///
/// Fields and lengths are paired positionally; extra entries on either side
/// are dropped. With `distinct_names` set, cells are appended without the
/// per-column duplicate lookup.
pub(crate) fn parse_row(
    fields: &[Field],
    row: &QueryResultRow,
    cast: &dyn Cast,
    distinct_names: bool,
) -> Result<Row, PsdbError> {
    let values = decode_row(row)?;
    let mut parsed = Row::with_capacity(fields.len());
    for (field, raw) in fields.iter().zip(values.iter()) {
        let value = cast.cast(field, raw.as_deref())?;
        if distinct_names {
            parsed.push_unique(field.name.clone(), value);
        } else {
            parsed.insert(field.name.clone(), value);
        }
    }
    Ok(parsed)
}

fn has_distinct_names(fields: &[Field]) -> bool {
    let mut seen = HashSet::with_capacity(fields.len());
    fields.iter().all(|field| seen.insert(field.name.as_str()))
}

pub(crate) fn assemble(result: &QueryResult, cast: &dyn Cast) -> Result<Assembled, PsdbError> {
    let fields = result.fields.as_deref().unwrap_or_default();
    let distinct_names = has_distinct_names(fields);
    let rows = result
        .rows
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|row| parse_row(fields, row, cast, distinct_names))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Assembled {
        headers: fields.iter().map(|field| field.name.clone()).collect(),
        types: fields
            .iter()
            .map(|field| (field.name.clone(), field.field_type.clone()))
            .collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    use crate::{
        cast::DefaultCast,
        decode,
        wire::{QueryResult, QueryResultRow},
        Field, FieldType, PsdbError, Value,
    };

    fn packed(lengths: &[&str], values: &[u8]) -> QueryResultRow {
        QueryResultRow {
            lengths: lengths.iter().map(|len| (*len).to_owned()).collect(),
            values: BASE64.encode(values),
        }
    }

    #[test]
    fn decode_splits_by_lengths() {
        let row = packed(&["2", "3", "0"], b"42kit");
        let values = decode::decode_row(&row).expect("must decode");
        assert_eq!(
            values,
            vec![Some(b"42".to_vec()), Some(b"kit".to_vec()), Some(Vec::new())]
        );
    }

    #[test]
    fn negative_length_is_null_and_keeps_offset() {
        let row = packed(&["-1", "2", "-1", "1"], b"abc");
        let values = decode::decode_row(&row).expect("must decode");
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], None);
        assert_eq!(values[1].as_deref(), Some(&b"ab"[..]));
        assert_eq!(values[2], None);
        assert_eq!(values[3].as_deref(), Some(&b"c"[..]));
    }

    #[test]
    fn over_consumption_yields_truncated_then_empty() {
        let row = packed(&["2", "5", "3"], b"abcd");
        let values = decode::decode_row(&row).expect("must decode");
        assert_eq!(values[0].as_deref(), Some(&b"ab"[..]));
        assert_eq!(values[1].as_deref(), Some(&b"cd"[..]));
        assert_eq!(values[2].as_deref(), Some(&b""[..]));
    }

    #[test]
    fn binary_bytes_are_not_reencoded() {
        let bytes = [0xffu8, 0x00, 0xc3, 0x28];
        let row = packed(&["4"], &bytes);
        let values = decode::decode_row(&row).expect("must decode");
        assert_eq!(values[0].as_deref(), Some(&bytes[..]));
    }

    #[test]
    fn malformed_base64_is_decode_error() {
        let row = QueryResultRow {
            lengths: vec!["1".to_owned()],
            values: "!!not base64!!".to_owned(),
        };
        let err = decode::decode_row(&row).expect_err("must fail");
        assert!(matches!(err, PsdbError::Decode(_)));
    }

    #[test]
    fn malformed_length_is_decode_error() {
        let row = packed(&["two"], b"ab");
        let err = decode::decode_row(&row).expect_err("must fail");
        assert!(matches!(err, PsdbError::Decode(_)));
    }

    #[test]
    fn parse_row_truncates_to_shorter_side() {
        let fields = vec![
            Field::new("a", FieldType::Int32),
            Field::new("b", FieldType::Varchar),
        ];
        let row = packed(&["1"], b"7");
        let parsed = decode::parse_row(&fields, &row, &DefaultCast, true).expect("must parse");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get_i64("a"), Some(7));
        assert_eq!(parsed.get("b"), None);

        let fields = vec![Field::new("a", FieldType::Int32)];
        let row = packed(&["1", "2"], b"7xx");
        let parsed = decode::parse_row(&fields, &row, &DefaultCast, true).expect("must parse");
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn assemble_builds_headers_types_and_rows() {
        let result = QueryResult {
            fields: Some(vec![
                Field::new("id", FieldType::Int32),
                Field::new("note", FieldType::Varchar),
            ]),
            rows: Some(vec![packed(&["2", "-1"], b"42"), packed(&["1", "2"], b"7hi")]),
            ..QueryResult::default()
        };

        let assembled = decode::assemble(&result, &DefaultCast).expect("must assemble");
        assert_eq!(assembled.headers, vec!["id", "note"]);
        assert_eq!(assembled.types.get("id"), Some(&FieldType::Int32));
        assert_eq!(assembled.types.get("note"), Some(&FieldType::Varchar));
        assert_eq!(assembled.rows.len(), 2);
        assert_eq!(assembled.rows[0].get("id"), Some(&Value::Integer(42)));
        assert_eq!(assembled.rows[0].get("note"), Some(&Value::Null));
        assert_eq!(assembled.rows[1].get_text("note"), Some("hi"));
    }

    #[test]
    fn assemble_duplicate_names_last_write_wins() {
        let result = QueryResult {
            fields: Some(vec![
                Field::new("x", FieldType::Int32),
                Field::new("x", FieldType::Varchar),
            ]),
            rows: Some(vec![packed(&["1", "1"], b"1a")]),
            ..QueryResult::default()
        };

        let assembled = decode::assemble(&result, &DefaultCast).expect("must assemble");
        assert_eq!(assembled.headers, vec!["x", "x"]);
        assert_eq!(assembled.types.get("x"), Some(&FieldType::Varchar));
        assert_eq!(assembled.rows[0].len(), 1);
        assert_eq!(assembled.rows[0].get_text("x"), Some("a"));
    }

    #[test]
    fn distinct_names_are_detected_once_per_result() {
        let distinct = [
            Field::new("a", FieldType::Int32),
            Field::new("b", FieldType::Int32),
        ];
        assert!(decode::has_distinct_names(&distinct));
        assert!(decode::has_distinct_names(&[]));

        let repeated = [
            Field::new("a", FieldType::Int32),
            Field::new("b", FieldType::Int32),
            Field::new("a", FieldType::Varchar),
        ];
        assert!(!decode::has_distinct_names(&repeated));
    }

    #[test]
    fn parse_row_both_paths_agree_on_distinct_names() {
        let fields = vec![
            Field::new("id", FieldType::Int32),
            Field::new("name", FieldType::Varchar),
            Field::new("blob", FieldType::Blob),
        ];
        let row = packed(&["1", "3", "-1"], b"9kit");
        let fast = decode::parse_row(&fields, &row, &DefaultCast, true).expect("must parse");
        let checked = decode::parse_row(&fields, &row, &DefaultCast, false).expect("must parse");
        assert_eq!(fast, checked);
        assert_eq!(fast.columns().collect::<Vec<_>>(), vec!["id", "name", "blob"]);
        assert_eq!(fast.get_i64("id"), Some(9));
        assert_eq!(fast.get("blob"), Some(&Value::Null));
    }

    #[test]
    fn assemble_empty_result_is_empty_collections() {
        let assembled =
            decode::assemble(&QueryResult::default(), &DefaultCast).expect("must assemble");
        assert!(assembled.headers.is_empty());
        assert!(assembled.types.is_empty());
        assert!(assembled.rows.is_empty());

        let no_rows = QueryResult {
            fields: Some(vec![Field::new("id", FieldType::Int32)]),
            rows: Some(vec![]),
            ..QueryResult::default()
        };
        let assembled = decode::assemble(&no_rows, &DefaultCast).expect("must assemble");
        assert_eq!(assembled.headers, vec!["id"]);
        assert!(assembled.rows.is_empty());
    }

    #[test]
    fn assemble_propagates_cast_failure() {
        let result = QueryResult {
            fields: Some(vec![Field::new("doc", FieldType::Json)]),
            rows: Some(vec![packed(&["3"], b"{x:")]),
            ..QueryResult::default()
        };
        let err = decode::assemble(&result, &DefaultCast).expect_err("must fail");
        assert!(matches!(err, PsdbError::Decode(_)));
    }
}
