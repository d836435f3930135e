use crate::{Field, FieldType, PsdbError, Result, Value};

/// Turns one raw cell into a typed [`Value`].
///
/// `raw` is `None` for SQL `NULL`, otherwise the exact column bytes. Supply a
/// custom implementation through [`Config::with_cast`](crate::Config::with_cast)
/// to change type handling; closures with the same signature implement it too.
pub trait Cast: Send + Sync {
    fn cast(&self, field: &Field, raw: Option<&[u8]>) -> Result<Value>;
}

impl<F> Cast for F
where
    F: Fn(&Field, Option<&[u8]>) -> Result<Value> + Send + Sync,
{
    fn cast(&self, field: &Field, raw: Option<&[u8]>) -> Result<Value> {
        self(field, raw)
    }
}

/// Built-in casting table.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCast;

impl Cast for DefaultCast {
    fn cast(&self, field: &Field, raw: Option<&[u8]>) -> Result<Value> {
        cast(field, raw)
    }
}

/// Default cast rules.
///
/// `NULL` is [`Value::Null`] for every type. `BLOB`, `BIT`, `BINARY` and
/// `VARBINARY` are verbatim [`Value::Bytes`], empty ones included. Any other
/// empty value is an empty [`Value::Text`]. Otherwise:
/// - 8 to 32-bit integers and `YEAR` parse to [`Value::Integer`]
/// - `FLOAT32`/`FLOAT64` parse to [`Value::Float`]
/// - 64-bit integers, `DECIMAL` and temporal types stay verbatim [`Value::Text`]
///   so no precision is lost
/// - `JSON` is parsed; invalid JSON fails the query
/// - anything else is UTF-8 text
pub fn cast(field: &Field, raw: Option<&[u8]>) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    if is_binary(&field.field_type) {
        return Ok(Value::Bytes(raw.to_vec()));
    }
    if raw.is_empty() {
        return Ok(Value::Text(String::new()));
    }

    match field.field_type {
        FieldType::Int8
        | FieldType::Int16
        | FieldType::Int24
        | FieldType::Int32
        | FieldType::Uint8
        | FieldType::Uint16
        | FieldType::Uint24
        | FieldType::Uint32
        | FieldType::Year => {
            let text = ascii(field, raw)?;
            text.trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|err| invalid(field, text, err))
        }
        FieldType::Float32 | FieldType::Float64 => {
            let text = ascii(field, raw)?;
            text.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|err| invalid(field, text, err))
        }
        FieldType::Decimal
        | FieldType::Int64
        | FieldType::Uint64
        | FieldType::Date
        | FieldType::Time
        | FieldType::Datetime
        | FieldType::Timestamp => Ok(Value::Text(String::from_utf8_lossy(raw).into_owned())),
        FieldType::Json => serde_json::from_slice(raw).map(Value::Json).map_err(|err| {
            PsdbError::Decode(format!("invalid JSON in column '{}': {err}", field.name))
        }),
        _ => Ok(Value::Text(String::from_utf8_lossy(raw).into_owned())),
    }
}

fn is_binary(ty: &FieldType) -> bool {
    matches!(
        ty,
        FieldType::Blob | FieldType::Bit | FieldType::Varbinary | FieldType::Binary
    )
}

fn ascii<'a>(field: &Field, raw: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(raw).map_err(|err| {
        PsdbError::Decode(format!(
            "non-text {} value in column '{}': {err}",
            field.field_type, field.name
        ))
    })
}

fn invalid(field: &Field, text: &str, err: impl std::fmt::Display) -> PsdbError {
    PsdbError::Decode(format!(
        "invalid {} value '{text}' in column '{}': {err}",
        field.field_type, field.name
    ))
}
