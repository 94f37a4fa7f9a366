use tera::{Result, Value};

pub(crate) fn none(value: Option<&Value>, _: &[Value]) -> Result<bool> {
    match value {
        Some(value) => Ok(value.is_null()),
        None => Ok(false)
    }
}

pub(crate) fn some(value: Option<&Value>, _: &[Value]) -> Result<bool> {
    match value {
        Some(value) => Ok(!value.is_null()),
        None => Ok(false)
    }
}
