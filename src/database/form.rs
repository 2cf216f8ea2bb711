use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use crate::error::ValidationError;

pub type FormData = HashMap<String, Value>;

/// Loosely-typed request payload. Clients send JSON objects; the
/// validation layer pulls fields out with the accessors below so a
/// missing or mistyped field surfaces as a caller-correctable error
/// instead of a deserialization failure.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, ValidationError>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| ValidationError::BadField(format!("Invalid value for '{key}'"))),
            None => Err(ValidationError::BadField(format!("Missing field '{key}'"))),
        }
    }

    /// Numbers may arrive as JSON numbers or as numeric strings.
    pub fn get_number<T>(&self, key: &str) -> Result<T, ValidationError>
    where
        T: FromStr + TryFrom<i64>,
    {
        match self.inner.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|n| T::try_from(n).ok())
                .ok_or_else(|| ValidationError::BadField(format!("Invalid number for '{key}'"))),
            Some(Value::String(s)) => s
                .parse()
                .map_err(|_e| ValidationError::BadField(format!("Invalid number for '{key}'"))),
            Some(_) => Err(ValidationError::BadField(format!(
                "Invalid number for '{key}'"
            ))),
            None => Err(ValidationError::BadField(format!("Missing field '{key}'"))),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, ValidationError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(ValidationError::BadField(format!(
                    "Expected a string for '{key}'"
                ))),
            },
            None => Err(ValidationError::BadField(format!("Missing field '{key}'"))),
        }
    }

    pub fn get_array(&self, key: &str) -> Result<Vec<Value>, ValidationError> {
        match self.inner.get(key) {
            Some(value) => match value.as_array() {
                Some(v) => Ok(v.to_owned()),
                None => Err(ValidationError::BadField(format!(
                    "Expected a list for '{key}'"
                ))),
            },
            None => Err(ValidationError::BadField(format!("Missing field '{key}'"))),
        }
    }

    /// Submitted identifier lists ("tags": [1, 2]) as plain ids.
    pub fn get_id_list(&self, key: &str) -> Result<Vec<i32>, ValidationError> {
        self.get_array(key)?
            .iter()
            .map(|value| {
                value
                    .as_i64()
                    .and_then(|id| i32::try_from(id).ok())
                    .ok_or_else(|| {
                        ValidationError::BadField(format!("Expected integer ids in '{key}'"))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> Form {
        Form::from_data(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn reads_strings_and_numbers() {
        let form = form(json!({"name": "Borscht", "cooking_time": 45}));
        assert_eq!(form.get_str("name").unwrap(), "Borscht");
        assert_eq!(form.get_number::<i32>("cooking_time").unwrap(), 45);
    }

    #[test]
    fn numbers_parse_from_digit_strings() {
        let form = form(json!({"cooking_time": "30"}));
        assert_eq!(form.get_number::<i32>("cooking_time").unwrap(), 30);
    }

    #[test]
    fn missing_and_mistyped_fields_are_bad_fields() {
        let form = form(json!({"name": 7}));
        assert!(matches!(
            form.get_str("name"),
            Err(ValidationError::BadField(_))
        ));
        assert!(matches!(
            form.get_str("text"),
            Err(ValidationError::BadField(_))
        ));
        assert!(matches!(
            form.get_number::<i32>("name"),
            Err(ValidationError::BadField(_))
        ));
    }

    #[test]
    fn id_lists_reject_non_integers() {
        let form = form(json!({"tags": [1, 2, 3], "bad": [1, "x"]}));
        assert_eq!(form.get_id_list("tags").unwrap(), vec![1, 2, 3]);
        assert!(form.get_id_list("bad").is_err());
    }
}
