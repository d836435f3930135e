use crate::Value;

/// SQL parameter container.
#[derive(Clone, Debug, PartialEq)]
pub enum Params {
    /// Positional values mapped to `?` placeholders.
    Positional(Vec<Value>),
    /// Named values mapped to `:name` style placeholders.
    Named(Vec<(String, Value)>),
}

impl Params {
    /// Builds positional parameters.
    pub fn positional(values: impl Into<Vec<Value>>) -> Self {
        Self::Positional(values.into())
    }

    /// Builds named parameters.
    ///
    /// Names can be provided with or without the `:` prefix.
    pub fn named<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Returns `true` when no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Positional(values) => values.is_empty(),
            Self::Named(values) => values.is_empty(),
        }
    }

    /// Looks up a named value, ignoring a leading `:` on either side.
    pub(crate) fn named_value(&self, name: &str) -> Option<&Value> {
        let name = name.trim_start_matches(':');
        match self {
            Self::Named(values) => values
                .iter()
                .find(|(key, _)| key.trim_start_matches(':') == name)
                .map(|(_, value)| value),
            Self::Positional(_) => None,
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::Positional(Vec::new())
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self::Positional(values)
    }
}

impl<const N: usize> From<[Value; N]> for Params {
    fn from(values: [Value; N]) -> Self {
        Self::Positional(values.into())
    }
}

impl From<Vec<(String, Value)>> for Params {
    fn from(values: Vec<(String, Value)>) -> Self {
        Self::Named(values)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Params, Value};

    #[test]
    fn positional_from_array() {
        let params: Params = [Value::integer(1), Value::text("kit")].into();
        match params {
            Params::Positional(values) => assert_eq!(values.len(), 2),
            _ => panic!("expected positional"),
        }
    }

    #[test]
    fn named_builder() {
        let params = Params::named([("name", Value::text("kit"))]);
        match params {
            Params::Named(ref values) => {
                assert_eq!(values.len(), 1);
                assert_eq!(values[0].0, "name");
            }
            _ => panic!("expected named"),
        }
        assert_eq!(params.named_value(":name"), Some(&Value::text("kit")));
        assert_eq!(params.named_value("other"), None);
    }

    #[test]
    fn unit_is_empty() {
        let params: Params = ().into();
        assert!(params.is_empty());
        assert!(!Params::positional([Value::Null]).is_empty());
    }
}
