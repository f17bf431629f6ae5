use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_newtype!(SourceName, "Name of a configured data source.");
string_newtype!(TargetName, "Name of a configured webhook target.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_name_from_str() {
        let name: SourceName = "orders_daily".into();
        assert_eq!(name.as_str(), "orders_daily");
        assert_eq!(name.to_string(), "orders_daily");
    }

    #[test]
    fn target_name_roundtrip_serde() {
        let name: TargetName = "slack".into();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"slack\"");
        let back: TargetName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a: SourceName = "a".into();
        let b: SourceName = "b".into();
        assert!(a < b);
    }
}
