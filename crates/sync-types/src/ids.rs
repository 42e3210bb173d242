use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(EntityId);
string_id!(UserId);
string_id!(DeviceId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_conversion_round_trip() {
        let id = EntityId::from("g1");
        assert_eq!(id.to_string(), "g1");
        assert_eq!(id.as_str(), "g1");
    }

    #[test]
    fn ids_of_different_kinds_do_not_unify() {
        let entity = EntityId::new("same-string");
        let user = UserId::new("same-string");
        // Compiles only because these are distinct types; this test exists to
        // document that mixing them up is a type error, not a runtime bug.
        assert_eq!(entity.as_str(), user.as_str());
    }
}
