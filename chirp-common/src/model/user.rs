use crate::{credential::PasswordHash, model::Id};
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// A string field that must be present and non-empty at creation time.
/// Validation happens at construction, so a persisted record can only ever
/// hold a valid value.
macro_rules! required_string {
    ($name:ident, $error:ident, $message:literal) => {
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
        #[error($message)]
        pub struct $error;

        impl $name {
            pub fn new(value: String) -> Result<Self, $error> {
                if value.is_empty() {
                    Err($error)
                } else {
                    Ok(Self(value))
                }
            }

            #[must_use]
            pub fn get(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let inner = String::deserialize(deserializer)?;
                $name::new(inner).map_err(Error::custom)
            }
        }
    };
}

required_string!(Username, InvalidUsernameError, "username is required");
required_string!(EmailAddress, InvalidEmailAddressError, "email is required");
required_string!(DisplayName, InvalidDisplayNameError, "name is required");

/// Outward representation of a user. The credential and the soft-delete
/// marker live in the store only and are not part of this type.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub email: EmailAddress,
    pub name: DisplayName,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct NewUser {
    pub username: Username,
    pub email: EmailAddress,
    pub password: PasswordHash,
    pub name: DisplayName,
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{DisplayName, EmailAddress, InvalidUsernameError, Username};

    #[test]
    fn empty_required_strings_are_rejected() {
        assert_eq!(Username::new(String::new()), Err(InvalidUsernameError));
        assert!(EmailAddress::new(String::new()).is_err());
        assert!(DisplayName::new(String::new()).is_err());
    }

    #[test]
    fn valid_values_pass_through() {
        let username = Username::new("alice".to_owned()).unwrap();
        assert_eq!(username.get(), "alice");
        assert_eq!(username.into_inner(), "alice");
    }

    #[test]
    fn deserializing_an_empty_username_fails() {
        assert!(serde_json::from_str::<Username>("\"\"").is_err());
        assert!(serde_json::from_str::<Username>("\"bob\"").is_ok());
    }
}
