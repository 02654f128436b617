//! # Input schemas
//!
//! One explicit schema per operation. Required fields are still modelled as
//! `Option` at the wire boundary so a missing field becomes a domain
//! validation error instead of a generic deserialization failure.

use serde::{Deserialize, Deserializer};

use crate::models::Upload;

/// Three-state field for partial updates.
///
/// `Absent` keeps the stored value, `Null` means the client explicitly sent
/// `null`, `Value` carries the replacement. Use with `#[serde(default)]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

/// Integer that also accepts a numeric string such as `"4"`, which is what
/// HTML form controls submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LenientInt(pub i64);

impl<'de> Deserialize<'de> for LenientInt {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(LenientInt(v)),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(LenientInt)
                .map_err(|_| serde::de::Error::custom("expected an integer")),
        }
    }
}

/// Body of register and login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[cfg(any(test, feature = "testing"))]
impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<Upload>,
}

/// Only supplied fields are written.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<Upload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub rating: Option<LenientInt>,
    pub text: Option<String>,
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    #[serde(default)]
    pub rating: Patch<LenientInt>,
    #[serde(default)]
    pub text: Patch<String>,
    #[serde(default)]
    pub author_name: Patch<String>,
}
