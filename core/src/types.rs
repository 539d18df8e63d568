//! Domain DTOs for the Pwinty API.
//!
//! # Design
//! `Order` and `Photo` mirror the remote service's JSON and are decoded
//! tolerantly: unknown fields are ignored, missing fields fall back to their
//! zero value and a JSON `null` in any field is treated as missing. The
//! service owns every status transition, so these are plain snapshots of the
//! last fetch and carry no behaviour of their own.
//!
//! Status and sizing values are open enumerations. Known values get a variant;
//! anything else survives as `Unknown(String)` so a value added server-side
//! never turns into a decode failure.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};

/// Declares a string-backed enumeration with a pass-through `Unknown` variant.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this client does not recognise, kept verbatim.
            Unknown(String),
        }

        impl $name {
            /// The wire representation of this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown(raw) => raw,
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match raw.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Unknown(raw),
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::from(raw.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Unknown(raw) => raw,
                    known => known.as_str().to_owned(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        // Compared by wire value, so `Unknown("Crop")` equals `Crop`.
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.as_str() == other.as_str()
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.as_str().hash(state);
            }
        }
    };
}

open_enum! {
    /// Lifecycle state of an order. Transitions are driven by the service.
    pub enum OrderStatus {
        NotYetSubmitted => "NotYetSubmitted",
        Submitted => "Submitted",
        Complete => "Complete",
        Cancelled => "Cancelled",
    }
}

open_enum! {
    /// Download and validation progress of a photo.
    pub enum PhotoStatus {
        AwaitingUrlOrData => "AwaitingUrlOrData",
        NotYetDownloaded => "NotYetDownloaded",
        Ok => "Ok",
        FileNotFoundAtUrl => "FileNotFoundAtUrl",
        Invalid => "Invalid",
    }
}

open_enum! {
    /// How an image is fitted when its aspect ratio differs from the print's.
    pub enum Sizing {
        Crop => "Crop",
        ShrinkToFit => "ShrinkToFit",
        ShrinkToExactFit => "ShrinkToExactFit",
    }
}

/// Print product code such as `"4x6"`. The catalogue is defined by the
/// service, so the client keeps the code as an opaque string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoType(String);

impl PhotoType {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PhotoType {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for PhotoType {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for PhotoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A print order as last reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    /// Assigned by the service; `0` until it has been.
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_valid: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub general_errors: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub recipient_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address1: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address2: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address_town_or_city: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state_or_county: String,
    #[serde(deserialize_with = "null_as_default")]
    pub postal_or_zip_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    pub status: Option<OrderStatus>,
    #[serde(deserialize_with = "null_as_default")]
    pub photos: Vec<Photo>,
}

/// One image queued for printing within an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Photo {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(rename = "type")]
    pub photo_type: Option<PhotoType>,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    pub status: Option<PhotoStatus>,
    #[serde(deserialize_with = "null_as_default")]
    pub copies: i64,
    pub sizing: Option<Sizing>,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
}

/// Shipping details for a new order. Every field except `address2` is
/// required by the service; omissions come back as `general_errors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub recipient_name: String,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub address_town_or_city: String,
    pub state_or_county: String,
    pub postal_or_zip_code: String,
    pub country: String,
}

/// A photo to attach to an existing order by URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhoto {
    pub order_id: i64,
    #[serde(rename = "type")]
    pub photo_type: PhotoType,
    pub url: String,
    pub copies: i64,
    pub sizing: Sizing,
}
