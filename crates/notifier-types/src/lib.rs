//! Shared types for the notifier workspace.
//!
//! This crate models what flows through the publish pipeline:
//!
//! - [`ChangeRecord`]: one row-mutation notification read from the table's
//!   change log, with its [`EventKind`] and the raw native-encoded `NewImage`.
//! - [`AttributeValue`]: the storage layer's tagged attribute encoding, plus
//!   [`unmarshall`] / [`marshall`] to move between native and plain JSON maps.
//! - [`PublishPayload`]: the string-encoded row handed to the `publish`
//!   mutation as its single `AWSJSON` argument.
//!
//! Nothing here performs I/O. The crate has no dependency on the signing or
//! transport layers so that every other crate can share these definitions.

mod attribute;
mod error;
mod payload;
mod record;

pub use attribute::{
    marshall, unmarshall, unmarshall_value, AttributeValue, NativeImage, PlainRow, IMAGE_PATH,
};
pub use error::AttributeError;
pub use payload::PublishPayload;
pub use record::{ChangeRecord, EventKind, StreamEvent, StreamRecord};
