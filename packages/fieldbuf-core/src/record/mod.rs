//! Record layout engine: canonical buffers, per-table codecs and records.

mod buffer;
mod json;
mod layout;
#[allow(clippy::module_inception)]
mod record;

pub use buffer::{RecordBuffer, ENTRY_LEN, HEADER_LEN};
pub use json::{value_from_json, value_to_json};
pub use layout::TableCodec;
pub use record::{DerivedFn, Record};
pub(crate) use json::scalar_from_json;
