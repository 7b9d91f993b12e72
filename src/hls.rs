pub mod attributes;
pub mod byterange;
pub mod date_time;
pub mod key;
pub mod stream_info;
pub mod value;

pub use attributes::Attributes;
pub use byterange::ByteRange;
pub use key::{Key, KeyMethod};
pub use stream_info::StreamInfo;
pub use value::{AttributeMap, AttributeValue};
