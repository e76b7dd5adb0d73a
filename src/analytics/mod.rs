pub mod aggregate;
pub mod recorder;
pub mod sink;

pub use aggregate::{BrowserBucket, ClickPoint, DeviceBucket, GeoBucket};
pub use recorder::ClickRecorder;
pub use sink::ClickSink;
