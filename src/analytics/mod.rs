pub mod session;
pub mod sink;

pub use session::AnalyticsSession;
pub use sink::LogSink;
