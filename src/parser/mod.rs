pub mod rate_parser;

pub use rate_parser::{Parser, RatePayloadParser};
