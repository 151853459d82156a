pub mod fetcher;
pub mod traits;

pub use fetcher::FileRateSource;
pub use traits::RateSource;
