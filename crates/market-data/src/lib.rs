pub mod alpha_vantage;
pub mod normalize;
pub mod yahoo_finance;

pub use alpha_vantage::{AlphaVantageClient, DEMO_API_KEY};
pub use normalize::normalize;
pub use yahoo_finance::YahooFinanceClient;
