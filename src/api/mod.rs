//! Exchange gateway interface and the Upbit client behind it.

mod gateway;
mod types;
mod upbit;

#[cfg(test)]
pub(crate) mod mock;

pub use gateway::ExchangeGateway;
pub use upbit::UpbitClient;
