pub mod auth;
pub mod clob_client;
pub mod data_client;
pub mod egress;
pub mod signing;
pub mod types;

pub use auth::ApiCredentials;
pub use clob_client::ClobClient;
pub use data_client::DataClient;
pub use egress::EgressGate;
pub use signing::{OrderSigner, SignatureType};
pub use types::SubmitOutcome;
