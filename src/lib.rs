pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod news;
pub mod rate_limit;
pub mod routes;
pub mod session_state;
pub mod sheet_store;
pub mod startup;
pub mod telemetry;
pub mod utils;
pub mod verification;
