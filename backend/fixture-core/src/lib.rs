pub mod args;
pub mod config;
pub mod error;
pub mod process;
pub mod server;

#[cfg(test)]
mod tests;

pub const STAN_SERVER: &str = "nats-streaming-server";
pub const STAN_SERVER_DIR: &str = "target";
pub const STAN_SERVER_PATH: &str = const_format::concatcp!(STAN_SERVER_DIR, "/", STAN_SERVER);
pub const STAN_SERVER_BIN_ENV: &str = "STAN_SERVER_BIN";

pub const VERBOSE_FLAG: &str = "-DV";
pub const CLUSTER_ID_FLAG: &str = "-cluster_id";
pub const PORT_FLAG: &str = "-p";

/// Ports at or below this value are never passed to the server.
pub const PRIVILEGED_PORT_MAX: u16 = 1023;
