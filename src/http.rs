use lazy_static::lazy_static;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use std::time::Duration;

const MAX_RETRIES: u32 = 5;
const TIMEOUT: Duration = Duration::from_secs(60);
pub const USER_AGENT: &str = concat!("irlfeed/", env!("CARGO_PKG_VERSION"));

lazy_static! {
    pub static ref REST_CLIENT: ClientWithMiddleware = ClientBuilder::new(
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()
            .expect("Failed to build HTTP client")
    )
    .with(RetryTransientMiddleware::new_with_policy(
        ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES)
    ))
    .build();
}
