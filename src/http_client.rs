use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. The timeout only applies to the first call that builds it.
pub fn http_client(timeout: Option<Duration>) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        // The blocking client defaults to a 30s timeout; None waits for completion.
        Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")
    })
}
