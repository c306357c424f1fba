use reqwest::{Client, Response};

pub struct DiceClient {
    client: Client,
    base_url: String,
}

impl DiceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Roll the die once.
    pub async fn roll(&self) -> Result<u8, Box<dyn std::error::Error>> {
        let resp = self.client.get(format!("{}/rolldice", self.base_url)).send().await?;
        parse_roll(resp).await
    }

    /// Roll the die with `username` propagated as W3C baggage.
    pub async fn roll_as(&self, username: &str) -> Result<u8, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/rolldice", self.base_url))
            .header("baggage", format!("username={}", username))
            .send()
            .await?;
        parse_roll(resp).await
    }

    /// Raw `GET` against the service, for callers that need headers or status.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client.get(format!("{}{}", self.base_url, path)).send().await
    }

    /// True when `/liveness` answers `OK`.
    pub async fn liveness(&self) -> Result<bool, reqwest::Error> {
        let resp = self.get("/liveness").await?;
        let ok = resp.status().is_success();
        Ok(ok && resp.text().await? == "OK")
    }
}

async fn parse_roll(resp: Response) -> Result<u8, Box<dyn std::error::Error>> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(format!("Service returned error status {}: {}", status, text).into());
    }

    let value = text
        .strip_suffix('\n')
        .ok_or_else(|| format!("Roll {:?} is not newline-terminated", text))?;
    Ok(value.parse()?)
}
