/// Connection parameters for one webcast gateway session.
///
/// The gateway multiplexes live rooms by broadcaster username; the full
/// stream URL is derived here so the dialer stays generic.
#[derive(Debug, Clone)]
pub struct GatewayConnection {
    pub gateway_url: String,
    pub username: String,
}

impl GatewayConnection {
    pub fn new(gateway_url: &str, username: &str) -> Self {
        Self {
            gateway_url: gateway_url.to_string(),
            username: username.to_string(),
        }
    }

    /// Full websocket URL for this broadcaster's event stream. The
    /// username is client-supplied and gets percent-encoded so it cannot
    /// smuggle extra query parameters into the request.
    pub fn url(&self) -> String {
        format!(
            "{}?unique_id={}",
            self.gateway_url,
            urlencoding::encode(&self.username)
        )
    }
}
