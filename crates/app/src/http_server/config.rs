use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the app server listens on
    pub listen_addr: SocketAddr,
    /// Level request traces are emitted at
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, log_level: tracing::Level) -> Self {
        Self {
            listen_addr,
            log_level,
        }
    }
}
