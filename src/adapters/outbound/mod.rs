mod json_history_store;
mod reqwest_fetcher;
mod tcp_connectivity_probe;

pub use json_history_store::JsonFileHistoryStore;
pub use reqwest_fetcher::ReqwestFetcher;
pub use tcp_connectivity_probe::TcpConnectivityProbe;
