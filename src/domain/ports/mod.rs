mod connectivity_probe;
mod history_store;
mod http_fetcher;

pub use connectivity_probe::ConnectivityProbe;
pub use history_store::HistoryStore;
pub use http_fetcher::HttpFetcher;
