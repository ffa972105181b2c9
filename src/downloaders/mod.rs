//! Downloader implementations

pub mod http_downloader;

pub use http_downloader::{AssetDownloader, Downloader};
