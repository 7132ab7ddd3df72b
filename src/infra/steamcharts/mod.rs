mod client;

pub use client::SteamChartsClient;
