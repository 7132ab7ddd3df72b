pub mod clean;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod month;
pub mod output;
pub mod plot;
pub mod record;
pub mod store;
