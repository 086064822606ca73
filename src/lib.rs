pub mod builders;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod importer;
pub mod logging;
pub mod model;
pub mod reference;
pub mod rows;
pub mod sources;
pub mod text;
pub mod validate;
