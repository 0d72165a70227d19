pub mod audio;
pub mod config;
pub mod constants;
pub mod errors;
pub mod nlp;
pub mod preprocess;
pub mod server;
