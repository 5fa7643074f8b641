pub mod config_file;
pub mod resolver;
pub mod url;
