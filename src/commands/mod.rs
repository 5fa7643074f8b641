pub mod clean;
pub mod clone;
pub mod setup;
pub mod ssh_command;
pub mod status;
pub mod test;
