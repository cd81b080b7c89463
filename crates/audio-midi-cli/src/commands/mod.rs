pub mod config;
pub mod init;
pub mod schema;
pub mod status;
pub mod validate;

pub use init::run_init;
pub use schema::show_schema;
pub use status::show_status;
pub use validate::validate_file;
