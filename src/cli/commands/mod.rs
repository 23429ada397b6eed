//! Command implementations, one module per subcommand family.

pub mod check;
pub mod init;
pub mod record;
pub mod resume;
pub mod schemas;
pub mod status;
pub mod transition;
pub mod watch;
