//! Backend tool servers
//!
//! | Backend | Where it runs | Tools |
//! |---------|---------------|-------|
//! | [`InstallationBackend`] | in-process | packages, web servers, Oracle Database, services, requirement checks |
//! | [`ProcessBackend`] | child process, JSON lines over stdio | whatever the server lists |

pub mod host;
pub mod installation;
pub mod process;

pub use host::{
    CommandLocator, CommandOutput, CommandRunner, CommandSpec, ProcessRunner, SysinfoProbe,
    SystemFacts, SystemProbe, WhichLocator,
};
pub use installation::{InstallationBackend, PackageManager};
pub use process::ProcessBackend;
