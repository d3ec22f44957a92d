//! Command implementations

mod common;
mod completions;
mod doctor;
mod init;
mod locate;
mod release;
mod sign;

pub use completions::CompletionsCommand;
pub use doctor::DoctorCommand;
pub use init::InitCommand;
pub use locate::LocateCommand;
pub use release::ReleaseCommand;
pub use sign::SignCommand;
