//! CLI command implementations

mod check;
mod credentials;
mod doctor;
mod notarize;
mod staple;
mod submit;

pub use check::CheckCommand;
pub use doctor::DoctorCommand;
pub use notarize::NotarizeCommand;
pub use staple::StapleCommand;
pub use submit::SubmitCommand;

pub(crate) use credentials::CredentialArgs;
