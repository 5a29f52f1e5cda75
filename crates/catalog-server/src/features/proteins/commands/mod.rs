pub mod create;

pub use create::CreateProteinCommand;
