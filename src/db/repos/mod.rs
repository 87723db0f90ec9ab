pub mod patients;
pub mod settings;
