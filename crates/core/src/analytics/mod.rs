pub mod history;
pub mod sensitivity;
