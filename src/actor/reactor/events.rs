pub mod command;
pub mod pointer;
pub mod surface;
