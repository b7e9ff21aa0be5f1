pub mod credential;
pub mod model;
