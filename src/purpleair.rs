mod client;
mod reading;
mod response;

pub use client::*;
pub use reading::*;
pub use response::*;
