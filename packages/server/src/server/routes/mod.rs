// HTTP routes
pub mod generate;
pub mod health;
pub mod jobs;
pub mod status;

pub use generate::*;
pub use health::*;
pub use jobs::*;
pub use status::*;
