/// Data models for authentication and session tracking
pub mod session;
pub mod token;
pub mod user;

pub use session::Session;
pub use token::Token;
pub use user::{Gender, Role, User, UserView};
