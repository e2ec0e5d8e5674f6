pub mod message;
pub mod profile;
pub mod user;

pub use message::{ConversationSummary, Message};
pub use profile::{Profile, ProfileUpdate};
pub use user::{PublicUser, User};
