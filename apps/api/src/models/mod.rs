pub mod contact;
pub mod note;
pub mod tag;
pub mod user;
