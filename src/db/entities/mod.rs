//! SeaORM entities mapping to the database tables.
//!
//! Each entity lives in its own module (`user.rs`, `program.rs`, ...). The
//! `prelude` re-exports entity types under stable aliases for convenient
//! importing elsewhere in the crate.

pub mod affiliate_link;
pub mod program;
pub mod user;

pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::program::Entity as Program;
    pub use super::program::Model as ProgramModel;
    pub use super::program::ActiveModel as ProgramActiveModel;
    pub use super::program::Column as ProgramColumn;

    pub use super::affiliate_link::Entity as AffiliateLink;
    pub use super::affiliate_link::Model as AffiliateLinkModel;
    pub use super::affiliate_link::ActiveModel as AffiliateLinkActiveModel;
    pub use super::affiliate_link::Column as AffiliateLinkColumn;
}
