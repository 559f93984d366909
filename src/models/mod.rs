pub mod group;
pub mod member;
pub mod selection;
pub mod slot;
