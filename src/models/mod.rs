pub mod member;

pub use member::{AdminRole, Member, MemberPage, MemberQuery, MemberType, NewMember, ProfileChanges};
