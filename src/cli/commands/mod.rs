mod members;
mod roles;

pub use members::{cmd_list_members, cmd_set_member_type};
pub use roles::{cmd_grant_role, cmd_revoke_role};
