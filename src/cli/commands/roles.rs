use crate::models::AdminRole;
use crate::services::MemberError;
use crate::state::SharedState;

pub async fn cmd_grant_role(state: &SharedState, email: &str, role: &str) -> anyhow::Result<()> {
    let Ok(role) = role.parse::<AdminRole>() else {
        println!("Unknown role: {role}");
        println!("Valid roles: superAdmin, newsAdmin");
        return Ok(());
    };

    report(email, state.member_service.grant_role(email, role).await)
}

pub async fn cmd_revoke_role(state: &SharedState, email: &str, role: &str) -> anyhow::Result<()> {
    let Ok(role) = role.parse::<AdminRole>() else {
        println!("Unknown role: {role}");
        println!("Valid roles: superAdmin, newsAdmin");
        return Ok(());
    };

    report(email, state.member_service.revoke_role(email, role).await)
}

fn report(
    email: &str,
    result: Result<crate::models::Member, MemberError>,
) -> anyhow::Result<()> {
    match result {
        Ok(member) => {
            let roles: Vec<&str> = member.admin_roles.iter().map(|r| r.as_str()).collect();
            if roles.is_empty() {
                println!("✓ {} has no admin roles", member.email);
            } else {
                println!("✓ {} roles: {}", member.email, roles.join(", "));
            }
            Ok(())
        }
        Err(MemberError::NotFound(_)) => {
            println!("No member with email: {email}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
