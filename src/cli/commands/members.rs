//! Member listing and tier commands

use crate::models::{MemberQuery, MemberType};
use crate::services::MemberError;
use crate::state::SharedState;

pub async fn cmd_list_members(
    state: &SharedState,
    member_type: Option<&str>,
    page: u64,
) -> anyhow::Result<()> {
    let member_type = match member_type.map(str::parse::<MemberType>).transpose() {
        Ok(t) => t,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };

    let query = MemberQuery {
        member_type,
        page: page.max(1),
        ..MemberQuery::default()
    };

    let result = state.member_service.list_members(query).await?;

    if result.members.is_empty() {
        println!("No members found.");
        return Ok(());
    }

    println!(
        "Members ({} total, page {}/{})",
        result.total,
        result.page,
        result.total_pages.max(1)
    );
    println!("{:-<70}", "");

    for member in &result.members {
        let roles = if member.admin_roles.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = member.admin_roles.iter().map(|r| r.as_str()).collect();
            format!(" [{}]", names.join(", "))
        };

        println!("{} <{}>{}", member.name, member.email, roles);
        println!(
            "  ID: {} | Type: {} | Joined: {}",
            member.id,
            member.member_type,
            member.created_at.get(..10).unwrap_or(&member.created_at)
        );
    }

    Ok(())
}

pub async fn cmd_set_member_type(
    state: &SharedState,
    email: &str,
    member_type: &str,
) -> anyhow::Result<()> {
    let member_type = match member_type.parse::<MemberType>() {
        Ok(t) => t,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };

    match state
        .member_service
        .change_member_type_by_email(email, member_type)
        .await
    {
        Ok(member) => {
            println!("✓ {} is now {}", member.email, member.member_type);
            Ok(())
        }
        Err(MemberError::NotFound(_)) => {
            println!("No member with email: {email}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
