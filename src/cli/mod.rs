//! CLI module - Command-line interface for Guildhall
//!
//! Operator commands run against the same database and services as the
//! HTTP API.

mod commands;

use clap::{Parser, Subcommand};

/// Guildhall - Membership portal service
/// Sign-up, approval and admin roles for a membership organisation
#[derive(Parser)]
#[command(name = "guildhall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service until Ctrl+C
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Add an admin role to a member
    GrantRole {
        /// Member email
        email: String,
        /// Role name (superAdmin, newsAdmin)
        role: String,
    },

    /// Remove an admin role from a member
    RevokeRole {
        /// Member email
        email: String,
        /// Role name (superAdmin, newsAdmin)
        role: String,
    },

    /// Change a member's tier
    SetMemberType {
        /// Member email
        email: String,
        /// pending, primary, full, permanent or executive
        member_type: String,
    },

    /// List members
    #[command(alias = "ls")]
    Members {
        /// Only show members of this tier
        #[arg(long)]
        member_type: Option<String>,
        /// Page to show
        #[arg(long, default_value = "1")]
        page: u64,
    },
}

pub use commands::*;
