pub mod auth_service;
pub use auth_service::{AuthError, AuthService, SignInResult, SignUp};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod member_service;
pub use member_service::{MemberError, MemberService};

pub mod member_service_impl;
pub use member_service_impl::SeaOrmMemberService;
