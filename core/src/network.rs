pub mod ldap;
pub mod session;
