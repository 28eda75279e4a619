pub mod identity_resolver;
pub mod known_persons;
