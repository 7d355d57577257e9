pub mod external;
pub mod interfaces;
pub mod resolver;
