pub mod record;
pub mod paths;
