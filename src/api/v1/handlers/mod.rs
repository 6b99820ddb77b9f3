pub mod db;
pub mod echo;
pub mod me;
pub mod ping;
