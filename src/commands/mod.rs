// SSH host management
pub mod ssh;
