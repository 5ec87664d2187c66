pub mod match_locks;
pub mod matches;
pub mod users;
