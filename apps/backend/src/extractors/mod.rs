pub mod current_user;
pub mod match_id;
