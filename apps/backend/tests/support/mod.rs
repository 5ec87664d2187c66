#![allow(dead_code)]

pub mod factory;
pub mod test_state;
