pub mod characters;
pub mod check;
pub mod force_verify;
pub mod unverify;
pub mod verify;
pub mod who;
